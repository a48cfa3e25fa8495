use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::Serialize;

use crate::collaborator::{HeaderClassifier, Summarizer};
use crate::column_index::build_index;
use crate::document::{Segmentable, TableSource};
use crate::error::{CollaboratorError, PipelineError, Stage};
use crate::grouping::group;
use crate::header_sampler::sample_headers;
use crate::matcher::match_patterns;
use crate::model::{
    ColumnIndexEntry, Entry, EntryId, HeaderCandidate, HeaderPattern, PageRange,
    ReconstructedTable, Row,
};
use crate::normalize::fill;
use crate::options::{KeyColumn, PipelineOptions};
use crate::output::{write_entry, write_manifest, write_table_csv};
use crate::ranges::build_ranges;
use crate::reconstruct::reconstruct;
use crate::segment::{Scratch, SubDocument, segment};
use crate::warning::{RunWarning, WarningCode};

/// Everything learned about the document before it is cut up.
#[derive(Debug, Clone, PartialEq)]
pub struct Discovery {
    pub page_count: u32,
    pub candidates: Vec<HeaderCandidate>,
    pub patterns: Vec<HeaderPattern>,
    pub index: Vec<ColumnIndexEntry>,
    pub matched_pages: Vec<u32>,
    pub ranges: Vec<PageRange>,
    pub warnings: Vec<RunWarning>,
}

/// Entries of one range; their rows, in order, are the filled table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeOutput {
    pub range: PageRange,
    pub header: Vec<String>,
    pub entries: Vec<Entry>,
}

impl RangeOutput {
    pub fn rows(&self) -> impl Iterator<Item = &Row> {
        self.entries.iter().flat_map(|entry| &entry.rows)
    }

    #[must_use]
    pub fn row_count(&self) -> usize {
        self.entries.iter().map(|entry| entry.rows.len()).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EntryStatus {
    Summarized { path: PathBuf },
    /// Entry rows written as-is; no summarizer was configured.
    Written { path: PathBuf },
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryReport {
    pub id: EntryId,
    pub rows: usize,
    #[serde(flatten)]
    pub status: EntryStatus,
}

impl EntryReport {
    #[must_use]
    pub fn is_failed(&self) -> bool {
        matches!(self.status, EntryStatus::Failed { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub page_count: u32,
    pub matched_pages: Vec<u32>,
    pub ranges: Vec<PageRange>,
    pub tables: Vec<PathBuf>,
    pub entries: Vec<EntryReport>,
    pub failed_entries: usize,
    pub warnings: Vec<RunWarning>,
}

/// Header discovery through range building.
pub fn discover<D: TableSource + ?Sized>(
    document: &D,
    classifier: &dyn HeaderClassifier,
    options: &PipelineOptions,
) -> Result<Discovery, PipelineError> {
    let mut warnings = Vec::new();

    let candidates = sample_headers(document);
    if candidates.is_empty() {
        return Err(PipelineError::ExtractionEmpty(Stage::HeaderCandidates));
    }

    let patterns = classifier
        .classify(&candidates)
        .map_err(PipelineError::Classifier)?;
    if patterns.is_empty() {
        return Err(PipelineError::Classifier(CollaboratorError::EmptyReply));
    }
    tracing::info!(
        candidates = candidates.len(),
        patterns = patterns.len(),
        "classified header candidates"
    );

    let index = build_index(document);
    if index.is_empty() {
        return Err(PipelineError::ExtractionEmpty(Stage::ColumnIndex));
    }

    let matched_pages = match_patterns(&patterns, &index, options.match_threshold);
    if matched_pages.is_empty() {
        return Err(PipelineError::ExtractionEmpty(Stage::Matches));
    }
    if matched_pages.len() < patterns.len() {
        warnings.push(RunWarning::new(
            WarningCode::UnmatchedPatterns,
            format!(
                "{} of {} header patterns matched no page",
                patterns.len() - matched_pages.len(),
                patterns.len()
            ),
        ));
    }

    let page_count = document.page_count();
    let ranges = build_ranges(&matched_pages, page_count);
    if ranges.is_empty() {
        return Err(PipelineError::ExtractionEmpty(Stage::Ranges));
    }

    Ok(Discovery {
        page_count,
        candidates,
        patterns,
        index,
        matched_pages,
        ranges,
        warnings,
    })
}

/// Reconstruct, fill and group one sub-document.
pub fn process_sub_document<P: TableSource>(sub: SubDocument<P>, key: &KeyColumn) -> RangeOutput {
    let ReconstructedTable {
        range,
        header,
        rows,
    } = reconstruct(sub, key);
    let entries = group(range, fill(rows), key);
    RangeOutput {
        range,
        header,
        entries,
    }
}

/// Segments `document` and turns every range into entries, in range order.
///
/// With `options.parallel` the ranges are processed on the rayon pool; the
/// results still come back in range order.
pub fn extract_entries<D: Segmentable>(
    document: &D,
    ranges: &[PageRange],
    scratch: &Scratch,
    options: &PipelineOptions,
) -> Result<Vec<RangeOutput>, PipelineError> {
    let subs = segment(document, ranges, scratch)?;
    let key = &options.key_column;

    let outputs = if options.parallel {
        subs.into_par_iter()
            .map(|sub| process_sub_document(sub, key))
            .collect::<Vec<_>>()
    } else {
        subs.into_iter()
            .map(|sub| process_sub_document(sub, key))
            .collect::<Vec<_>>()
    };

    let row_count = outputs
        .iter()
        .map(RangeOutput::row_count)
        .sum::<usize>();
    if row_count == 0 {
        return Err(PipelineError::ExtractionEmpty(Stage::ReconstructedRows));
    }
    if outputs.iter().all(|output| output.entries.is_empty()) {
        return Err(PipelineError::ExtractionEmpty(Stage::Entries));
    }

    tracing::info!(
        ranges = outputs.len(),
        rows = row_count,
        entries = outputs.iter().map(|output| output.entries.len()).sum::<usize>(),
        "extracted entries"
    );
    Ok(outputs)
}

/// Blank entries are not sent, and a blank reply counts as a failure.
fn summarize_text(summarizer: &dyn Summarizer, text: &str) -> Result<String, CollaboratorError> {
    if text.trim().is_empty() {
        return Err(CollaboratorError::EmptyInput);
    }
    let paragraph = summarizer.summarize(text)?;
    if paragraph.trim().is_empty() {
        return Err(CollaboratorError::EmptyReply);
    }
    Ok(paragraph)
}

/// Hands every entry to the summarizer and writes one file per entry.
///
/// A failed summary is recorded on its entry and the batch goes on; only
/// failures to write output abort.
pub fn summarize_entries(
    outputs: &[RangeOutput],
    summarizer: Option<&dyn Summarizer>,
    out_dir: &Path,
) -> Result<Vec<EntryReport>, PipelineError> {
    let mut reports = Vec::new();

    for entry in outputs.iter().flat_map(|output| &output.entries) {
        let text = entry.to_text()?;
        let status = match summarizer {
            None => EntryStatus::Written {
                path: write_entry(out_dir, &entry.id, &text)?,
            },
            Some(summarizer) => match summarize_text(summarizer, &text) {
                Ok(paragraph) => EntryStatus::Summarized {
                    path: write_entry(out_dir, &entry.id, &paragraph)?,
                },
                Err(error) => {
                    tracing::warn!(entry = %entry.id, %error, "summary failed");
                    EntryStatus::Failed {
                        error: error.to_string(),
                    }
                }
            },
        };

        reports.push(EntryReport {
            id: entry.id,
            rows: entry.rows.len(),
            status,
        });
    }

    Ok(reports)
}

/// Runs the whole pipeline over one document.
pub struct Pipeline<'a> {
    options: PipelineOptions,
    classifier: &'a dyn HeaderClassifier,
    summarizer: Option<&'a dyn Summarizer>,
}

impl<'a> Pipeline<'a> {
    #[must_use]
    pub fn new(options: PipelineOptions, classifier: &'a dyn HeaderClassifier) -> Self {
        Self {
            options,
            classifier,
            summarizer: None,
        }
    }

    #[must_use]
    pub fn with_summarizer(mut self, summarizer: &'a dyn Summarizer) -> Self {
        self.summarizer = Some(summarizer);
        self
    }

    #[must_use]
    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    pub fn discover<D: TableSource + ?Sized>(&self, document: &D) -> Result<Discovery, PipelineError> {
        self.options.validate()?;
        discover(document, self.classifier, &self.options)
    }

    /// Discovery, extraction and summaries; writes everything to `out_dir`.
    pub fn run<D: Segmentable>(&self, document: &D, out_dir: &Path) -> Result<RunReport, PipelineError> {
        let started_at = Utc::now();
        let discovery = self.discover(document)?;
        let mut warnings = discovery.warnings.clone();

        let outputs = {
            let scratch = Scratch::new()?;
            extract_entries(document, &discovery.ranges, &scratch, &self.options)?
        };

        for output in outputs.iter().filter(|output| output.entries.is_empty()) {
            tracing::warn!(range = %output.range, "no table rows in range");
            warnings.push(
                RunWarning::new(WarningCode::EmptySubDocument, "no table rows in range")
                    .with_range(output.range),
            );
        }

        std::fs::create_dir_all(out_dir)?;
        let mut tables = Vec::new();
        if self.options.write_tables {
            for output in outputs.iter().filter(|output| !output.entries.is_empty()) {
                tables.push(write_table_csv(
                    out_dir,
                    output.range,
                    &output.header,
                    output.rows(),
                )?);
            }
        }

        let entries = summarize_entries(&outputs, self.summarizer, out_dir)?;
        for report in entries.iter().filter(|report| report.is_failed()) {
            warnings.push(
                RunWarning::new(WarningCode::SummaryFailed, "summarizer failed for entry")
                    .with_entry(report.id),
            );
        }
        let failed_entries = entries.iter().filter(|report| report.is_failed()).count();
        if failed_entries > 0 {
            tracing::warn!(failed = failed_entries, total = entries.len(), "some entries failed");
        }

        let report = RunReport {
            started_at,
            finished_at: Utc::now(),
            page_count: discovery.page_count,
            matched_pages: discovery.matched_pages,
            ranges: discovery.ranges,
            tables,
            entries,
            failed_entries,
            warnings,
        };
        write_manifest(out_dir, &report)?;
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell as StdCell;

    use super::{EntryStatus, Pipeline, discover, extract_entries, summarize_entries, summarize_text};
    use crate::collaborator::{StaticClassifier, Summarizer};
    use crate::document::MemoryDocument;
    use crate::error::{CollaboratorError, PipelineError, Stage};
    use crate::model::{HeaderPattern, PageRange, RawTable};
    use crate::options::PipelineOptions;
    use crate::segment::Scratch;
    use crate::warning::WarningCode;

    fn table(rows: &[&[&str]]) -> RawTable {
        RawTable::from_text(rows.iter().map(|row| row.iter().copied()))
    }

    fn pattern(names: &[&str]) -> HeaderPattern {
        names.iter().copied().collect()
    }

    fn directory() -> MemoryDocument {
        MemoryDocument::new(vec![
            vec![table(&[&["ID", "NAME", "ROLE"], &["1", "Ann", "Chair"], &["", "", "Editor"]])],
            vec![table(&[&["ID", "NAME", "ROLE"], &["", "", "Clerk"], &["2", "Bob", "Auditor"]])],
            vec![table(&[&["CODE", "ITEM", "PRICE"], &["A1", "Pen", "1.50"], &["A2", "Ink", ""]])],
        ])
    }

    struct FailingEvery {
        calls: StdCell<usize>,
        every: usize,
    }

    impl Summarizer for FailingEvery {
        fn summarize(&self, entry_text: &str) -> Result<String, CollaboratorError> {
            let call = self.calls.get() + 1;
            self.calls.set(call);
            if call % self.every == 0 {
                Err(CollaboratorError::Transport("connection reset".to_string()))
            } else {
                Ok(format!("summary of {} bytes", entry_text.len()))
            }
        }
    }

    #[test]
    fn discovers_one_range_per_table_shape() {
        let classifier = StaticClassifier::new(vec![
            pattern(&["ID", "NAME", "ROLE"]),
            pattern(&["CODE", "ITEM", "PRICE"]),
        ]);
        let discovery = discover(&directory(), &classifier, &PipelineOptions::default())
            .expect("discovery should succeed");

        assert_eq!(discovery.matched_pages, vec![1, 3]);
        assert_eq!(
            discovery.ranges,
            vec![PageRange::new(1, 2), PageRange::new(3, 3)]
        );
        assert!(discovery.warnings.is_empty());
    }

    #[test]
    fn empty_classifier_reply_is_fatal() {
        let classifier = StaticClassifier::new(Vec::new());
        let err = discover(&directory(), &classifier, &PipelineOptions::default())
            .expect_err("no patterns should abort");
        assert!(matches!(
            err,
            PipelineError::Classifier(CollaboratorError::EmptyReply)
        ));
    }

    #[test]
    fn no_match_is_reported_as_its_own_stage() {
        let classifier = StaticClassifier::new(vec![pattern(&["SKU", "QTY"])]);
        let err = discover(&directory(), &classifier, &PipelineOptions::default())
            .expect_err("unmatched patterns should abort");
        assert!(matches!(err, PipelineError::ExtractionEmpty(Stage::Matches)));
    }

    #[test]
    fn document_without_tables_fails_at_sampling() {
        let classifier = StaticClassifier::new(vec![pattern(&["ID"])]);
        let err = discover(&MemoryDocument::new(vec![vec![]]), &classifier, &PipelineOptions::default())
            .expect_err("empty document should abort");
        assert!(matches!(
            err,
            PipelineError::ExtractionEmpty(Stage::HeaderCandidates)
        ));
    }

    #[test]
    fn fill_state_does_not_leak_between_ranges() {
        let scratch = Scratch::new().expect("scratch should be created");
        let outputs = extract_entries(
            &directory(),
            &[PageRange::new(1, 2), PageRange::new(3, 3)],
            &scratch,
            &PipelineOptions::default(),
        )
        .expect("extraction should succeed");

        let first = &outputs[0];
        assert_eq!(first.row_count(), 4);
        assert_eq!(first.header, vec!["ID", "NAME", "ROLE"]);
        assert_eq!(
            first.entries.iter().map(|entry| entry.rows.len()).collect::<Vec<_>>(),
            vec![3, 1]
        );

        let prices = &outputs[1].entries;
        assert_eq!(prices.len(), 2);
        assert_eq!(prices[1].id.range, PageRange::new(3, 3));
        assert_eq!(prices[1].id.ordinal, 2);
        let text = prices[1].to_text().expect("entry should serialize");
        assert!(text.contains("\"PRICE\": \"1.50\""), "{text}");
    }

    #[test]
    fn parallel_extraction_keeps_range_order() {
        let scratch = Scratch::new().expect("scratch should be created");
        let ranges = [PageRange::new(1, 1), PageRange::new(2, 2), PageRange::new(3, 3)];
        let options = PipelineOptions {
            parallel: true,
            ..PipelineOptions::default()
        };
        let outputs = extract_entries(&directory(), &ranges, &scratch, &options)
            .expect("extraction should succeed");
        let order = outputs
            .iter()
            .map(|output| output.range)
            .collect::<Vec<_>>();
        assert_eq!(order, ranges.to_vec());
    }

    #[test]
    fn summary_failures_are_counted_not_fatal() {
        let scratch = Scratch::new().expect("scratch should be created");
        let outputs = extract_entries(
            &directory(),
            &[PageRange::new(1, 2), PageRange::new(3, 3)],
            &scratch,
            &PipelineOptions::default(),
        )
        .expect("extraction should succeed");

        let out = tempfile::tempdir().expect("tempdir should be created");
        let summarizer = FailingEvery {
            calls: StdCell::new(0),
            every: 2,
        };
        let reports = summarize_entries(&outputs, Some(&summarizer), out.path())
            .expect("summaries should not abort");

        assert_eq!(reports.len(), 4);
        assert_eq!(reports.iter().filter(|report| report.is_failed()).count(), 2);
        assert!(matches!(reports[0].status, EntryStatus::Summarized { .. }));
        assert!(out.path().join("table_1-2_entry_1.txt").exists());
        assert!(!out.path().join("table_1-2_entry_2.txt").exists());
    }

    struct Blank;

    impl Summarizer for Blank {
        fn summarize(&self, _entry_text: &str) -> Result<String, CollaboratorError> {
            Ok("   ".to_string())
        }
    }

    #[test]
    fn blank_summary_is_a_failure_and_writes_nothing() {
        let document = MemoryDocument::new(vec![vec![table(&[&["ID", "NAME"], &["1", "Ann"]])]]);
        let scratch = Scratch::new().expect("scratch should be created");
        let outputs = extract_entries(
            &document,
            &[PageRange::new(1, 1)],
            &scratch,
            &PipelineOptions::default(),
        )
        .expect("extraction should succeed");

        let out = tempfile::tempdir().expect("tempdir should be created");
        let reports = summarize_entries(&outputs, Some(&Blank), out.path())
            .expect("summaries should not abort");

        assert_eq!(reports.len(), 1);
        assert_eq!(
            reports[0].status,
            EntryStatus::Failed {
                error: CollaboratorError::EmptyReply.to_string()
            }
        );
        assert!(!out.path().join("table_1-1_entry_1.txt").exists());
    }

    #[test]
    fn blank_entry_text_is_not_sent() {
        let summarizer = FailingEvery {
            calls: StdCell::new(0),
            every: 1,
        };
        assert_eq!(
            summarize_text(&summarizer, " \n"),
            Err(CollaboratorError::EmptyInput)
        );
        assert_eq!(summarizer.calls.get(), 0);
    }

    #[test]
    fn trailing_unmatched_pattern_is_reported_as_a_warning() {
        let classifier = StaticClassifier::new(vec![
            pattern(&["ID", "NAME", "ROLE"]),
            pattern(&["CODE", "ITEM", "PRICE"]),
            pattern(&["SKU", "QTY"]),
        ]);
        let discovery = discover(&directory(), &classifier, &PipelineOptions::default())
            .expect("discovery should succeed");

        assert_eq!(discovery.matched_pages, vec![1, 3]);
        assert_eq!(discovery.warnings.len(), 1);
        assert_eq!(discovery.warnings[0].code, WarningCode::UnmatchedPatterns);
        assert_eq!(discovery.warnings[0].message, "1 of 3 header patterns matched no page");
    }

    #[test]
    fn range_without_rows_is_reported_with_its_range() {
        let document = MemoryDocument::new(vec![
            vec![table(&[&["ID", "NAME"], &["1", "Ann"], &["2", "Bob"]])],
            vec![table(&[&["CODE", "PRICE"]])],
        ]);
        let classifier = StaticClassifier::new(vec![
            pattern(&["ID", "NAME"]),
            pattern(&["CODE", "PRICE"]),
        ]);
        let out = tempfile::tempdir().expect("tempdir should be created");

        let report = Pipeline::new(PipelineOptions::default(), &classifier)
            .run(&document, out.path())
            .expect("one range with rows is enough");

        assert_eq!(report.entries.len(), 2);
        let empty = report
            .warnings
            .iter()
            .filter(|warning| warning.code == WarningCode::EmptySubDocument)
            .collect::<Vec<_>>();
        assert_eq!(empty.len(), 1);
        assert_eq!(empty[0].range, Some(PageRange::new(2, 2)));
        assert_eq!(empty[0].entry, None);
    }
}
