//! Page-level table access.
//!
//! Every stage reads tables through [`TableSource`]; how cells are pulled out
//! of a page is the implementation's business. [`PdfDocument`] works on text
//! PDFs, [`MemoryDocument`] on cells that were extracted elsewhere.

use std::path::Path;

use lopdf::Document;
use tempfile::NamedTempFile;

use crate::error::PipelineError;
use crate::model::{PageRange, PageText, RawTable};
use crate::pdf_reader::read_pdf_pages;
use crate::segment::Scratch;
use crate::table_detect::detect_tables_in_page;

/// Which tables of a page a stage looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionMode {
    /// Only the first table, as header sampling and reconstruction expect.
    FirstTable,
    /// Every table in encounter order, as the column index expects.
    AllTables,
}

pub trait TableSource {
    fn page_count(&self) -> u32;

    /// All tables on 1-based `page`, in encounter order.
    fn page_tables(&self, page: u32) -> Vec<RawTable>;

    fn tables(&self, page: u32, mode: ExtractionMode) -> Vec<RawTable> {
        let mut tables = self.page_tables(page);
        if mode == ExtractionMode::FirstTable {
            tables.truncate(1);
        }
        tables
    }

    fn first_table(&self, page: u32) -> Option<RawTable> {
        self.tables(page, ExtractionMode::FirstTable).into_iter().next()
    }
}

/// A document that can be cut into physical page slices.
pub trait Segmentable: TableSource {
    type Part: TableSource + Send;

    /// Copies the pages of an already validated `range` into a new part.
    ///
    /// Any file the part needs is created inside `scratch` and returned
    /// alongside it, so the caller controls when it goes away.
    fn split(
        &self,
        range: PageRange,
        scratch: &Scratch,
    ) -> Result<(Self::Part, Option<tempfile::TempPath>), PipelineError>;
}

/// A loaded text PDF with its per-page text already chosen.
#[derive(Debug, Clone)]
pub struct PdfDocument {
    raw: Document,
    pages: Vec<PageText>,
    min_cols: usize,
}

impl PdfDocument {
    pub fn open(path: &Path, min_cols: usize) -> Result<Self, PipelineError> {
        let raw = Document::load(path)?;
        let full_text = pdf_extract::extract_text(path).ok();
        Ok(Self::from_document(raw, full_text.as_deref(), min_cols))
    }

    pub fn from_bytes(bytes: &[u8], min_cols: usize) -> Result<Self, PipelineError> {
        let raw = Document::load_mem(bytes)?;
        let full_text = pdf_extract::extract_text_from_mem(bytes).ok();
        Ok(Self::from_document(raw, full_text.as_deref(), min_cols))
    }

    fn from_document(raw: Document, full_text: Option<&str>, min_cols: usize) -> Self {
        let pages = read_pdf_pages(&raw, full_text);
        tracing::debug!(pages = pages.len(), "loaded PDF");
        Self {
            raw,
            pages,
            min_cols,
        }
    }

    #[must_use]
    pub fn pages(&self) -> &[PageText] {
        &self.pages
    }
}

impl TableSource for PdfDocument {
    fn page_count(&self) -> u32 {
        u32::try_from(self.pages.len()).unwrap_or(u32::MAX)
    }

    fn page_tables(&self, page: u32) -> Vec<RawTable> {
        page.checked_sub(1)
            .and_then(|index| self.pages.get(index as usize))
            .map(|text| detect_tables_in_page(text, self.min_cols))
            .unwrap_or_default()
    }
}

impl Segmentable for PdfDocument {
    type Part = PdfDocument;

    fn split(
        &self,
        range: PageRange,
        scratch: &Scratch,
    ) -> Result<(Self::Part, Option<tempfile::TempPath>), PipelineError> {
        let mut part = self.raw.clone();
        let outside = (1..=self.page_count())
            .filter(|page| *page < range.start || *page > range.end)
            .collect::<Vec<_>>();
        part.delete_pages(&outside);
        part.prune_objects();

        let mut file = NamedTempFile::with_prefix_in(
            format!("pages_{}_to_{}_", range.start, range.end),
            scratch.path(),
        )?;
        part.save_to(file.as_file_mut())?;
        let path = file.into_temp_path();

        let reopened = Self::open(&path, self.min_cols)?;
        tracing::debug!(%range, path = %path.display(), "wrote sub-document");
        Ok((reopened, Some(path)))
    }
}

/// Pages of tables already extracted by some other tool.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryDocument {
    pages: Vec<Vec<RawTable>>,
}

impl MemoryDocument {
    /// `pages[0]` holds the tables of page 1.
    #[must_use]
    pub fn new(pages: Vec<Vec<RawTable>>) -> Self {
        Self { pages }
    }
}

impl TableSource for MemoryDocument {
    fn page_count(&self) -> u32 {
        u32::try_from(self.pages.len()).unwrap_or(u32::MAX)
    }

    fn page_tables(&self, page: u32) -> Vec<RawTable> {
        page.checked_sub(1)
            .and_then(|index| self.pages.get(index as usize))
            .cloned()
            .unwrap_or_default()
    }
}

impl Segmentable for MemoryDocument {
    type Part = MemoryDocument;

    fn split(
        &self,
        range: PageRange,
        _scratch: &Scratch,
    ) -> Result<(Self::Part, Option<tempfile::TempPath>), PipelineError> {
        let start = range.start.saturating_sub(1) as usize;
        let end = (range.end as usize).min(self.pages.len());
        let pages = self.pages.get(start..end).unwrap_or_default().to_vec();
        Ok((Self { pages }, None))
    }
}
