use crate::document::{ExtractionMode, TableSource};
use crate::model::HeaderCandidate;

/// First row of each page's first table, trimmed and de-duplicated.
pub fn sample_headers<D: TableSource + ?Sized>(document: &D) -> Vec<HeaderCandidate> {
    let mut candidates: Vec<HeaderCandidate> = Vec::new();

    for page in 1..=document.page_count() {
        let Some(header) = document
            .tables(page, ExtractionMode::FirstTable)
            .into_iter()
            .next()
            .and_then(|table| table.rows.into_iter().next())
        else {
            continue;
        };

        let candidate = HeaderCandidate(
            header
                .into_iter()
                .map(|cell| cell.map(|text| text.trim().to_string()))
                .collect(),
        );
        if !candidates.contains(&candidate) {
            candidates.push(candidate);
        }
    }

    tracing::debug!(candidates = candidates.len(), "sampled header candidates");
    candidates
}
