use crate::document::{ExtractionMode, TableSource};
use crate::model::ColumnIndexEntry;

/// Non-blank header names of every table, page by page.
pub fn build_index<D: TableSource + ?Sized>(document: &D) -> Vec<ColumnIndexEntry> {
    let mut index = Vec::new();

    for page in 1..=document.page_count() {
        for table in document.tables(page, ExtractionMode::AllTables) {
            let Some(header) = table.rows.into_iter().next() else {
                continue;
            };

            let column_names = header
                .into_iter()
                .flatten()
                .filter(|name| !name.trim().is_empty())
                .collect::<Vec<_>>();
            if !column_names.is_empty() {
                index.push(ColumnIndexEntry { page, column_names });
            }
        }
    }

    tracing::debug!(entries = index.len(), "built column index");
    index
}
