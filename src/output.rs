use std::path::{Path, PathBuf};

use csv::WriterBuilder;

use crate::error::PipelineError;
use crate::model::{Cell, EntryId, PageRange, Row};
use crate::pipeline::RunReport;

pub const MANIFEST_FILE: &str = "manifest.json";

#[must_use]
pub fn entry_path(dir: &Path, id: &EntryId) -> PathBuf {
    dir.join(format!("{}.txt", id.file_stem()))
}

pub fn write_entry(dir: &Path, id: &EntryId, text: &str) -> Result<PathBuf, PipelineError> {
    let path = entry_path(dir, id);
    std::fs::write(&path, text)?;
    Ok(path)
}

/// Writes the filled rows of one range as CSV, header first.
pub fn write_table_csv<'r>(
    dir: &Path,
    range: PageRange,
    header: &[String],
    rows: impl IntoIterator<Item = &'r Row>,
) -> Result<PathBuf, PipelineError> {
    let path = dir.join(format!("table_{}-{}.csv", range.start, range.end));
    let mut writer = WriterBuilder::new().from_path(&path)?;
    writer.write_record(header)?;
    for row in rows {
        writer.write_record(
            header
                .iter()
                .map(|name| row.get(name).and_then(Cell::as_text).unwrap_or_default()),
        )?;
    }
    writer.flush()?;
    Ok(path)
}

pub fn write_manifest(dir: &Path, report: &RunReport) -> Result<PathBuf, PipelineError> {
    let path = dir.join(MANIFEST_FILE);
    std::fs::write(&path, serde_json::to_vec_pretty(report)?)?;
    Ok(path)
}
