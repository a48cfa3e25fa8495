use std::path::Path;

use tempfile::{TempDir, TempPath};

use crate::document::Segmentable;
use crate::error::PipelineError;
use crate::model::PageRange;

/// Temporary directory owned by one run; removed when dropped.
#[derive(Debug)]
pub struct Scratch {
    dir: TempDir,
}

impl Scratch {
    pub fn new() -> Result<Self, PipelineError> {
        Ok(Self {
            dir: tempfile::Builder::new()
                .prefix("pdf-table-entries-")
                .tempdir()?,
        })
    }

    pub fn new_in(parent: &Path) -> Result<Self, PipelineError> {
        Ok(Self {
            dir: tempfile::Builder::new()
                .prefix("pdf-table-entries-")
                .tempdir_in(parent)?,
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}

/// Physical page slice of the source document for one range.
///
/// Owns the file backing the slice, if any; it is deleted when the
/// sub-document is dropped.
#[derive(Debug)]
pub struct SubDocument<P> {
    pub range: PageRange,
    pub document: P,
    backing: Option<TempPath>,
}

impl<P> SubDocument<P> {
    #[must_use]
    pub fn new(range: PageRange, document: P) -> Self {
        Self {
            range,
            document,
            backing: None,
        }
    }

    #[must_use]
    pub fn backing_path(&self) -> Option<&Path> {
        self.backing.as_deref()
    }
}

pub fn validate_ranges(ranges: &[PageRange], page_count: u32) -> Result<(), PipelineError> {
    match ranges.iter().find(|range| !range.fits_within(page_count)) {
        Some(range) => Err(PipelineError::InvalidRange {
            range: *range,
            page_count,
        }),
        None => Ok(()),
    }
}

/// Cuts `document` into one sub-document per range, in range order.
///
/// Every range is checked before any page is copied; a range outside the
/// document or with `start > end` fails the whole call.
pub fn segment<D: Segmentable>(
    document: &D,
    ranges: &[PageRange],
    scratch: &Scratch,
) -> Result<Vec<SubDocument<D::Part>>, PipelineError> {
    validate_ranges(ranges, document.page_count())?;

    ranges
        .iter()
        .map(|range| {
            let (part, backing) = document.split(*range, scratch)?;
            Ok(SubDocument {
                range: *range,
                document: part,
                backing,
            })
        })
        .collect()
}
