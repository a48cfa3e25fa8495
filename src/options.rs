use std::str::FromStr;

use crate::error::PipelineError;
use crate::model::{Cell, RawRow, Row};

pub const DEFAULT_MATCH_THRESHOLD: f32 = 0.5;

/// Column holding a record's primary key.
///
/// Used both by the continuation test between page fragments and by the
/// entry grouper, so the two always agree on what a record key is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyColumn {
    /// 0-based column position.
    Position(usize),
    /// Header name, looked up per table.
    Named(String),
}

impl Default for KeyColumn {
    fn default() -> Self {
        Self::Position(0)
    }
}

impl KeyColumn {
    fn raw_index(&self, header: &RawRow) -> Option<usize> {
        match self {
            Self::Position(index) => Some(*index),
            Self::Named(name) => header
                .iter()
                .position(|cell| cell.as_deref().map(str::trim) == Some(name.as_str())),
        }
    }

    /// Key cell of a raw row; a missing or empty cell yields `None`.
    #[must_use]
    pub fn raw_value<'a>(&self, header: &RawRow, row: &'a RawRow) -> Option<&'a str> {
        let index = self.raw_index(header)?;
        row.get(index)
            .and_then(Option::as_deref)
            .filter(|value| !value.is_empty())
    }

    /// `(column name, value)` pair the grouper compares.
    #[must_use]
    pub fn row_key(&self, row: &Row) -> (String, Cell) {
        match self {
            Self::Position(index) => row
                .get_index(*index)
                .map_or((String::new(), Cell::Empty), |(name, cell)| {
                    (name.to_string(), cell.clone())
                }),
            Self::Named(name) => (name.clone(), row.get(name).cloned().unwrap_or(Cell::Empty)),
        }
    }
}

impl FromStr for KeyColumn {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();
        if value.is_empty() {
            return Err("key column cannot be empty".to_string());
        }

        if let Some(position) = value.strip_prefix('#') {
            let index: usize = position
                .trim()
                .parse()
                .map_err(|_| format!("invalid key column position: '{position}'"))?;
            return Ok(Self::Position(index));
        }

        Ok(Self::Named(value.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOptions {
    /// Fraction of a pattern's tokens that must appear in a page's columns.
    pub match_threshold: f32,
    pub key_column: KeyColumn,
    /// Minimum cells per line for text-based table detection.
    pub min_cols: usize,
    /// Process sub-documents on the rayon pool.
    pub parallel: bool,
    /// Also write each filled table as CSV next to the entries.
    pub write_tables: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            match_threshold: DEFAULT_MATCH_THRESHOLD,
            key_column: KeyColumn::default(),
            min_cols: 2,
            parallel: false,
            write_tables: false,
        }
    }
}

impl PipelineOptions {
    pub fn validate(&self) -> Result<(), PipelineError> {
        if !(self.match_threshold > 0.0 && self.match_threshold <= 1.0) {
            return Err(PipelineError::InvalidOption(format!(
                "match_threshold must be within (0, 1], got {}",
                self.match_threshold
            )));
        }
        if self.min_cols < 2 {
            return Err(PipelineError::InvalidOption(
                "min_cols must be at least 2".to_string(),
            ));
        }
        Ok(())
    }
}
