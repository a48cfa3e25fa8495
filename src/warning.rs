use serde::Serialize;

use crate::model::{EntryId, PageRange};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningCode {
    UnmatchedPatterns,
    EmptySubDocument,
    SummaryFailed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunWarning {
    pub code: WarningCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<PageRange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry: Option<EntryId>,
}

impl RunWarning {
    #[must_use]
    pub fn new(code: WarningCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            range: None,
            entry: None,
        }
    }

    #[must_use]
    pub fn with_range(mut self, range: PageRange) -> Self {
        self.range = Some(range);
        self
    }

    #[must_use]
    pub fn with_entry(mut self, entry: EntryId) -> Self {
        self.range = Some(entry.range);
        self.entry = Some(entry);
        self
    }
}
