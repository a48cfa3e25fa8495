use std::fmt::{Display, Formatter};
use std::io;

use thiserror::Error;

use crate::model::PageRange;

/// Pipeline stage that may come up empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    HeaderCandidates,
    ColumnIndex,
    Matches,
    Ranges,
    ReconstructedRows,
    Entries,
}

impl Stage {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::HeaderCandidates => "header sampling",
            Self::ColumnIndex => "column indexing",
            Self::Matches => "pattern matching",
            Self::Ranges => "range building",
            Self::ReconstructedRows => "table reconstruction",
            Self::Entries => "entry grouping",
        }
    }
}

impl Display for Stage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to load PDF: {0}")]
    PdfLoad(#[from] lopdf::Error),

    #[error("invalid option: {0}")]
    InvalidOption(String),

    #[error("{0} produced no results")]
    ExtractionEmpty(Stage),

    #[error("page range {range} is invalid for a document of {page_count} pages")]
    InvalidRange { range: PageRange, page_count: u32 },

    #[error("header classifier failed: {0}")]
    Classifier(#[source] CollaboratorError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CollaboratorError {
    #[error("request failed: {0}")]
    Transport(String),

    #[error("service answered with status {code}: {body}")]
    Status { code: u16, body: String },

    #[error("reply does not match the expected schema: {0}")]
    MalformedReply(String),

    #[error("reply was empty")]
    EmptyReply,

    #[error("input was empty")]
    EmptyInput,
}

impl From<ureq::Error> for CollaboratorError {
    fn from(error: ureq::Error) -> Self {
        match error {
            ureq::Error::Status(code, response) => Self::Status {
                code,
                body: response.into_string().unwrap_or_default(),
            },
            ureq::Error::Transport(transport) => Self::Transport(transport.to_string()),
        }
    }
}
