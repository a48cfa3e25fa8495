//! Contracts for the language-model collaborators.
//!
//! The pipeline never parses free text: a classifier either returns
//! structured header patterns or fails.

use std::path::Path;

use serde::Deserialize;

use crate::error::{CollaboratorError, PipelineError};
use crate::model::{HeaderCandidate, HeaderPattern};

pub trait HeaderClassifier {
    /// Picks the candidates that are real header rows, in document order.
    fn classify(
        &self,
        candidates: &[HeaderCandidate],
    ) -> Result<Vec<HeaderPattern>, CollaboratorError>;
}

pub trait Summarizer {
    /// Rewrites one entry's JSON rows as a paragraph.
    fn summarize(&self, entry_text: &str) -> Result<String, CollaboratorError>;
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PatternReply {
    Wrapped { patterns: Vec<HeaderPattern> },
    Bare(Vec<HeaderPattern>),
}

/// Parses a classifier reply: `{"patterns": [[...]]}` or a bare `[[...]]`.
pub fn parse_pattern_reply(reply: &str) -> Result<Vec<HeaderPattern>, CollaboratorError> {
    let reply = reply.trim();
    if reply.is_empty() {
        return Err(CollaboratorError::EmptyReply);
    }

    let parsed = serde_json::from_str::<PatternReply>(reply)
        .map_err(|error| CollaboratorError::MalformedReply(error.to_string()))?;
    let patterns = match parsed {
        PatternReply::Wrapped { patterns } | PatternReply::Bare(patterns) => patterns,
    };

    Ok(patterns
        .into_iter()
        .filter(|pattern| !pattern.0.is_empty())
        .collect())
}

/// Fixed patterns, e.g. reviewed by hand and stored as JSON.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticClassifier {
    patterns: Vec<HeaderPattern>,
}

impl StaticClassifier {
    #[must_use]
    pub fn new(patterns: Vec<HeaderPattern>) -> Self {
        Self { patterns }
    }

    pub fn from_file(path: &Path) -> Result<Self, PipelineError> {
        let raw = std::fs::read_to_string(path)?;
        let patterns = parse_pattern_reply(&raw).map_err(PipelineError::Classifier)?;
        Ok(Self::new(patterns))
    }
}

impl HeaderClassifier for StaticClassifier {
    fn classify(
        &self,
        _candidates: &[HeaderCandidate],
    ) -> Result<Vec<HeaderPattern>, CollaboratorError> {
        Ok(self.patterns.clone())
    }
}
