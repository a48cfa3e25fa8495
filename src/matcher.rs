use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::model::{ColumnIndexEntry, HeaderPattern};

static NON_ALPHANUMERIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-zA-Z0-9]").expect("hardcoded token regex is valid"));

/// Drops everything but ASCII letters and digits, then lower-cases.
pub fn normalize_token(text: &str) -> String {
    NON_ALPHANUMERIC.replace_all(text, "").to_lowercase()
}

fn normalized_set<'a>(names: impl IntoIterator<Item = &'a String>) -> HashSet<String> {
    names
        .into_iter()
        .filter(|name| !name.is_empty())
        .map(|name| normalize_token(name))
        .collect()
}

/// True when at least `threshold` of the pattern's tokens appear in `columns`.
pub fn is_partial_match(pattern: &HeaderPattern, columns: &[String], threshold: f32) -> bool {
    let wanted = normalized_set(&pattern.0);
    if wanted.is_empty() {
        return false;
    }

    let present = normalized_set(columns);
    let common = wanted.intersection(&present).count();
    #[allow(clippy::cast_precision_loss)]
    let ratio = common as f32 / wanted.len() as f32;
    ratio >= threshold
}

/// First page matching each pattern, scanning the index once and in order.
///
/// Pattern `i + 1` is only tried on entries after the one that matched
/// pattern `i`. Patterns left over when the index runs out are dropped.
pub fn match_patterns(
    patterns: &[HeaderPattern],
    index: &[ColumnIndexEntry],
    threshold: f32,
) -> Vec<u32> {
    let mut matched = Vec::new();
    let mut cursor = 0_usize;

    for entry in index {
        let Some(pattern) = patterns.get(cursor) else {
            break;
        };

        if is_partial_match(pattern, &entry.column_names, threshold) {
            tracing::info!(pattern = cursor + 1, page = entry.page, "pattern matched");
            matched.push(entry.page);
            cursor += 1;
        }
    }

    if cursor < patterns.len() {
        tracing::warn!(
            matched = cursor,
            total = patterns.len(),
            "some header patterns were never matched"
        );
    }

    matched
}
