use std::collections::HashMap;

use crate::model::{Cell, Row};

/// Forward-fills empty cells column by column.
///
/// An empty cell takes the last non-empty value seen in its column, or
/// [`Cell::Unresolved`] when the column has had none yet. State lives only
/// for this call, so each sub-document starts clean.
#[must_use]
pub fn fill(mut rows: Vec<Row>) -> Vec<Row> {
    let mut last_seen: HashMap<String, String> = HashMap::new();

    for row in &mut rows {
        for (name, cell) in row.iter_mut() {
            match cell {
                Cell::Text(text) if !text.is_empty() => {
                    last_seen.insert(name.to_string(), text.clone());
                }
                _ => {
                    *cell = last_seen
                        .get(name)
                        .map_or(Cell::Unresolved, |value| Cell::Text(value.clone()));
                }
            }
        }
    }

    rows
}
