use crate::model::{Cell, Entry, EntryId, PageRange, Row};
use crate::options::KeyColumn;

/// Splits rows into maximal runs sharing one primary key, in input order.
///
/// Entry ordinals start at 1 within `range`. Rows with an empty key group
/// under that empty key like any other value.
#[must_use]
pub fn group(range: PageRange, rows: Vec<Row>, key: &KeyColumn) -> Vec<Entry> {
    let mut entries = Vec::new();
    let mut open: Option<((String, Cell), Vec<Row>)> = None;

    for row in rows {
        let row_key = key.row_key(&row);
        match &mut open {
            Some((current, members)) if *current == row_key => members.push(row),
            _ => {
                if let Some((closed_key, members)) = open.take() {
                    entries.push(close(range, entries.len(), closed_key, members));
                }
                open = Some((row_key, vec![row]));
            }
        }
    }

    if let Some((closed_key, members)) = open {
        entries.push(close(range, entries.len(), closed_key, members));
    }

    tracing::debug!(%range, entries = entries.len(), "grouped rows into entries");
    entries
}

fn close(range: PageRange, emitted: usize, key: (String, Cell), rows: Vec<Row>) -> Entry {
    Entry {
        id: EntryId {
            range,
            ordinal: emitted + 1,
        },
        key,
        rows,
    }
}
