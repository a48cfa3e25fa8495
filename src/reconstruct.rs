use crate::document::{ExtractionMode, TableSource};
use crate::model::{Cell, RawRow, RawTable, ReconstructedTable, Row};
use crate::options::KeyColumn;
use crate::segment::SubDocument;

/// Whether `next` carries on the accumulated table across a page break.
///
/// Headers must be identical, and the key of the accumulator's last row
/// must equal the key of `next`'s first data row.
pub fn is_continuation(accumulated: &[RawRow], next: &RawTable, key: &KeyColumn) -> bool {
    let (Some(header), Some(last_row)) = (accumulated.first(), accumulated.last()) else {
        return false;
    };
    let (Some(next_header), Some(first_row)) = (next.header(), next.first_data_row()) else {
        return false;
    };

    header == next_header && key.raw_value(header, last_row) == key.raw_value(header, first_row)
}

/// Stitches the first table of every page back into one table.
pub fn merge_page_tables<I>(tables: I, key: &KeyColumn) -> Vec<RawRow>
where
    I: IntoIterator<Item = RawTable>,
{
    let mut accumulated: Vec<RawRow> = Vec::new();

    for table in tables {
        if table.is_empty() {
            continue;
        }

        if accumulated.is_empty() {
            accumulated = table.rows;
        } else if is_continuation(&accumulated, &table, key) {
            accumulated.extend(table.rows.into_iter().skip(1));
        } else {
            accumulated.extend(table.rows);
        }
    }

    accumulated
}

fn header_names(header: &RawRow) -> Vec<String> {
    header
        .iter()
        .enumerate()
        .map(|(index, cell)| match cell.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => format!("column_{}", index + 1),
        })
        .collect()
}

fn to_row(header: &[String], cells: RawRow) -> Row {
    let extra = cells.len().saturating_sub(header.len());
    if extra > 0 {
        tracing::debug!(
            width = header.len(),
            dropped = extra,
            "row wider than header; extra cells dropped"
        );
    }
    let mut cells = cells.into_iter();
    header
        .iter()
        .map(|name| (name.as_str(), Cell::from(cells.next().flatten())))
        .collect()
}

/// Re-extracts one sub-document into a single table of named rows.
///
/// Consumes the sub-document, so its backing file is released once the rows
/// have been read.
pub fn reconstruct<P: TableSource>(sub: SubDocument<P>, key: &KeyColumn) -> ReconstructedTable {
    let range = sub.range;
    let document = &sub.document;
    let tables = (1..=document.page_count())
        .filter_map(|page| {
            document
                .tables(page, ExtractionMode::FirstTable)
                .into_iter()
                .next()
        })
        .collect::<Vec<_>>();
    drop(sub);

    let mut rows = merge_page_tables(tables, key).into_iter();
    let Some(header) = rows.next() else {
        tracing::debug!(%range, "sub-document has no tables");
        return ReconstructedTable::empty(range);
    };

    let header = header_names(&header);
    let rows = rows.map(|cells| to_row(&header, cells)).collect::<Vec<_>>();
    tracing::debug!(%range, rows = rows.len(), "reconstructed table");

    ReconstructedTable {
        range,
        header,
        rows,
    }
}
