use crate::model::RawRow;

/// Splits a text line into cells at tabs and at gaps of two or more spaces.
///
/// Single spaces stay inside a cell, so `New York  NY` is two cells.
pub(crate) fn split_line_into_cells(line: &str) -> Vec<String> {
    let mut cells = Vec::new();
    let mut cell = String::new();
    let mut gap = 0_usize;

    let mut close = |cell: &mut String| {
        let text = cell.trim();
        if !text.is_empty() {
            cells.push(text.to_string());
        }
        cell.clear();
    };

    for ch in line.trim().chars() {
        match ch {
            '\t' => {
                close(&mut cell);
                gap = 0;
            }
            ch if ch.is_whitespace() => {
                gap += 1;
                if gap == 2 {
                    close(&mut cell);
                } else if gap == 1 {
                    cell.push(' ');
                }
            }
            ch => {
                gap = 0;
                cell.push(ch);
            }
        }
    }
    close(&mut cell);

    cells
}

/// Splits on every whitespace run; used when a line has no wide gaps.
pub(crate) fn soft_split_line_into_cells(line: &str) -> Vec<String> {
    line.split_whitespace().map(str::to_string).collect()
}

/// Pads every row with empty cells up to `width`.
pub(crate) fn pad_rows(rows: Vec<Vec<String>>, width: usize) -> Vec<RawRow> {
    rows.into_iter()
        .map(|row| {
            let mut out = row.into_iter().map(Some).collect::<RawRow>();
            out.resize(width, None);
            out
        })
        .collect()
}
