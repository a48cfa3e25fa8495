use crate::model::{PageText, RawTable};
use crate::table_parse::{pad_rows, soft_split_line_into_cells, split_line_into_cells};

fn line_cells(line: &str, min_cols: usize) -> Vec<String> {
    let cells = split_line_into_cells(line);
    if cells.len() >= min_cols {
        return cells;
    }

    let soft_cells = soft_split_line_into_cells(line);
    let has_numeric = soft_cells
        .iter()
        .any(|cell| cell.chars().any(|ch| ch.is_ascii_digit()));
    let looks_like_sentence = ['.', '!', '?']
        .iter()
        .any(|punctuation| line.trim_end().ends_with(*punctuation));
    if soft_cells.len() >= min_cols && !looks_like_sentence && (has_numeric || soft_cells.len() <= 6)
    {
        soft_cells
    } else {
        cells
    }
}

fn flush(rows: &mut Vec<Vec<String>>, tables: &mut Vec<RawTable>) {
    // A single line is a stray heading, not a table.
    if rows.len() >= 2 {
        let rows = std::mem::take(rows);
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        tables.push(RawTable::new(pad_rows(rows, width)));
    } else {
        rows.clear();
    }
}

/// Groups consecutive multi-cell lines of a page into tables, in page order.
pub(crate) fn detect_tables_in_page(page: &PageText, min_cols: usize) -> Vec<RawTable> {
    let mut tables = Vec::new();
    let mut current_rows: Vec<Vec<String>> = Vec::new();

    for line in page.text.lines() {
        let cells = line_cells(line, min_cols);
        if cells.len() >= min_cols {
            current_rows.push(cells);
        } else {
            flush(&mut current_rows, &mut tables);
        }
    }

    flush(&mut current_rows, &mut tables);
    tracing::debug!(
        page = page.page_number,
        tables = tables.len(),
        "detected text tables"
    );
    tables
}

#[cfg(test)]
mod tests {
    use super::detect_tables_in_page;
    use crate::model::PageText;

    fn page(text: &str) -> PageText {
        PageText {
            page_number: 1,
            text: text.to_string(),
        }
    }

    #[test]
    fn splits_tables_on_non_tabular_lines() {
        let tables = detect_tables_in_page(
            &page("ID  NAME\n1  Ann\n2  Bob\nSection two heading.\nCODE  PRICE\nA1  9.50"),
            2,
        );
        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0].rows.len(), 3);
        assert_eq!(
            tables[1].header(),
            Some(&vec![Some("CODE".to_string()), Some("PRICE".to_string())])
        );
    }

    #[test]
    fn pads_short_rows_to_table_width() {
        let tables = detect_tables_in_page(&page("ID  NAME  CITY\n1  Ann  Oslo\n2  Bob"), 2);
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].rows[2].len(), 3);
        assert_eq!(tables[0].rows[2][2], None);
    }

    #[test]
    fn ignores_single_line_candidates() {
        let tables = detect_tables_in_page(&page("Price list  2024\n\nplain prose here."), 2);
        assert!(tables.is_empty());
    }
}
