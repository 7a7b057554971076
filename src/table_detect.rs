use crate::model::{DetectedTable, PageText};
use crate::table_parse::split_line_into_cells;

/// Groups consecutive columnar lines into grids. A grid needs at
/// least two lines (a header plus one data row) with `min_cols` cells
/// each; single-spaced free text never forms a grid and is left for
/// the anchored text fallback.
pub(crate) fn detect_tables_in_page(page: &PageText, min_cols: usize) -> Vec<DetectedTable> {
    let mut tables = Vec::new();
    let mut current_rows: Vec<Vec<String>> = Vec::new();

    let flush = |rows: &mut Vec<Vec<String>>, tables: &mut Vec<DetectedTable>| {
        if rows.len() >= 2 {
            tables.push(DetectedTable {
                page: page.page_number,
                rows: std::mem::take(rows),
            });
        } else {
            rows.clear();
        }
    };

    for line in page.text.lines() {
        let cells = split_line_into_cells(line);
        if cells.len() >= min_cols {
            current_rows.push(cells);
        } else {
            flush(&mut current_rows, &mut tables);
        }
    }

    flush(&mut current_rows, &mut tables);
    tables
}
