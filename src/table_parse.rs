/// Splits a line into cells on tabs or runs of two-plus whitespace.
/// Single spaces stay inside a cell, so a two-word name is one cell.
pub(crate) fn split_line_into_cells(line: &str) -> Vec<String> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }

    let mut cells = Vec::new();
    let mut cell_words: Vec<&str> = Vec::new();
    let mut word_start: Option<usize> = None;
    let mut gap_len = 0_usize;
    let mut gap_has_tab = false;

    for (index, ch) in trimmed.char_indices() {
        if ch.is_whitespace() {
            if let Some(start) = word_start.take() {
                cell_words.push(&trimmed[start..index]);
            }
            gap_len += 1;
            gap_has_tab |= ch == '\t';
        } else if word_start.is_none() {
            if (gap_len >= 2 || gap_has_tab) && !cell_words.is_empty() {
                cells.push(cell_words.join(" "));
                cell_words.clear();
            }
            gap_len = 0;
            gap_has_tab = false;
            word_start = Some(index);
        }
    }

    if let Some(start) = word_start {
        cell_words.push(&trimmed[start..]);
    }
    if !cell_words.is_empty() {
        cells.push(cell_words.join(" "));
    }

    cells
}

pub(crate) fn soft_split_line_into_cells(line: &str) -> Vec<String> {
    line.split_whitespace().map(str::to_string).collect()
}
