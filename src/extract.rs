use std::sync::OnceLock;

use regex::Regex;

use crate::mapping::ColumnMapping;
use crate::model::{DetectedTable, Field, PageText, Record};
use crate::table_detect::detect_tables_in_page;

/// Roll identifier shape anchoring candidate lines in free text: two
/// digits, `/`, one letter and two digits, `/`, three digits.
const ROLL_ANCHOR: &str = r"\d{2}/[A-Za-z]\d{2}/\d{3}";

pub(crate) fn roll_anchor() -> &'static Regex {
    static ANCHOR: OnceLock<Regex> = OnceLock::new();
    ANCHOR.get_or_init(|| Regex::new(ROLL_ANCHOR).expect("roll anchor pattern is valid"))
}

/// Per-page extraction strategy. A page either yielded tabular grids
/// (preferred) or falls back to anchor-scanning its raw text. Both
/// variants route rows through the same column mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum PageStrategy {
    Tabular(Vec<DetectedTable>),
    TextAnchor(String),
}

impl PageStrategy {
    pub(crate) fn for_page(page: &PageText, min_cols: usize) -> Self {
        let tables = detect_tables_in_page(page, min_cols);
        if tables.is_empty() {
            Self::TextAnchor(page.text.clone())
        } else {
            Self::Tabular(tables)
        }
    }

    pub(crate) fn table_count(&self) -> usize {
        match self {
            Self::Tabular(tables) => tables.len(),
            Self::TextAnchor(_) => 0,
        }
    }

    pub(crate) fn extract(&self, mapping: &ColumnMapping) -> Vec<Record> {
        match self {
            Self::Tabular(tables) => tables
                .iter()
                .flat_map(|table| process_table(table, mapping))
                .collect(),
            Self::TextAnchor(text) => parse_text(text, mapping),
        }
    }
}

/// The first row of every grid is a header and never emits a record.
pub(crate) fn process_table(table: &DetectedTable, mapping: &ColumnMapping) -> Vec<Record> {
    table
        .rows
        .iter()
        .skip(1)
        .filter_map(|row| record_from_cells(row, mapping))
        .collect()
}

/// Scans free text for anchored lines. Lines without the roll anchor
/// are headers, page numbers, or prose and are skipped; the parser
/// trades recall for precision.
pub(crate) fn parse_text(text: &str, mapping: &ColumnMapping) -> Vec<Record> {
    text.lines()
        .filter(|line| roll_anchor().is_match(line))
        .filter_map(|line| {
            let tokens = line.split_whitespace().collect::<Vec<_>>();
            record_from_tokens(&tokens, mapping)
        })
        .collect()
}

fn record_from_cells(cells: &[String], mapping: &ColumnMapping) -> Option<Record> {
    if cells.len() < mapping.min_row_len() {
        return None;
    }

    let mut record = Record::default();
    for field in Field::ALL {
        let Some(index) = mapping.index_of(field) else {
            continue;
        };
        let value = cells.get(index).map(|cell| cell.trim()).unwrap_or_default();
        record.set_field(field, value.to_string());
    }

    record.is_admissible().then_some(record)
}

/// Token assignment for anchored lines. Whitespace tokenization splits
/// multi-word names, so surplus tokens beyond the mapping width fold
/// into the candidate-name field and fields mapped after it are taken
/// relative to the line end. Without a mapped name the assignment is
/// strictly positional.
fn record_from_tokens(tokens: &[&str], mapping: &ColumnMapping) -> Option<Record> {
    if tokens.len() < mapping.min_row_len() {
        return None;
    }
    let surplus = tokens.len() - mapping.min_row_len();
    let name_index = mapping.index_of(Field::Cn);

    let mut record = Record::default();
    for field in Field::ALL {
        let Some(index) = mapping.index_of(field) else {
            continue;
        };
        let value = match name_index {
            Some(name_at) if index == name_at => tokens[name_at..=name_at + surplus].join(" "),
            Some(name_at) if index > name_at => tokens
                .get(index + surplus)
                .copied()
                .unwrap_or_default()
                .to_string(),
            _ => tokens.get(index).copied().unwrap_or_default().to_string(),
        };
        record.set_field(field, value.trim().to_string());
    }

    record.is_admissible().then_some(record)
}
