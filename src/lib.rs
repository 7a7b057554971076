mod error;
mod extract;
mod mapping;
mod model;
mod options;
mod pdf_reader;
mod persist;
mod store;
mod table_detect;
mod table_parse;
mod warning;

use std::path::Path;

use tracing::debug;

use crate::extract::PageStrategy;
use crate::model::PageText;
use crate::options::DEFAULT_MIN_COLS;
use crate::pdf_reader::{read_pdf_pages, read_pdf_pages_from_bytes};
use crate::table_detect::detect_tables_in_page;

pub use error::ExtractError;
pub use mapping::ColumnMapping;
pub use model::{Field, Record};
pub use options::{ExtractOptions, PageSelection};
pub use persist::{load_or_sample, load_records, sample_records, save_records};
pub use store::{RecordStore, SearchTarget, StoreStats, UNKNOWN_BUCKET};
pub use warning::{ExtractWarning, WarningCode};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionReport {
    pub record_count: usize,
    pub table_count: usize,
    pub warnings: Vec<ExtractWarning>,
}

fn validate_options(options: &ExtractOptions) -> Result<(), ExtractError> {
    if options.min_cols < 2 {
        return Err(ExtractError::InvalidOption(
            "min_cols must be at least 2".to_string(),
        ));
    }
    Ok(())
}

fn extract_from_pages(
    pages: &[PageText],
    options: &ExtractOptions,
) -> (Vec<Record>, ExtractionReport) {
    let mapping = options.mapping.clone().unwrap_or_default();
    let mut warnings = Vec::new();
    let mut records = Vec::new();
    let mut table_count = 0;

    for page in pages {
        if page.text.trim().is_empty() {
            continue;
        }

        let strategy = PageStrategy::for_page(page, options.min_cols);
        if matches!(strategy, PageStrategy::TextAnchor(_)) {
            debug!(page = page.page_number, "no tabular grid; scanning text for anchored lines");
            warnings.push(
                ExtractWarning::new(
                    WarningCode::TextFallback,
                    "no tabular grid on page; used anchored text scan",
                )
                .with_page(page.page_number),
            );
        }

        table_count += strategy.table_count();
        records.extend(strategy.extract(&mapping));
    }

    if records.is_empty() {
        warnings.push(ExtractWarning::new(
            WarningCode::NoRecordsExtracted,
            "document yielded no qualifying records",
        ));
    }

    let report = ExtractionReport {
        record_count: records.len(),
        table_count,
        warnings,
    };
    (records, report)
}

/// Extracts normalized records from a PDF on disk. Tabular grids are
/// preferred; pages without one fall back to the anchored text scan.
/// Zero extracted records is an empty result, not an error.
pub fn extract_records(
    input_pdf: &Path,
    options: &ExtractOptions,
) -> Result<(Vec<Record>, ExtractionReport), ExtractError> {
    validate_options(options)?;
    let pages = read_pdf_pages(input_pdf, options.pages.as_ref())?;
    Ok(extract_from_pages(&pages, options))
}

/// Same as [`extract_records`], for an in-memory document.
pub fn extract_records_from_bytes(
    input_pdf: &[u8],
    options: &ExtractOptions,
) -> Result<(Vec<Record>, ExtractionReport), ExtractError> {
    validate_options(options)?;
    let pages = read_pdf_pages_from_bytes(input_pdf, options.pages.as_ref())?;
    Ok(extract_from_pages(&pages, options))
}

fn headers_from_pages(pages: &[PageText]) -> Vec<String> {
    for page in pages {
        let tables = detect_tables_in_page(page, DEFAULT_MIN_COLS);
        if let Some(header) = tables.first().and_then(|table| table.rows.first()) {
            return header
                .iter()
                .map(|cell| cell.trim().to_string())
                .filter(|cell| !cell.is_empty())
                .collect();
        }
    }
    Vec::new()
}

/// Returns the header cells of the first tabular grid in the
/// document, for building a column mapping before the real extraction
/// run. Empty when no page has a grid.
pub fn discover_columns(input_pdf: &Path) -> Result<Vec<String>, ExtractError> {
    let pages = read_pdf_pages(input_pdf, None)?;
    Ok(headers_from_pages(&pages))
}

/// Same as [`discover_columns`], for an in-memory document.
pub fn discover_columns_from_bytes(input_pdf: &[u8]) -> Result<Vec<String>, ExtractError> {
    let pages = read_pdf_pages_from_bytes(input_pdf, None)?;
    Ok(headers_from_pages(&pages))
}
