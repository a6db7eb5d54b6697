//! File boundary of the reconciliation pipeline.
//!
//! Imports ledgers from xlsx (and friends, via calamine) or CSV into the
//! engine's `LedgerTable`, and renders a finished `ReconReport` as a three
//! sheet workbook. All failures map into `ReconError::Io`; non-fatal import
//! anomalies come back as warnings next to the table.

use std::path::Path;

use parkrecon_engine::error::ReconError;
use parkrecon_engine::model::LedgerTable;

pub mod csv;
pub mod xlsx;

pub use xlsx::{inspect_workbook, write_workbook};

/// An imported ledger plus anything worth telling the user about it.
#[derive(Debug)]
pub struct ImportedLedger {
    pub table: LedgerTable,
    /// Sheet actually read; `None` for CSV sources.
    pub sheet: Option<String>,
    pub warnings: Vec<String>,
}

/// Import ceilings, per sheet. Exceeding one fails the import outright so a
/// report is never built from a partial ledger.
pub const MAX_ROWS: usize = 65_536;
pub const MAX_COLS: usize = 256;
pub const MAX_CELLS: usize = 1_000_000;

/// Load a ledger by file extension: `.csv`/`.tsv` go through the CSV reader,
/// everything else through calamine. `sheet` only applies to workbooks.
pub fn load_ledger(path: &Path, sheet: Option<&str>) -> Result<ImportedLedger, ReconError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("csv") || ext.eq_ignore_ascii_case("tsv") => {
            csv::import_csv_ledger(path)
        }
        _ => xlsx::import_ledger(path, sheet),
    }
}

pub(crate) fn check_caps(source: &str, rows: usize, cols: usize) -> Result<(), ReconError> {
    if rows > MAX_ROWS {
        return Err(ReconError::Io(format!(
            "{source}: {rows} rows exceed the {MAX_ROWS} row ceiling"
        )));
    }
    if cols > MAX_COLS {
        return Err(ReconError::Io(format!(
            "{source}: {cols} columns exceed the {MAX_COLS} column ceiling"
        )));
    }
    let cells = rows.saturating_mul(cols);
    if cells > MAX_CELLS {
        return Err(ReconError::Io(format!(
            "{source}: {cells} cells exceed the {MAX_CELLS} cell ceiling"
        )));
    }
    Ok(())
}

/// Turn a header cell into a column name. Blank headers get a placeholder so
/// every column stays addressable, with a warning recorded.
pub(crate) fn header_name(
    source: &str,
    col: usize,
    raw: &parkrecon_engine::model::Cell,
    warnings: &mut Vec<String>,
) -> String {
    if raw.is_blank() {
        warnings.push(format!(
            "{source}: blank header in column {col}, using 'Unnamed: {col}'"
        ));
        format!("Unnamed: {col}")
    } else {
        raw.to_string()
    }
}

/// Warn once per duplicated header label; lookups resolve to the first one.
pub(crate) fn warn_duplicate_headers(source: &str, columns: &[String], warnings: &mut Vec<String>) {
    for (i, name) in columns.iter().enumerate() {
        if columns[..i].contains(name) {
            warnings.push(format!(
                "{source}: duplicate header '{name}', the first occurrence wins"
            ));
        }
    }
}
