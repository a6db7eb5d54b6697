// CSV/TSV ledger import.
//
// Fields come in as untyped text; numeric coercion happens later in the
// aggregation pass, so "100" and 100 behave the same whether the ledger
// arrived as a workbook or a CSV export.

use std::io::Read;
use std::path::Path;

use parkrecon_engine::error::ReconError;
use parkrecon_engine::model::{Cell, LedgerTable};

use crate::{check_caps, header_name, warn_duplicate_headers, ImportedLedger};

pub fn import_csv_ledger(path: &Path) -> Result<ImportedLedger, ReconError> {
    let content = read_file_as_utf8(path)?;
    let delimiter = match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("tsv") => b'\t',
        _ => sniff_delimiter(&content),
    };
    let source = path.display().to_string();
    import_from_string(&content, delimiter, &source)
}

/// Detect the most likely field delimiter by checking consistency across the first few lines.
///
/// For each candidate (tab, semicolon, comma, pipe), count fields per line. The delimiter
/// that produces the most consistent field count (>1 field) wins.
fn sniff_delimiter(content: &str) -> u8 {
    let candidates: &[u8] = &[b'\t', b';', b',', b'|'];
    let sample_lines: Vec<&str> = content.lines().take(10).collect();

    if sample_lines.is_empty() {
        return b',';
    }

    let mut best = b',';
    let mut best_score = 0u64;

    for &delim in candidates {
        let counts: Vec<usize> = sample_lines
            .iter()
            .map(|line| {
                csv::ReaderBuilder::new()
                    .delimiter(delim)
                    .has_headers(false)
                    .flexible(true)
                    .from_reader(line.as_bytes())
                    .records()
                    .next()
                    .and_then(|r| r.ok())
                    .map(|r| r.len())
                    .unwrap_or(1)
            })
            .collect();

        // Must produce >1 field on the first line to be viable
        if counts.first().copied().unwrap_or(0) <= 1 {
            continue;
        }

        // Score: (number of lines with same field count as line 1) * field_count.
        // Higher field count breaks ties; more columns means a likelier real delimiter.
        let target = counts[0];
        let consistent = counts.iter().filter(|&&c| c == target).count() as u64;
        let score = consistent * target as u64;

        if score > best_score {
            best_score = score;
            best = delim;
        }
    }

    best
}

/// Read file and convert to UTF-8 if needed (handles Windows-1252, Latin-1, etc.)
pub fn read_file_as_utf8(path: &Path) -> Result<String, ReconError> {
    let mut file = std::fs::File::open(path)
        .map_err(|e| ReconError::Io(format!("cannot open {}: {e}", path.display())))?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)
        .map_err(|e| ReconError::Io(format!("cannot read {}: {e}", path.display())))?;

    // Try UTF-8 first; on failure, recover the buffer from the error
    match String::from_utf8(bytes) {
        Ok(s) => Ok(s),
        Err(e) => {
            let bytes = e.into_bytes();
            // Fall back to Windows-1252 (common for Excel-exported CSVs)
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
            Ok(decoded.into_owned())
        }
    }
}

fn import_from_string(
    content: &str,
    delimiter: u8,
    source: &str,
) -> Result<ImportedLedger, ReconError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut records = reader.records();
    let header = match records.next() {
        Some(result) => result.map_err(|e| ReconError::Io(format!("{source}: {e}")))?,
        None => return Err(ReconError::Io(format!("{source} is empty"))),
    };

    let mut warnings = Vec::new();
    let columns: Vec<String> = header
        .iter()
        .enumerate()
        .map(|(col, field)| header_name(source, col, &field_to_cell(field), &mut warnings))
        .collect();
    warn_duplicate_headers(source, &columns, &mut warnings);
    let width = columns.len();

    // The header fixes the table width. Short rows pad out with empties,
    // overlong rows lose their tail.
    let mut rows = Vec::new();
    let mut overlong = 0usize;
    for result in records {
        let record = result.map_err(|e| ReconError::Io(format!("{source}: {e}")))?;
        if record.len() > width {
            overlong += 1;
        }
        let mut cells: Vec<Cell> = record.iter().take(width).map(field_to_cell).collect();
        cells.resize(width, Cell::Empty);
        rows.push(cells);
    }
    check_caps(source, rows.len() + 1, width)?;

    if overlong > 0 {
        warnings.push(format!(
            "{source}: {overlong} row(s) wider than the header, extra fields dropped"
        ));
    }

    Ok(ImportedLedger {
        table: LedgerTable { columns, rows },
        sheet: None,
        warnings,
    })
}

fn field_to_cell(field: &str) -> Cell {
    if field.is_empty() {
        Cell::Empty
    } else {
        Cell::Text(field.to_string())
    }
}
