use std::collections::HashMap;

use crate::error::ReconError;
use crate::model::{AggregateTable, Cell, LedgerTable};

const EMPTY: Cell = Cell::Empty;

fn cell<'a>(row: &'a [Cell], idx: usize) -> &'a Cell {
    row.get(idx).unwrap_or(&EMPTY)
}

/// How a single cell reads for column typing.
enum CellKind {
    Blank,
    Numeric(f64),
    Textual,
}

fn kind_of(cell: &Cell) -> CellKind {
    match cell {
        Cell::Empty => CellKind::Blank,
        // NaN is the missing marker, not a summable value.
        Cell::Number(n) if n.is_nan() => CellKind::Blank,
        Cell::Number(n) => CellKind::Numeric(*n),
        Cell::Text(s) => {
            let t = s.trim();
            if t.is_empty() {
                CellKind::Blank
            } else {
                match t.parse::<f64>() {
                    Ok(n) if n.is_nan() => CellKind::Blank,
                    Ok(n) => CellKind::Numeric(n),
                    Err(_) => CellKind::Textual,
                }
            }
        }
    }
}

/// A non-identity source column kept in the aggregated schema.
struct Survivor {
    src: usize,
    /// First non-numeric cell, 1-based data row + rendered value.
    /// Only set for columns that also contain numeric cells.
    mixed: Option<(usize, String)>,
}

struct Group {
    name: Cell,
    terminal: Cell,
    sums: Vec<Option<f64>>,
}

/// Group a ledger by its (name, terminal) identity pair, in first-seen order,
/// and sum every surviving numeric column per group.
///
/// The aggregated schema is [name, terminal] followed by the surviving
/// columns in source order. Pure-text columns are dropped. A column mixing
/// numeric and non-numeric content fails with `NonNumeric`, except the
/// column at `amount_column` (an ordinal into the aggregated schema), which
/// coerces per cell and skips what cannot be read. A group with no readable
/// value in a column sums to an empty cell, not zero.
pub fn aggregate(
    ledger: &str,
    table: &LedgerTable,
    name_column: &str,
    terminal_column: &str,
    amount_column: usize,
) -> Result<AggregateTable, ReconError> {
    let name_idx = table.column_index(name_column).ok_or_else(|| ReconError::MissingColumn {
        ledger: ledger.to_string(),
        column: name_column.to_string(),
    })?;
    let terminal_idx =
        table.column_index(terminal_column).ok_or_else(|| ReconError::MissingColumn {
            ledger: ledger.to_string(),
            column: terminal_column.to_string(),
        })?;

    // Type every non-identity column: numeric evidence keeps it, pure text
    // drops it. An all-blank column has no evidence against it and is kept.
    let mut columns = vec![name_column.to_string(), terminal_column.to_string()];
    let mut survivors: Vec<Survivor> = Vec::new();
    for (src, col_name) in table.columns.iter().enumerate() {
        if src == name_idx || src == terminal_idx {
            continue;
        }
        let mut saw_numeric = false;
        let mut first_text: Option<(usize, String)> = None;
        for (row_idx, row) in table.rows.iter().enumerate() {
            match kind_of(cell(row, src)) {
                CellKind::Numeric(_) => saw_numeric = true,
                CellKind::Textual => {
                    if first_text.is_none() {
                        first_text = Some((row_idx + 1, cell(row, src).to_string()));
                    }
                }
                CellKind::Blank => {}
            }
        }
        if first_text.is_some() && !saw_numeric {
            continue;
        }
        columns.push(col_name.clone());
        survivors.push(Survivor { src, mixed: first_text });
    }

    let width = columns.len();
    if amount_column >= width {
        return Err(ReconError::AmountIndexOutOfRange {
            ledger: ledger.to_string(),
            index: amount_column,
            width,
        });
    }

    // The designated amount column keeps tolerant per-cell coercion; any
    // other mixed column is a data error.
    let designated = amount_column.checked_sub(2);
    for (si, surv) in survivors.iter().enumerate() {
        if Some(si) == designated {
            continue;
        }
        if let Some((row, value)) = &surv.mixed {
            return Err(ReconError::NonNumeric {
                ledger: ledger.to_string(),
                column: columns[si + 2].clone(),
                row: *row,
                value: value.clone(),
            });
        }
    }

    let mut index: HashMap<(String, String), usize> = HashMap::new();
    let mut groups: Vec<Group> = Vec::new();

    for row in &table.rows {
        let name_cell = cell(row, name_idx);
        let terminal_cell = cell(row, terminal_idx);
        let key = (name_cell.to_string(), terminal_cell.to_string());
        let gi = *index.entry(key).or_insert_with(|| {
            groups.push(Group {
                name: name_cell.clone(),
                terminal: terminal_cell.clone(),
                sums: vec![None; survivors.len()],
            });
            groups.len() - 1
        });
        for (si, surv) in survivors.iter().enumerate() {
            if let CellKind::Numeric(n) = kind_of(cell(row, surv.src)) {
                *groups[gi].sums[si].get_or_insert(0.0) += n;
            }
        }
    }

    let rows = groups
        .into_iter()
        .map(|group| {
            let mut row = Vec::with_capacity(width);
            row.push(group.name);
            row.push(group.terminal);
            row.extend(group.sums.into_iter().map(|sum| match sum {
                Some(n) => Cell::Number(n),
                None => Cell::Empty,
            }));
            row
        })
        .collect();

    Ok(AggregateTable {
        ledger: ledger.to_string(),
        columns,
        rows,
    })
}
