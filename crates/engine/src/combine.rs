use crate::config::{Alignment, LedgerConfig, ReportConfig};
use crate::error::ReconError;
use crate::model::{AggregateTable, Amount, Cell, CombinedRow, CombinedTable, Totals};

// Spacer headers are whitespace of distinct widths, exactly as the comparison
// sheet carries them.
const SPACERS_AFTER_A: [&str; 2] = ["   ", "    "];
const SPACER_BEFORE_VARIANCE: &str = "     ";
const VARIANCE_HEADER: &str = "Difference";

/// Zip two aggregates position-by-position into the 10-column comparison
/// layout, computing `variance = amount A - amount B` per row.
///
/// Row *i* of the left aggregate is paired with row *i* of the right one,
/// whether or not their identities match. Under `strict` alignment the
/// aggregates must be the same length; under `pad` the shorter side is
/// extended with blank identity cells and absent amounts.
pub fn combine(
    left: &AggregateTable,
    right: &AggregateTable,
    config: &ReportConfig,
) -> Result<CombinedTable, ReconError> {
    let amount_a = checked_amount(left, config.parking.amount_column)?;
    let amount_b = checked_amount(right, config.settlement.amount_column)?;

    if config.comparison.alignment == Alignment::Strict && left.rows.len() != right.rows.len() {
        return Err(ReconError::LengthMismatch {
            left: left.rows.len(),
            right: right.rows.len(),
        });
    }

    let mut columns = Vec::with_capacity(crate::model::COMPARISON_WIDTH);
    columns.push(left.columns[0].clone());
    columns.push(left.columns[1].clone());
    columns.push(amount_label(&config.parking, left, amount_a));
    columns.push(SPACERS_AFTER_A[0].to_string());
    columns.push(SPACERS_AFTER_A[1].to_string());
    columns.push(right.columns[0].clone());
    columns.push(right.columns[1].clone());
    columns.push(amount_label(&config.settlement, right, amount_b));
    columns.push(SPACER_BEFORE_VARIANCE.to_string());
    columns.push(VARIANCE_HEADER.to_string());

    let len = left.rows.len().max(right.rows.len());
    let mut rows = Vec::with_capacity(len);
    for i in 0..len {
        let (name_a, terminal_a, amount_a) = side_at(left, i, amount_a);
        let (name_b, terminal_b, amount_b) = side_at(right, i, amount_b);
        let variance = amount_a.sub(amount_b);
        rows.push(CombinedRow {
            name_a,
            terminal_a,
            amount_a,
            name_b,
            terminal_b,
            amount_b,
            variance,
        });
    }

    Ok(CombinedTable { columns, rows })
}

/// Column-wise grand totals over the combined table. Absent amounts are
/// skipped, so a column with no defined value totals 0.0. The variance total
/// sums the defined variances, which can differ from the difference of the
/// two amount totals when a row is absent on one side only.
pub fn totals(table: &CombinedTable) -> Totals {
    let mut amount_a = 0.0;
    let mut amount_b = 0.0;
    let mut variance = 0.0;
    for row in &table.rows {
        if let Some(n) = row.amount_a.as_defined() {
            amount_a += n;
        }
        if let Some(n) = row.amount_b.as_defined() {
            amount_b += n;
        }
        if let Some(n) = row.variance.as_defined() {
            variance += n;
        }
    }
    Totals {
        amount_a,
        amount_b,
        variance,
    }
}

fn checked_amount(agg: &AggregateTable, index: usize) -> Result<usize, ReconError> {
    if index >= agg.columns.len() {
        return Err(ReconError::AmountIndexOutOfRange {
            ledger: agg.ledger.clone(),
            index,
            width: agg.columns.len(),
        });
    }
    Ok(index)
}

fn amount_label(side: &LedgerConfig, agg: &AggregateTable, amount: usize) -> String {
    match &side.amount_header {
        Some(label) => label.clone(),
        None => agg.columns[amount].clone(),
    }
}

fn side_at(agg: &AggregateTable, i: usize, amount: usize) -> (Cell, Cell, Amount) {
    match agg.rows.get(i) {
        Some(row) => (row[0].clone(), row[1].clone(), row[amount].to_amount()),
        None => (Cell::Empty, Cell::Empty, Amount::Absent),
    }
}
