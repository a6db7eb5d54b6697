use crate::model::{Amount, CellClass, ClassMap, CombinedTable, COL_VARIANCE, DATA_COLUMNS};

/// Classify the combined table per cell.
///
/// Two scans with different column scopes. The variance column takes
/// `Positive` or `Negative` by sign; an exact zero and an undefined variance
/// carry no mark. The six data columns take `Missing` wherever a cell is
/// blank or an amount is absent, independently of what the variance scan
/// produced for that row. The totals trailer is not part of the table and is
/// never classified.
pub fn classify(table: &CombinedTable) -> ClassMap {
    let mut classes = ClassMap::default();

    for (row_idx, row) in table.rows.iter().enumerate() {
        if let Amount::Number(v) = row.variance {
            if v > 0.0 {
                classes.insert(row_idx, COL_VARIANCE, CellClass::Positive);
            } else if v < 0.0 {
                classes.insert(row_idx, COL_VARIANCE, CellClass::Negative);
            }
        }
    }

    for (row_idx, row) in table.rows.iter().enumerate() {
        for col in DATA_COLUMNS {
            if row.is_blank_at(col) {
                classes.insert(row_idx, col, CellClass::Missing);
            }
        }
    }

    classes
}
