use std::collections::BTreeMap;
use std::fmt;

use serde::ser::{Serialize, Serializer};

use crate::config::Alignment;

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// A single untyped cell from a source ledger.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
    Empty,
}

impl Cell {
    /// Whether the cell holds no value (empty, or an empty string).
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(s) => s.is_empty(),
            Self::Number(_) => false,
        }
    }

    /// Coerce to an amount. Non-numeric text becomes `Absent`, never zero.
    /// `f64` parsing accepts "NaN", so results go through `Amount::from_f64`,
    /// which keeps NaN out of the defined numbers.
    pub fn to_amount(&self) -> Amount {
        match self {
            Self::Number(n) => Amount::from_f64(*n),
            Self::Text(s) => match s.trim().parse::<f64>() {
                Ok(n) => Amount::from_f64(n),
                Err(_) => Amount::Absent,
            },
            Self::Empty => Amount::Absent,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => write!(f, "{s}"),
            Self::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{n}")
                }
            }
            Self::Empty => Ok(()),
        }
    }
}

impl Serialize for Cell {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Text(s) => serializer.serialize_str(s),
            Self::Number(n) => serializer.serialize_f64(*n),
            Self::Empty => serializer.serialize_none(),
        }
    }
}

/// A source ledger: named columns plus untyped rows, one `Cell` per column.
#[derive(Debug, Clone, serde::Serialize)]
pub struct LedgerTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl LedgerTable {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }
}

// ---------------------------------------------------------------------------
// Amounts
// ---------------------------------------------------------------------------

/// A numeric amount, or the explicit marker for "no value here".
///
/// `Absent` propagates through subtraction and is skipped by summation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Amount {
    Number(f64),
    Absent,
}

impl Amount {
    /// Wrap a float, reading NaN as `Absent`. NaN marks an unreadable value
    /// in this model and must never reach a sum.
    pub fn from_f64(n: f64) -> Amount {
        if n.is_nan() {
            Amount::Absent
        } else {
            Amount::Number(n)
        }
    }

    pub fn sub(self, other: Amount) -> Amount {
        match (self, other) {
            (Amount::Number(a), Amount::Number(b)) => Amount::from_f64(a - b),
            _ => Amount::Absent,
        }
    }

    pub fn as_defined(self) -> Option<f64> {
        match self {
            Amount::Number(n) => Some(n),
            Amount::Absent => None,
        }
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Number(n) => serializer.serialize_f64(*n),
            Self::Absent => serializer.serialize_none(),
        }
    }
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

/// Per-identity summed view of one ledger.
///
/// Schema: identity columns at ordinals 0 and 1, surviving numeric columns
/// after, in source order. Rows are in first-seen order of the identity pair.
#[derive(Debug, Clone, serde::Serialize)]
pub struct AggregateTable {
    /// Ledger label, used in error and log messages.
    pub ledger: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

// ---------------------------------------------------------------------------
// Combination
// ---------------------------------------------------------------------------

/// Column ordinals of the comparison sheet, 0-indexed. The layout is a fixed
/// downstream contract: identity A, terminal A, amount A, two spacers,
/// identity B, terminal B, amount B, spacer, variance.
pub const COL_NAME_A: usize = 0;
pub const COL_TERMINAL_A: usize = 1;
pub const COL_AMOUNT_A: usize = 2;
pub const COL_NAME_B: usize = 5;
pub const COL_TERMINAL_B: usize = 6;
pub const COL_AMOUNT_B: usize = 7;
pub const COL_VARIANCE: usize = 9;
pub const COMPARISON_WIDTH: usize = 10;

/// The six data columns checked for missing values (spacers and variance
/// excluded).
pub const DATA_COLUMNS: [usize; 6] = [
    COL_NAME_A,
    COL_TERMINAL_A,
    COL_AMOUNT_A,
    COL_NAME_B,
    COL_TERMINAL_B,
    COL_AMOUNT_B,
];

/// One positionally paired row of the two aggregates.
#[derive(Debug, Clone, serde::Serialize)]
pub struct CombinedRow {
    pub name_a: Cell,
    pub terminal_a: Cell,
    pub amount_a: Amount,
    pub name_b: Cell,
    pub terminal_b: Cell,
    pub amount_b: Amount,
    /// amount A − amount B; `Absent` when either side is absent.
    pub variance: Amount,
}

impl CombinedRow {
    /// Whether the given data column holds no value in this row.
    /// Spacer and variance ordinals are never blank in this sense.
    pub fn is_blank_at(&self, col: usize) -> bool {
        match col {
            COL_NAME_A => self.name_a.is_blank(),
            COL_TERMINAL_A => self.terminal_a.is_blank(),
            COL_AMOUNT_A => self.amount_a == Amount::Absent,
            COL_NAME_B => self.name_b.is_blank(),
            COL_TERMINAL_B => self.terminal_b.is_blank(),
            COL_AMOUNT_B => self.amount_b == Amount::Absent,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct CombinedTable {
    /// Comparison-sheet header labels; spacer ordinals hold whitespace
    /// labels of distinct widths.
    pub columns: Vec<String>,
    pub rows: Vec<CombinedRow>,
}

/// Grand totals over the combined table. Absent entries are skipped, so a
/// column with no defined values totals 0.0.
#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct Totals {
    pub amount_a: f64,
    pub amount_b: f64,
    pub variance: f64,
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CellClass {
    Positive,
    Negative,
    Missing,
}

impl fmt::Display for CellClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Positive => write!(f, "positive"),
            Self::Negative => write!(f, "negative"),
            Self::Missing => write!(f, "missing"),
        }
    }
}

/// A classified cell, as it appears in the serialized report.
#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct CellMark {
    pub row: usize,
    pub col: usize,
    pub class: CellClass,
}

/// Per-cell classification of the combined table, keyed by (row, column).
/// Absence of a key means the cell carries no mark (the "none" class).
#[derive(Debug, Clone, Default)]
pub struct ClassMap {
    cells: BTreeMap<(usize, usize), CellClass>,
}

impl ClassMap {
    pub fn insert(&mut self, row: usize, col: usize, class: CellClass) {
        self.cells.insert((row, col), class);
    }

    pub fn get(&self, row: usize, col: usize) -> Option<CellClass> {
        self.cells.get(&(row, col)).copied()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, CellClass)> + '_ {
        self.cells.iter().map(|(&(row, col), &class)| (row, col, class))
    }
}

impl Serialize for ClassMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(
            self.cells
                .iter()
                .map(|(&(row, col), &class)| CellMark { row, col, class }),
        )
    }
}

// ---------------------------------------------------------------------------
// Summary + Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, serde::Serialize)]
pub struct ReconSummary {
    pub rows_a: usize,
    pub rows_b: usize,
    pub groups_a: usize,
    pub groups_b: usize,
    pub combined_rows: usize,
    pub positive: usize,
    pub negative: usize,
    pub zero: usize,
    pub undefined: usize,
    pub missing_cells: usize,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct ReconReport {
    pub meta: RunMeta,
    pub summary: ReconSummary,
    pub aggregate_a: AggregateTable,
    pub aggregate_b: AggregateTable,
    pub combined: CombinedTable,
    pub totals: Totals,
    pub classes: ClassMap,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct RunMeta {
    pub config_name: String,
    pub alignment: Alignment,
    pub engine_version: String,
    pub run_at: String,
}
