use std::fmt;

#[derive(Debug)]
pub enum ReconError {
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (empty name, bad ordinal, bad sheet name, etc.).
    ConfigValidation(String),
    /// Required identity column missing from a ledger's header.
    MissingColumn { ledger: String, column: String },
    /// Designated amount ordinal falls outside the aggregated schema.
    AmountIndexOutOfRange { ledger: String, index: usize, width: usize },
    /// Non-numeric value in a column being summed.
    NonNumeric { ledger: String, column: String, row: usize, value: String },
    /// Aggregates of different length under strict alignment.
    LengthMismatch { left: usize, right: usize },
    /// IO error (file read/write, workbook save).
    Io(String),
}

impl fmt::Display for ReconError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::MissingColumn { ledger, column } => {
                write!(f, "ledger '{ledger}': missing column '{column}'")
            }
            Self::AmountIndexOutOfRange { ledger, index, width } => {
                write!(
                    f,
                    "ledger '{ledger}': amount column {index} is outside the aggregated schema of {width} column(s)"
                )
            }
            Self::NonNumeric { ledger, column, row, value } => {
                write!(
                    f,
                    "ledger '{ledger}', column '{column}', row {row}: cannot sum non-numeric value '{value}'"
                )
            }
            Self::LengthMismatch { left, right } => {
                write!(
                    f,
                    "aggregates differ in length ({left} vs {right} rows); set alignment = \"pad\" to fill the shorter side"
                )
            }
            Self::Io(msg) => write!(f, "IO error: {msg}"),
        }
    }
}

impl std::error::Error for ReconError {}
