use serde::Deserialize;

use crate::error::ReconError;

/// Sheet names of the fixed reconciliation contract, used wherever a config
/// leaves them unset.
pub const DEFAULT_PARKING_SHEET: &str = "NCMCParkingDB";
pub const DEFAULT_SETTLEMENT_SHEET: &str = "NCMC-ParkingSettlement";
pub const DEFAULT_COMPARISON_SHEET: &str = "Comparison";

/// Ordinal of the designated amount column in the aggregated schema,
/// 0-indexed. The source contract positions the amount 8th.
pub const DEFAULT_AMOUNT_COLUMN: usize = 7;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct ReportConfig {
    /// Result identifier; also the default output file stem.
    pub name: String,
    pub parking: LedgerConfig,
    pub settlement: LedgerConfig,
    #[serde(default)]
    pub comparison: ComparisonConfig,
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
    /// Source file, .xlsx or .csv, resolved relative to the config file.
    pub file: String,
    /// Sheet to read. The importer falls back to the first sheet when unset.
    #[serde(default)]
    pub sheet: Option<String>,
    pub name_column: String,
    pub terminal_column: String,
    /// 0-indexed ordinal of the designated amount column in the aggregated
    /// schema (identity pair at 0 and 1, surviving numeric columns after).
    #[serde(default = "default_amount_column")]
    pub amount_column: usize,
    /// Label for this side's amount on the comparison sheet. Falls back to
    /// the aggregated column's own header when unset.
    #[serde(default)]
    pub amount_header: Option<String>,
}

fn default_amount_column() -> usize {
    DEFAULT_AMOUNT_COLUMN
}

// ---------------------------------------------------------------------------
// Comparison
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct ComparisonConfig {
    #[serde(default = "default_comparison_sheet")]
    pub sheet: String,
    #[serde(default)]
    pub alignment: Alignment,
}

fn default_comparison_sheet() -> String {
    DEFAULT_COMPARISON_SHEET.to_string()
}

impl Default for ComparisonConfig {
    fn default() -> Self {
        Self {
            sheet: default_comparison_sheet(),
            alignment: Alignment::default(),
        }
    }
}

/// How to resolve aggregates of differing length before zipping.
///
/// `strict` refuses to pair them; `pad` extends the shorter side with rows
/// whose identity cells are blank and whose amount is absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Alignment {
    Strict,
    Pad,
}

impl Default for Alignment {
    fn default() -> Self {
        Self::Strict
    }
}

impl std::fmt::Display for Alignment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Strict => write!(f, "strict"),
            Self::Pad => write!(f, "pad"),
        }
    }
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl ReportConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: ReportConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        if self.name.trim().is_empty() {
            return Err(ReconError::ConfigValidation("name must not be empty".into()));
        }

        for (label, ledger) in [("parking", &self.parking), ("settlement", &self.settlement)] {
            if ledger.file.trim().is_empty() {
                return Err(ReconError::ConfigValidation(format!(
                    "ledger '{label}': file must not be empty"
                )));
            }
            if ledger.name_column.trim().is_empty() || ledger.terminal_column.trim().is_empty() {
                return Err(ReconError::ConfigValidation(format!(
                    "ledger '{label}': name_column and terminal_column must not be empty"
                )));
            }
            if ledger.name_column == ledger.terminal_column {
                return Err(ReconError::ConfigValidation(format!(
                    "ledger '{label}': name_column and terminal_column must differ, both are '{}'",
                    ledger.name_column
                )));
            }
            // Ordinals 0 and 1 of the aggregated schema are the identity pair.
            if ledger.amount_column < 2 {
                return Err(ReconError::ConfigValidation(format!(
                    "ledger '{label}': amount_column must be at least 2, got {}",
                    ledger.amount_column
                )));
            }
            if let Some(sheet) = &ledger.sheet {
                check_sheet_name(&format!("ledger '{label}'"), sheet)?;
            }
        }

        check_sheet_name("comparison", &self.comparison.sheet)?;
        Ok(())
    }

    /// Output sheet label for the parking aggregate; the contract name when
    /// the ledger's sheet is unset.
    pub fn parking_sheet(&self) -> &str {
        self.parking.sheet.as_deref().unwrap_or(DEFAULT_PARKING_SHEET)
    }

    /// Output sheet label for the settlement aggregate.
    pub fn settlement_sheet(&self) -> &str {
        self.settlement.sheet.as_deref().unwrap_or(DEFAULT_SETTLEMENT_SHEET)
    }
}

fn check_sheet_name(context: &str, name: &str) -> Result<(), ReconError> {
    if name.is_empty() {
        return Err(ReconError::ConfigValidation(format!(
            "{context}: sheet name must not be empty"
        )));
    }
    if name.chars().count() > 31 {
        return Err(ReconError::ConfigValidation(format!(
            "{context}: sheet name '{name}' is longer than 31 characters"
        )));
    }
    if let Some(bad) = name.chars().find(|c| matches!(c, '[' | ']' | ':' | '*' | '?' | '/' | '\\'))
    {
        return Err(ReconError::ConfigValidation(format!(
            "{context}: sheet name '{name}' contains invalid character '{bad}'"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Default contract
// ---------------------------------------------------------------------------

/// The fixed contract of the original report: two xlsx ledgers with the
/// identity columns named below and the amount positioned 8th after
/// aggregation.
impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            name: "comparison_result".into(),
            parking: LedgerConfig {
                file: "parking.xlsx".into(),
                sheet: Some(DEFAULT_PARKING_SHEET.into()),
                name_column: "Name".into(),
                terminal_column: "Terminal_id".into(),
                amount_column: DEFAULT_AMOUNT_COLUMN,
                amount_header: Some("NCMC_SVP_Amt".into()),
            },
            settlement: LedgerConfig {
                file: "settlement.xlsx".into(),
                sheet: Some(DEFAULT_SETTLEMENT_SHEET.into()),
                name_column: "Merchant Name".into(),
                terminal_column: "Terminal ID".into(),
                amount_column: DEFAULT_AMOUNT_COLUMN,
                amount_header: Some("Settlement Amount".into()),
            },
            comparison: ComparisonConfig::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
