//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract; scripts rely on them.
//!
//! # Exit Code Ranges
//!
//! | Code | Domain    | Description                                   |
//! |------|-----------|-----------------------------------------------|
//! | 0    | Universal | Success                                       |
//! | 1    | Universal | General error (unspecified)                   |
//! | 2    | Universal | CLI usage error (bad args)                    |
//! | 10   | config    | Config parse or validation failure            |
//! | 11   | data      | Ledger schema or data type failure            |
//! | 12   | data      | Aggregate length mismatch in strict alignment |
//! | 13   | io        | Ledger import failure                         |
//! | 14   | io        | Workbook export failure                       |

use parkrecon_engine::error::ReconError;

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, unsupported flag combination.
pub const EXIT_USAGE: u8 = 2;

/// Config file failed to parse or validate.
pub const EXIT_CONFIG: u8 = 10;

/// A ledger is missing a configured column, the amount ordinal is out of
/// range, or a summed column mixes text and numbers.
pub const EXIT_SCHEMA: u8 = 11;

/// Aggregates have different lengths and alignment is strict.
pub const EXIT_ALIGNMENT: u8 = 12;

/// Ledger file could not be read or exceeded an import ceiling.
pub const EXIT_IMPORT: u8 = 13;

/// Result workbook could not be written.
pub const EXIT_EXPORT: u8 = 14;

/// Map an engine error to its exit code. `ReconError::Io` carries no phase,
/// so the caller says whether it happened on the import or the export side.
pub fn recon_exit_code(err: &ReconError, io_code: u8) -> u8 {
    match err {
        ReconError::ConfigParse(_) | ReconError::ConfigValidation(_) => EXIT_CONFIG,
        ReconError::MissingColumn { .. }
        | ReconError::AmountIndexOutOfRange { .. }
        | ReconError::NonNumeric { .. } => EXIT_SCHEMA,
        ReconError::LengthMismatch { .. } => EXIT_ALIGNMENT,
        ReconError::Io(_) => io_code,
    }
}
