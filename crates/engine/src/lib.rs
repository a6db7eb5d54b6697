//! Parking/settlement ledger reconciliation engine.
//!
//! Pure engine crate: receives pre-loaded ledger tables, returns the combined
//! comparison with per-cell classifications. No CLI or IO dependencies.

pub mod aggregate;
pub mod classify;
pub mod combine;
pub mod config;
pub mod engine;
pub mod error;
pub mod model;

pub use config::ReportConfig;
pub use engine::run;
pub use error::ReconError;
pub use model::{LedgerTable, ReconReport};
