// parkrecon CLI - ledger reconciliation from the shell

mod exit_codes;
mod report;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use exit_codes::{recon_exit_code, EXIT_CONFIG, EXIT_ERROR, EXIT_SUCCESS, EXIT_USAGE};
use parkrecon_engine::error::ReconError;

#[derive(Parser)]
#[command(name = "parkrecon")]
#[command(about = "Reconcile a parking ledger against its settlement ledger")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile both ledgers and write the comparison workbook
    #[command(after_help = "\
Examples:
  parkrecon run --config report.toml
  parkrecon run --config report.toml --output /tmp/august.xlsx
  parkrecon run --parking parking.xlsx --settlement settlement.xlsx
  parkrecon run --config report.toml --json | jq .summary
  parkrecon run --config report.toml --report report.json --quiet")]
    Run {
        /// Report config (TOML). Built-in defaults apply when omitted.
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,

        /// Parking ledger file, overriding the config
        #[arg(long)]
        parking: Option<PathBuf>,

        /// Settlement ledger file, overriding the config
        #[arg(long)]
        settlement: Option<PathBuf>,

        /// Destination workbook (default: <name>.xlsx next to the config)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Print the full report as JSON to stdout
        #[arg(long)]
        json: bool,

        /// Also write the JSON report to a file
        #[arg(long, value_name = "FILE")]
        report: Option<PathBuf>,

        /// Suppress stderr summary and warnings
        #[arg(long, short = 'q')]
        quiet: bool,
    },

    /// Check a config file without reading any ledger
    Validate {
        /// Report config (TOML)
        config: PathBuf,
    },

    /// List the sheets and column headers of a ledger file
    #[command(after_help = "\
Examples:
  parkrecon inspect parking.xlsx
  parkrecon inspect parking.xlsx --sheet NCMCParkingDB
  parkrecon inspect settlement.csv --json")]
    Inspect {
        /// Ledger file (xlsx, xls, ods, csv, tsv)
        file: PathBuf,

        /// Sheet to read headers from (workbooks only; default: first)
        #[arg(long)]
        sheet: Option<String>,

        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            config,
            parking,
            settlement,
            output,
            json,
            report: report_out,
            quiet,
        } => report::cmd_run(config, parking, settlement, output, json, report_out, quiet),
        Commands::Validate { config } => report::cmd_validate(&config),
        Commands::Inspect { file, sheet, json } => {
            report::cmd_inspect(&file, sheet.as_deref(), json)
        }
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn usage(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self { code: EXIT_CONFIG, message: msg.into(), hint: None }
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self { code: EXIT_ERROR, message: msg.into(), hint: None }
    }

    /// Engine error from the import phase.
    pub fn import(err: ReconError) -> Self {
        let code = recon_exit_code(&err, exit_codes::EXIT_IMPORT);
        Self { code, message: err.to_string(), hint: recon_hint(&err) }
    }

    /// Engine error from the reconciliation itself.
    pub fn engine(err: ReconError) -> Self {
        let code = recon_exit_code(&err, EXIT_ERROR);
        Self { code, message: err.to_string(), hint: recon_hint(&err) }
    }

    /// Engine error from the export phase.
    pub fn export(err: ReconError) -> Self {
        let code = recon_exit_code(&err, exit_codes::EXIT_EXPORT);
        Self { code, message: err.to_string(), hint: recon_hint(&err) }
    }
}

fn recon_hint(err: &ReconError) -> Option<String> {
    match err {
        ReconError::MissingColumn { ledger, .. } => Some(format!(
            "run 'parkrecon inspect' on the {ledger} file to list its headers"
        )),
        ReconError::NonNumeric { .. } => Some(
            "a summed column mixes text and numbers; clean the cell or point \
             amount_column at a different ordinal"
                .to_string(),
        ),
        _ => None,
    }
}
