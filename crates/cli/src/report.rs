// run / validate / inspect commands.

use std::path::{Path, PathBuf};

use parkrecon_engine::config::ReportConfig;
use parkrecon_engine::engine;
use parkrecon_engine::error::ReconError;
use parkrecon_io::{inspect_workbook, load_ledger, write_workbook, ImportedLedger};

use crate::CliError;

pub fn cmd_run(
    config_path: Option<PathBuf>,
    parking_flag: Option<PathBuf>,
    settlement_flag: Option<PathBuf>,
    output_flag: Option<PathBuf>,
    json: bool,
    report_out: Option<PathBuf>,
    quiet: bool,
) -> Result<(), CliError> {
    let (config, base) = load_config(config_path.as_deref())?;

    let parking_path = ledger_path(&base, parking_flag, &config.parking.file);
    let settlement_path = ledger_path(&base, settlement_flag, &config.settlement.file);

    let parking = import(&parking_path, config.parking.sheet.as_deref(), quiet)?;
    let settlement = import(&settlement_path, config.settlement.sheet.as_deref(), quiet)?;

    let report = engine::run(&config, &parking.table, &settlement.table)
        .map_err(CliError::engine)?;

    let output_path = match output_flag {
        Some(path) => path,
        None => base.join(format!("{}.xlsx", config.name)),
    };
    write_workbook(&report, &config, &output_path).map_err(CliError::export)?;

    if json || report_out.is_some() {
        let body = serde_json::to_string_pretty(&report)
            .map_err(|e| CliError::internal(format!("cannot serialize report: {e}")))?;
        if let Some(path) = &report_out {
            std::fs::write(path, &body).map_err(|e| {
                CliError::export(ReconError::Io(format!("cannot write {}: {e}", path.display())))
            })?;
        }
        if json {
            println!("{body}");
        }
    }

    if !quiet {
        let s = &report.summary;
        eprintln!("parking: {} rows -> {} groups", s.rows_a, s.groups_a);
        eprintln!("settlement: {} rows -> {} groups", s.rows_b, s.groups_b);
        eprintln!(
            "compared {} rows: {} over, {} under, {} matched, {} undefined, {} missing cells",
            s.combined_rows, s.positive, s.negative, s.zero, s.undefined, s.missing_cells
        );
        eprintln!("wrote {}", output_path.display());
    }

    Ok(())
}

pub fn cmd_validate(path: &Path) -> Result<(), CliError> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| CliError::config(format!("cannot read {}: {e}", path.display())))?;
    let config = ReportConfig::from_toml(&contents).map_err(|e| CliError::config(e.to_string()))?;

    println!("config ok: {}", config.name);
    println!(
        "  parking:    {} (sheet '{}'), amount column {}",
        config.parking.file,
        config.parking_sheet(),
        config.parking.amount_column
    );
    println!(
        "  settlement: {} (sheet '{}'), amount column {}",
        config.settlement.file,
        config.settlement_sheet(),
        config.settlement.amount_column
    );
    println!(
        "  comparison: sheet '{}', alignment {}",
        config.comparison.sheet, config.comparison.alignment
    );
    Ok(())
}

pub fn cmd_inspect(file: &Path, sheet: Option<&str>, json: bool) -> Result<(), CliError> {
    let workbook = !is_delimited(file);
    if !workbook && sheet.is_some() {
        return Err(CliError::usage(
            "--sheet is not supported for single-sheet formats",
        ));
    }

    let outline = if workbook {
        Some(inspect_workbook(file).map_err(CliError::import)?)
    } else {
        None
    };
    let imported = load_ledger(file, sheet).map_err(CliError::import)?;

    if json {
        let sheets: Vec<serde_json::Value> = outline
            .iter()
            .flat_map(|o| &o.sheets)
            .map(|s| serde_json::json!({ "name": s.name, "rows": s.rows, "cols": s.cols }))
            .collect();
        let body = serde_json::json!({
            "file": file.display().to_string(),
            "sheets": sheets,
            "sheet": imported.sheet,
            "headers": imported.table.columns,
            "rows": imported.table.rows.len(),
        });
        let rendered = serde_json::to_string_pretty(&body)
            .map_err(|e| CliError::internal(format!("cannot serialize outline: {e}")))?;
        println!("{rendered}");
    } else {
        if let Some(outline) = &outline {
            println!("sheets:");
            for s in &outline.sheets {
                println!("  {}  {} rows x {} cols", s.name, s.rows, s.cols);
            }
        }
        match &imported.sheet {
            Some(name) => println!("headers of '{name}':"),
            None => println!("headers:"),
        }
        for (i, name) in imported.table.columns.iter().enumerate() {
            println!("  {i:>3}  {name}");
        }
        println!("{} data rows", imported.table.rows.len());
    }

    for w in &imported.warnings {
        eprintln!("warning: {w}");
    }
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<(ReportConfig, PathBuf), CliError> {
    match path {
        Some(path) => {
            let contents = std::fs::read_to_string(path)
                .map_err(|e| CliError::config(format!("cannot read {}: {e}", path.display())))?;
            let config =
                ReportConfig::from_toml(&contents).map_err(|e| CliError::config(e.to_string()))?;
            let base = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from("."));
            Ok((config, base))
        }
        None => Ok((ReportConfig::default(), PathBuf::from("."))),
    }
}

/// Flag wins as typed; configured paths resolve relative to the config file.
fn ledger_path(base: &Path, flag: Option<PathBuf>, configured: &str) -> PathBuf {
    match flag {
        Some(path) => path,
        None => {
            let path = Path::new(configured);
            if path.is_absolute() {
                path.to_path_buf()
            } else {
                base.join(path)
            }
        }
    }
}

fn import(path: &Path, sheet: Option<&str>, quiet: bool) -> Result<ImportedLedger, CliError> {
    let imported = load_ledger(path, sheet).map_err(CliError::import)?;
    if !quiet {
        for w in &imported.warnings {
            eprintln!("warning: {w}");
        }
    }
    Ok(imported)
}

fn is_delimited(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some(ext) if ext.eq_ignore_ascii_case("csv") || ext.eq_ignore_ascii_case("tsv")
    )
}
