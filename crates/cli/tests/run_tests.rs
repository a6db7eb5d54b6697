// Integration tests for `parkrecon run` / `validate` / `inspect`.
// Run with: cargo test -p parkrecon-cli --test run_tests -- --nocapture

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use parkrecon_engine::model::Cell;
use parkrecon_io::xlsx::import_ledger;

fn parkrecon() -> Command {
    Command::new(env!("CARGO_BIN_EXE_parkrecon"))
}

// ---------------------------------------------------------------------------
// Fixtures: two small CSV ledgers plus a config next to them
// ---------------------------------------------------------------------------

const CONFIG: &str = r#"
name = "august"

[parking]
file = "parking.csv"
name_column = "Name"
terminal_column = "Terminal_id"
amount_column = 2

[settlement]
file = "settlement.csv"
name_column = "Merchant Name"
terminal_column = "Terminal ID"
amount_column = 2

[comparison]
alignment = "strict"
"#;

fn write_ledgers(dir: &Path) {
    fs::write(
        dir.join("parking.csv"),
        "Name,Terminal_id,NCMC_SVP_Amt\nAlice,T1,60\nAlice,T1,40\nBob,T2,50\n",
    )
    .unwrap();
    fs::write(
        dir.join("settlement.csv"),
        "Merchant Name,Terminal ID,Settlement Amount\nAlice,T1,80\nBob,T2,70\n",
    )
    .unwrap();
}

fn write_config(dir: &Path) -> PathBuf {
    let path = dir.join("report.toml");
    fs::write(&path, CONFIG).unwrap();
    path
}

// ---------------------------------------------------------------------------
// run
// ---------------------------------------------------------------------------

#[test]
fn run_writes_the_workbook_next_to_the_config() {
    let dir = tempfile::tempdir().unwrap();
    write_ledgers(dir.path());
    let config = write_config(dir.path());

    let output = parkrecon()
        .args(["run", "--config", config.to_str().unwrap()])
        .output()
        .expect("parkrecon run");
    assert!(
        output.status.success(),
        "exit was {:?}, stderr: {}",
        output.status,
        String::from_utf8_lossy(&output.stderr)
    );

    let result = dir.path().join("august.xlsx");
    assert!(result.exists(), "august.xlsx missing next to the config");

    // Alice 100 vs 80 -> +20, Bob 50 vs 70 -> -20, totals two rows below.
    let comparison = import_ledger(&result, Some("Comparison")).unwrap();
    let rows = &comparison.table.rows;
    assert_eq!(rows.len(), 4);
    assert_eq!(rows[0][9], Cell::Number(20.0));
    assert_eq!(rows[1][9], Cell::Number(-20.0));
    assert!(rows[2].iter().all(|c| c.is_blank()));
    assert_eq!(rows[3][2], Cell::Number(150.0));
    assert_eq!(rows[3][7], Cell::Number(150.0));
    assert_eq!(rows[3][9], Cell::Number(0.0));

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("parking: 3 rows -> 2 groups"), "stderr: {stderr}");
    assert!(stderr.contains("1 over, 1 under"), "stderr: {stderr}");
}

#[test]
fn run_emits_the_report_as_json() {
    let dir = tempfile::tempdir().unwrap();
    write_ledgers(dir.path());
    let config = write_config(dir.path());

    let output = parkrecon()
        .args(["run", "--config", config.to_str().unwrap(), "--json", "--quiet"])
        .output()
        .expect("parkrecon run --json");
    assert!(output.status.success());

    // --quiet keeps stderr clear for pipelines.
    assert!(output.stderr.is_empty());

    let report: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("valid JSON report");
    assert_eq!(report["meta"]["config_name"], "august");
    assert_eq!(report["summary"]["combined_rows"], 2);
    assert_eq!(report["summary"]["positive"], 1);
    assert_eq!(report["summary"]["negative"], 1);
    assert_eq!(report["totals"]["variance"], 0.0);
}

#[test]
fn run_writes_the_report_file() {
    let dir = tempfile::tempdir().unwrap();
    write_ledgers(dir.path());
    let config = write_config(dir.path());
    let report_path = dir.path().join("report.json");

    let output = parkrecon()
        .args([
            "run",
            "--config",
            config.to_str().unwrap(),
            "--report",
            report_path.to_str().unwrap(),
            "--quiet",
        ])
        .output()
        .expect("parkrecon run --report");
    assert!(output.status.success());
    assert!(output.stdout.is_empty(), "no --json, stdout stays clear");

    let body = fs::read_to_string(&report_path).unwrap();
    let report: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(report["summary"]["combined_rows"], 2);
}

#[test]
fn run_reads_workbook_ledgers() {
    let dir = tempfile::tempdir().unwrap();
    write_ledgers(dir.path());

    // Replace the parking CSV with a real workbook.
    let mut workbook = rust_xlsxwriter::Workbook::new();
    let sheet = workbook.add_worksheet().set_name("NCMCParkingDB").unwrap();
    sheet.write_string(0, 0, "Name").unwrap();
    sheet.write_string(0, 1, "Terminal_id").unwrap();
    sheet.write_string(0, 2, "NCMC_SVP_Amt").unwrap();
    sheet.write_string(1, 0, "Alice").unwrap();
    sheet.write_string(1, 1, "T1").unwrap();
    sheet.write_number(1, 2, 100.0).unwrap();
    sheet.write_string(2, 0, "Bob").unwrap();
    sheet.write_string(2, 1, "T2").unwrap();
    sheet.write_number(2, 2, 50.0).unwrap();
    workbook.save(dir.path().join("parking.xlsx")).unwrap();

    let config_path = dir.path().join("report.toml");
    let config = CONFIG.replace("file = \"parking.csv\"", "file = \"parking.xlsx\"").replace(
        "[parking]",
        "[parking]\nsheet = \"NCMCParkingDB\"",
    );
    fs::write(&config_path, config).unwrap();

    let output = parkrecon()
        .args(["run", "--config", config_path.to_str().unwrap(), "--quiet"])
        .output()
        .expect("parkrecon run");
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let comparison = import_ledger(&dir.path().join("august.xlsx"), Some("Comparison")).unwrap();
    assert_eq!(comparison.table.rows[0][9], Cell::Number(20.0));
}

#[test]
fn run_missing_ledger_exits_13() {
    let dir = tempfile::tempdir().unwrap();
    write_ledgers(dir.path());
    fs::remove_file(dir.path().join("parking.csv")).unwrap();
    let config = write_config(dir.path());

    let output = parkrecon()
        .args(["run", "--config", config.to_str().unwrap()])
        .output()
        .expect("parkrecon run");
    assert_eq!(output.status.code(), Some(13));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("error:"), "stderr: {stderr}");
}

#[test]
fn strict_length_mismatch_exits_12() {
    let dir = tempfile::tempdir().unwrap();
    write_ledgers(dir.path());
    fs::write(
        dir.path().join("settlement.csv"),
        "Merchant Name,Terminal ID,Settlement Amount\nAlice,T1,80\n",
    )
    .unwrap();
    let config = write_config(dir.path());

    let output = parkrecon()
        .args(["run", "--config", config.to_str().unwrap()])
        .output()
        .expect("parkrecon run");
    assert_eq!(output.status.code(), Some(12));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("pad"), "stderr should suggest pad: {stderr}");

    // No partial workbook left behind.
    assert!(!dir.path().join("august.xlsx").exists());
}

#[test]
fn missing_identity_column_exits_11_with_hint() {
    let dir = tempfile::tempdir().unwrap();
    write_ledgers(dir.path());
    let config_path = dir.path().join("report.toml");
    let broken = CONFIG.replace("name_column = \"Name\"", "name_column = \"Nmae\"");
    fs::write(&config_path, broken).unwrap();

    let output = parkrecon()
        .args(["run", "--config", config_path.to_str().unwrap()])
        .output()
        .expect("parkrecon run");
    assert_eq!(output.status.code(), Some(11));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("missing column 'Nmae'"), "stderr: {stderr}");
    assert!(stderr.contains("hint:"), "stderr: {stderr}");
}

// ---------------------------------------------------------------------------
// validate
// ---------------------------------------------------------------------------

#[test]
fn validate_accepts_a_good_config() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path());

    let output = parkrecon()
        .args(["validate", config.to_str().unwrap()])
        .output()
        .expect("parkrecon validate");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("config ok: august"), "stdout: {stdout}");
    assert!(stdout.contains("alignment strict"), "stdout: {stdout}");
}

#[test]
fn validate_rejects_amount_column_below_two() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("report.toml");
    fs::write(
        &config_path,
        CONFIG.replacen("amount_column = 2", "amount_column = 1", 1),
    )
    .unwrap();

    let output = parkrecon()
        .args(["validate", config_path.to_str().unwrap()])
        .output()
        .expect("parkrecon validate");
    assert_eq!(output.status.code(), Some(10));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("amount_column must be at least 2"),
        "stderr: {stderr}"
    );
}

// ---------------------------------------------------------------------------
// inspect
// ---------------------------------------------------------------------------

#[test]
fn inspect_lists_csv_headers_with_ordinals() {
    let dir = tempfile::tempdir().unwrap();
    write_ledgers(dir.path());

    let output = parkrecon()
        .args(["inspect", dir.path().join("parking.csv").to_str().unwrap()])
        .output()
        .expect("parkrecon inspect");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("0  Name"), "stdout: {stdout}");
    assert!(stdout.contains("2  NCMC_SVP_Amt"), "stdout: {stdout}");
    assert!(stdout.contains("3 data rows"), "stdout: {stdout}");
}

#[test]
fn inspect_json_lists_sheets_and_headers() {
    let dir = tempfile::tempdir().unwrap();
    write_ledgers(dir.path());
    let config = write_config(dir.path());

    // Produce a workbook to inspect.
    let run = parkrecon()
        .args(["run", "--config", config.to_str().unwrap(), "--quiet"])
        .output()
        .expect("parkrecon run");
    assert!(run.status.success());

    let output = parkrecon()
        .args([
            "inspect",
            dir.path().join("august.xlsx").to_str().unwrap(),
            "--sheet",
            "Comparison",
            "--json",
        ])
        .output()
        .expect("parkrecon inspect --json");
    assert!(output.status.success());

    let body: serde_json::Value = serde_json::from_slice(&output.stdout).expect("valid JSON");
    assert_eq!(body["sheets"].as_array().unwrap().len(), 3);
    assert_eq!(body["sheet"], "Comparison");
    let headers = body["headers"].as_array().unwrap();
    assert_eq!(headers.len(), 10);
    assert_eq!(headers[9], "Difference");
}

#[test]
fn inspect_sheet_flag_errors_on_csv() {
    let dir = tempfile::tempdir().unwrap();
    write_ledgers(dir.path());

    let output = parkrecon()
        .args([
            "inspect",
            dir.path().join("parking.csv").to_str().unwrap(),
            "--sheet",
            "Sheet1",
        ])
        .output()
        .expect("parkrecon inspect --sheet");
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("not supported for single-sheet"),
        "stderr: {stderr}"
    );
}
