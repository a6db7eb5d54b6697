// Workbook import (xlsx, xls, xlsb, ods via calamine) and report export
// (xlsx only).
//
// Import is one-way: whatever calamine reads becomes untyped `Cell`s, with
// the first used row taken as the header. Export assembles the whole three
// sheet report in memory and saves once, so a failed run leaves no partial
// artifact behind.

use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};
use rust_xlsxwriter::{Color, Format, Workbook, Worksheet, XlsxError};

use parkrecon_engine::config::ReportConfig;
use parkrecon_engine::error::ReconError;
use parkrecon_engine::model::{
    AggregateTable, Amount, Cell, CellClass, ClassMap, LedgerTable, ReconReport, COL_AMOUNT_A,
    COL_AMOUNT_B, COL_NAME_A, COL_NAME_B, COL_TERMINAL_A, COL_TERMINAL_B, COL_VARIANCE,
};

use crate::{check_caps, header_name, warn_duplicate_headers, ImportedLedger};

// ---------------------------------------------------------------------------
// Import
// ---------------------------------------------------------------------------

/// Import one sheet of a workbook as a ledger. `sheet` of `None` reads the
/// first sheet.
pub fn import_ledger(path: &Path, sheet: Option<&str>) -> Result<ImportedLedger, ReconError> {
    let mut workbook = open_workbook_auto(path)
        .map_err(|e| ReconError::Io(format!("cannot open {}: {e}", path.display())))?;

    let sheet_names: Vec<String> = workbook.sheet_names().to_vec();
    if sheet_names.is_empty() {
        return Err(ReconError::Io(format!(
            "{} contains no sheets",
            path.display()
        )));
    }

    let sheet_name = match sheet {
        Some(name) => {
            if !sheet_names.iter().any(|s| s == name) {
                return Err(ReconError::Io(format!(
                    "{} has no sheet '{name}' (found: {})",
                    path.display(),
                    sheet_names.join(", ")
                )));
            }
            name.to_string()
        }
        None => sheet_names[0].clone(),
    };

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| ReconError::Io(format!("cannot read sheet '{sheet_name}': {e}")))?;

    let (height, width) = range.get_size();
    let source = format!("sheet '{sheet_name}'");
    check_caps(&source, height, width)?;
    if height == 0 || width == 0 {
        return Err(ReconError::Io(format!("{source} is empty")));
    }

    let mut warnings = Vec::new();
    let mut rows_iter = range.rows();
    let header = rows_iter.next().unwrap_or(&[]);
    let columns: Vec<String> = header
        .iter()
        .enumerate()
        .map(|(col, data)| header_name(&source, col, &data_to_cell(data), &mut warnings))
        .collect();
    warn_duplicate_headers(&source, &columns, &mut warnings);

    let mut rows = Vec::with_capacity(height.saturating_sub(1));
    for row in rows_iter {
        let mut cells: Vec<Cell> = row.iter().map(data_to_cell).collect();
        cells.resize(width, Cell::Empty);
        rows.push(cells);
    }

    Ok(ImportedLedger {
        table: LedgerTable { columns, rows },
        sheet: Some(sheet_name),
        warnings,
    })
}

fn data_to_cell(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        Data::String(s) => {
            if s.is_empty() {
                Cell::Empty
            } else {
                Cell::Text(s.clone())
            }
        }
        Data::Float(n) => Cell::Number(*n),
        Data::Int(n) => Cell::Number(*n as f64),
        Data::Bool(b) => Cell::Text(if *b { "TRUE" } else { "FALSE" }.to_string()),
        Data::Error(e) => Cell::Text(format!("#{e:?}")),
        // Dates and times keep their serial value so numeric columns stay
        // summable.
        Data::DateTime(dt) => Cell::Number(dt.as_f64()),
        Data::DateTimeIso(s) => Cell::Text(s.clone()),
        Data::DurationIso(s) => Cell::Text(s.clone()),
    }
}

// ---------------------------------------------------------------------------
// Inspect
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct WorkbookOutline {
    pub sheets: Vec<SheetOutline>,
}

#[derive(Debug)]
pub struct SheetOutline {
    pub name: String,
    pub rows: usize,
    pub cols: usize,
}

/// List every sheet of a workbook with its used dimensions.
pub fn inspect_workbook(path: &Path) -> Result<WorkbookOutline, ReconError> {
    let mut workbook = open_workbook_auto(path)
        .map_err(|e| ReconError::Io(format!("cannot open {}: {e}", path.display())))?;

    let sheet_names: Vec<String> = workbook.sheet_names().to_vec();
    let mut sheets = Vec::with_capacity(sheet_names.len());
    for name in &sheet_names {
        let range = workbook
            .worksheet_range(name)
            .map_err(|e| ReconError::Io(format!("cannot read sheet '{name}': {e}")))?;
        let (rows, cols) = range.get_size();
        sheets.push(SheetOutline {
            name: name.clone(),
            rows,
            cols,
        });
    }
    Ok(WorkbookOutline { sheets })
}

// ---------------------------------------------------------------------------
// Export
// ---------------------------------------------------------------------------

const FILL_POSITIVE: u32 = 0x00FF00;
const FILL_NEGATIVE: u32 = 0xFF0000;
const FILL_MISSING: u32 = 0xD3D3D3;

const WIDTH_NAME: f64 = 24.0;
const WIDTH_TERMINAL: f64 = 14.0;
const WIDTH_AMOUNT: f64 = 14.0;

struct SheetFormats {
    header: Format,
    amount: Format,
    totals: Format,
    positive: Format,
    negative: Format,
    missing: Format,
}

impl SheetFormats {
    fn new() -> Self {
        Self {
            header: Format::new().set_bold(),
            amount: Format::new().set_num_format("0.00"),
            totals: Format::new().set_bold().set_num_format("0.00"),
            positive: Format::new()
                .set_num_format("0.00")
                .set_background_color(Color::RGB(FILL_POSITIVE)),
            negative: Format::new()
                .set_num_format("0.00")
                .set_background_color(Color::RGB(FILL_NEGATIVE)),
            missing: Format::new().set_background_color(Color::RGB(FILL_MISSING)),
        }
    }
}

/// Write the three-sheet report workbook: both aggregates, then the
/// comparison with its totals trailer and classification fills.
///
/// Overwrites whatever exists at `path`. The workbook is assembled fully in
/// memory and saved once.
pub fn write_workbook(
    report: &ReconReport,
    config: &ReportConfig,
    path: &Path,
) -> Result<(), ReconError> {
    let formats = SheetFormats::new();
    let mut workbook = Workbook::new();

    write_aggregate_sheet(
        &mut workbook,
        config.parking_sheet(),
        &report.aggregate_a,
        &formats,
    )?;
    write_aggregate_sheet(
        &mut workbook,
        config.settlement_sheet(),
        &report.aggregate_b,
        &formats,
    )?;
    write_comparison_sheet(&mut workbook, &config.comparison.sheet, report, &formats)?;

    // Comparison opens as the active sheet.
    if let Ok(sheet) = workbook.worksheet_from_index(2) {
        let _ = sheet.set_active(true);
    }

    workbook
        .save(path)
        .map_err(|e| ReconError::Io(format!("cannot write {}: {e}", path.display())))?;
    Ok(())
}

fn write_aggregate_sheet(
    workbook: &mut Workbook,
    name: &str,
    table: &AggregateTable,
    formats: &SheetFormats,
) -> Result<(), ReconError> {
    let sheet = named_sheet(workbook, name)?;

    for (col, label) in table.columns.iter().enumerate() {
        sheet
            .write_string_with_format(0, col as u16, label, &formats.header)
            .map_err(|e| sheet_error(name, e))?;
    }

    for (row_idx, row) in table.rows.iter().enumerate() {
        let target = row_idx as u32 + 1;
        for (col, cell) in row.iter().enumerate() {
            // Identity pair as-is, summed columns in amount format.
            let format = if col >= 2 { Some(&formats.amount) } else { None };
            write_cell(sheet, target, col as u16, cell, format).map_err(|e| sheet_error(name, e))?;
        }
    }

    sheet
        .set_column_width(0, WIDTH_NAME)
        .and_then(|s| s.set_column_width(1, WIDTH_TERMINAL))
        .map_err(|e| sheet_error(name, e))?;
    Ok(())
}

fn write_comparison_sheet(
    workbook: &mut Workbook,
    name: &str,
    report: &ReconReport,
    formats: &SheetFormats,
) -> Result<(), ReconError> {
    let sheet = named_sheet(workbook, name)?;
    let combined = &report.combined;
    let classes = &report.classes;

    for (col, label) in combined.columns.iter().enumerate() {
        sheet
            .write_string_with_format(0, col as u16, label, &formats.header)
            .map_err(|e| sheet_error(name, e))?;
    }

    for (row_idx, row) in combined.rows.iter().enumerate() {
        let target = row_idx as u32 + 1;
        let identity = [
            (COL_NAME_A, &row.name_a),
            (COL_TERMINAL_A, &row.terminal_a),
            (COL_NAME_B, &row.name_b),
            (COL_TERMINAL_B, &row.terminal_b),
        ];
        for (col, cell) in identity {
            write_marked_cell(sheet, target, row_idx, col, cell, classes, formats)
                .map_err(|e| sheet_error(name, e))?;
        }

        write_amount(sheet, target, row_idx, COL_AMOUNT_A, row.amount_a, classes, formats)
            .map_err(|e| sheet_error(name, e))?;
        write_amount(sheet, target, row_idx, COL_AMOUNT_B, row.amount_b, classes, formats)
            .map_err(|e| sheet_error(name, e))?;
        write_variance(sheet, target, row_idx, row.variance, classes, formats)
            .map_err(|e| sheet_error(name, e))?;
    }

    // Grand totals two rows below the last data row, one blank row between.
    let totals_row = combined.rows.len() as u32 + 2;
    let totals = [
        (COL_AMOUNT_A, report.totals.amount_a),
        (COL_AMOUNT_B, report.totals.amount_b),
        (COL_VARIANCE, report.totals.variance),
    ];
    for (col, value) in totals {
        sheet
            .write_number_with_format(totals_row, col as u16, value, &formats.totals)
            .map_err(|e| sheet_error(name, e))?;
    }

    for col in [COL_NAME_A, COL_NAME_B] {
        sheet
            .set_column_width(col as u16, WIDTH_NAME)
            .map_err(|e| sheet_error(name, e))?;
    }
    for col in [COL_TERMINAL_A, COL_TERMINAL_B, COL_AMOUNT_A, COL_AMOUNT_B, COL_VARIANCE] {
        sheet
            .set_column_width(col as u16, WIDTH_AMOUNT)
            .map_err(|e| sheet_error(name, e))?;
    }
    Ok(())
}

fn named_sheet<'a>(
    workbook: &'a mut Workbook,
    name: &str,
) -> Result<&'a mut Worksheet, ReconError> {
    workbook
        .add_worksheet()
        .set_name(name)
        .map_err(|e| ReconError::Io(format!("cannot create sheet '{name}': {e}")))
}

fn sheet_error(name: &str, e: XlsxError) -> ReconError {
    ReconError::Io(format!("sheet '{name}': {e}"))
}

fn write_cell(
    sheet: &mut Worksheet,
    row: u32,
    col: u16,
    cell: &Cell,
    format: Option<&Format>,
) -> Result<(), XlsxError> {
    match (cell, format) {
        (Cell::Text(s), Some(f)) => {
            sheet.write_string_with_format(row, col, s, f)?;
        }
        (Cell::Text(s), None) => {
            sheet.write_string(row, col, s)?;
        }
        (Cell::Number(n), Some(f)) => {
            sheet.write_number_with_format(row, col, *n, f)?;
        }
        (Cell::Number(n), None) => {
            sheet.write_number(row, col, *n)?;
        }
        (Cell::Empty, _) => {}
    }
    Ok(())
}

fn write_marked_cell(
    sheet: &mut Worksheet,
    row: u32,
    row_idx: usize,
    col: usize,
    cell: &Cell,
    classes: &ClassMap,
    formats: &SheetFormats,
) -> Result<(), XlsxError> {
    if classes.get(row_idx, col) == Some(CellClass::Missing) {
        sheet.write_blank(row, col as u16, &formats.missing)?;
        return Ok(());
    }
    write_cell(sheet, row, col as u16, cell, None)
}

fn write_amount(
    sheet: &mut Worksheet,
    row: u32,
    row_idx: usize,
    col: usize,
    amount: Amount,
    classes: &ClassMap,
    formats: &SheetFormats,
) -> Result<(), XlsxError> {
    match (amount, classes.get(row_idx, col)) {
        (Amount::Number(n), _) => {
            sheet.write_number_with_format(row, col as u16, n, &formats.amount)?;
        }
        (Amount::Absent, Some(CellClass::Missing)) => {
            sheet.write_blank(row, col as u16, &formats.missing)?;
        }
        (Amount::Absent, _) => {}
    }
    Ok(())
}

fn write_variance(
    sheet: &mut Worksheet,
    row: u32,
    row_idx: usize,
    variance: Amount,
    classes: &ClassMap,
    formats: &SheetFormats,
) -> Result<(), XlsxError> {
    let col = COL_VARIANCE as u16;
    match (variance, classes.get(row_idx, COL_VARIANCE)) {
        (Amount::Number(n), Some(CellClass::Positive)) => {
            sheet.write_number_with_format(row, col, n, &formats.positive)?;
        }
        (Amount::Number(n), Some(CellClass::Negative)) => {
            sheet.write_number_with_format(row, col, n, &formats.negative)?;
        }
        // A zero variance is written plain; no fill by contract.
        (Amount::Number(n), _) => {
            sheet.write_number_with_format(row, col, n, &formats.amount)?;
        }
        // Undefined variance leaves the cell unwritten and unfilled.
        (Amount::Absent, _) => {}
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use parkrecon_engine::engine::run;

    fn text(s: &str) -> Cell {
        Cell::Text(s.into())
    }

    fn num(n: f64) -> Cell {
        Cell::Number(n)
    }

    fn ledger(columns: &[&str], rows: Vec<Vec<Cell>>) -> LedgerTable {
        LedgerTable {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows,
        }
    }

    fn sample() -> (ReportConfig, ReconReport) {
        let mut config = ReportConfig::default();
        config.parking.amount_column = 2;
        config.settlement.amount_column = 2;

        let parking = ledger(
            &["Name", "Terminal_id", "NCMC_SVP_Amt"],
            vec![
                vec![text("Alice"), text("T1"), num(100.0)],
                vec![text("Bob"), text("T2"), num(50.0)],
                vec![text("Cara"), text("T3"), text("n/a")],
            ],
        );
        let settlement = ledger(
            &["Merchant Name", "Terminal ID", "Settlement Amount"],
            vec![
                vec![text("Alice"), text("T1"), num(80.0)],
                vec![text("Bob"), text("T2"), num(70.0)],
                vec![text("Cara"), text("T3"), num(30.0)],
            ],
        );
        let report = run(&config, &parking, &settlement).unwrap();
        (config, report)
    }

    #[test]
    fn exported_workbook_round_trips_through_import() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("result.xlsx");
        let (config, report) = sample();

        write_workbook(&report, &config, &path).unwrap();
        let metadata = std::fs::metadata(&path).unwrap();
        assert!(metadata.len() > 100);

        let outline = inspect_workbook(&path).unwrap();
        let names: Vec<&str> = outline.sheets.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["NCMCParkingDB", "NCMC-ParkingSettlement", "Comparison"]
        );

        let imported = import_ledger(&path, Some("Comparison")).unwrap();
        assert_eq!(imported.table.columns, report.combined.columns);
        assert_eq!(imported.table.columns[3], "   ");
        assert_eq!(imported.table.columns[9], "Difference");

        // 3 data rows, one blank spacer row, then the totals trailer.
        let rows = &imported.table.rows;
        assert_eq!(rows.len(), 5);
        assert_eq!(rows[0][0], text("Alice"));
        assert_eq!(rows[0][2], num(100.0));
        assert_eq!(rows[0][9], num(20.0));
        assert_eq!(rows[1][9], num(-20.0));

        // Cara's unreadable amount came through blank, her variance unwritten.
        assert_eq!(rows[2][2], Cell::Empty);
        assert_eq!(rows[2][9], Cell::Empty);

        assert!(rows[3].iter().all(|c| c.is_blank()));
        assert_eq!(rows[4][2], num(150.0));
        assert_eq!(rows[4][7], num(180.0));
        assert_eq!(rows[4][9], num(0.0));
    }

    #[test]
    fn aggregate_sheets_carry_the_summed_tables() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("result.xlsx");
        let (config, report) = sample();
        write_workbook(&report, &config, &path).unwrap();

        let imported = import_ledger(&path, Some("NCMCParkingDB")).unwrap();
        assert_eq!(imported.sheet.as_deref(), Some("NCMCParkingDB"));
        assert_eq!(
            imported.table.columns,
            vec!["Name", "Terminal_id", "NCMC_SVP_Amt"]
        );
        assert_eq!(imported.table.rows.len(), 3);
        assert_eq!(imported.table.rows[0][2], num(100.0));
        // Cara's group had no readable amount at all.
        assert_eq!(imported.table.rows[2][2], Cell::Empty);
    }

    #[test]
    fn export_overwrites_an_existing_destination() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("result.xlsx");
        std::fs::write(&path, b"stale bytes from a previous run").unwrap();

        let (config, report) = sample();
        write_workbook(&report, &config, &path).unwrap();

        let outline = inspect_workbook(&path).unwrap();
        assert_eq!(outline.sheets.len(), 3);
    }

    #[test]
    fn import_maps_cell_types() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.xlsx");

        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 0, "Name").unwrap();
        sheet.write_string(0, 1, "Terminal_id").unwrap();
        sheet.write_string(0, 2, "Amt").unwrap();
        sheet.write_string(1, 0, "Alice").unwrap();
        sheet.write_number(1, 1, 1001.0).unwrap();
        sheet.write_number(1, 2, 12.5).unwrap();
        sheet.write_string(2, 0, "Bob").unwrap();
        sheet.write_number(2, 1, 1002.0).unwrap();
        // Bob's amount cell left unwritten.
        workbook.save(&path).unwrap();

        let imported = import_ledger(&path, None).unwrap();
        assert!(imported.warnings.is_empty());
        assert_eq!(imported.table.columns, vec!["Name", "Terminal_id", "Amt"]);
        assert_eq!(imported.table.rows[0][1], num(1001.0));
        assert_eq!(imported.table.rows[0][2], num(12.5));
        assert_eq!(imported.table.rows[1][2], Cell::Empty);
    }

    #[test]
    fn missing_sheet_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.xlsx");

        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet().set_name("Data").unwrap();
        sheet.write_string(0, 0, "Name").unwrap();
        workbook.save(&path).unwrap();

        let err = import_ledger(&path, Some("NCMCParkingDB")).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("no sheet 'NCMCParkingDB'"));
        assert!(message.contains("Data"));
    }

    #[test]
    fn blank_and_duplicate_headers_warn() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.xlsx");

        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 0, "Name").unwrap();
        // Column 1 header left blank.
        sheet.write_string(0, 2, "Name").unwrap();
        sheet.write_string(1, 0, "Alice").unwrap();
        sheet.write_string(1, 1, "T1").unwrap();
        sheet.write_string(1, 2, "Alice").unwrap();
        workbook.save(&path).unwrap();

        let imported = import_ledger(&path, None).unwrap();
        assert_eq!(
            imported.table.columns,
            vec!["Name", "Unnamed: 1", "Name"]
        );
        assert_eq!(imported.warnings.len(), 2);
        assert!(imported.warnings[0].contains("blank header"));
        assert!(imported.warnings[1].contains("duplicate header 'Name'"));
    }

    #[test]
    fn nonexistent_file_is_an_io_error() {
        let err = import_ledger(Path::new("/nonexistent/ledger.xlsx"), None).unwrap_err();
        assert!(matches!(err, ReconError::Io(_)));
    }
}
