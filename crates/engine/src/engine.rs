use crate::aggregate::aggregate;
use crate::classify::classify;
use crate::combine::{combine, totals};
use crate::config::ReportConfig;
use crate::error::ReconError;
use crate::model::{
    AggregateTable, Amount, CellClass, ClassMap, CombinedTable, LedgerTable, ReconReport,
    ReconSummary, RunMeta,
};

/// Run one reconciliation: aggregate both ledgers, zip them positionally,
/// classify, and assemble the report.
///
/// The caller loads the ledger tables and writes the workbook afterwards;
/// nothing here touches the filesystem. Errors from aggregation and
/// combination abort the run, so a failed run produces no report at all.
pub fn run(
    config: &ReportConfig,
    parking: &LedgerTable,
    settlement: &LedgerTable,
) -> Result<ReconReport, ReconError> {
    let aggregate_a = aggregate(
        "parking",
        parking,
        &config.parking.name_column,
        &config.parking.terminal_column,
        config.parking.amount_column,
    )?;
    let aggregate_b = aggregate(
        "settlement",
        settlement,
        &config.settlement.name_column,
        &config.settlement.terminal_column,
        config.settlement.amount_column,
    )?;

    let combined = combine(&aggregate_a, &aggregate_b, config)?;
    let totals = totals(&combined);
    let classes = classify(&combined);

    let summary =
        compute_summary(parking, settlement, &aggregate_a, &aggregate_b, &combined, &classes);

    Ok(ReconReport {
        meta: RunMeta {
            config_name: config.name.clone(),
            alignment: config.comparison.alignment,
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
        },
        summary,
        aggregate_a,
        aggregate_b,
        combined,
        totals,
        classes,
    })
}

fn compute_summary(
    parking: &LedgerTable,
    settlement: &LedgerTable,
    aggregate_a: &AggregateTable,
    aggregate_b: &AggregateTable,
    combined: &CombinedTable,
    classes: &ClassMap,
) -> ReconSummary {
    let mut positive = 0;
    let mut negative = 0;
    let mut missing_cells = 0;
    for (_, _, class) in classes.iter() {
        match class {
            CellClass::Positive => positive += 1,
            CellClass::Negative => negative += 1,
            CellClass::Missing => missing_cells += 1,
        }
    }

    let mut zero = 0;
    let mut undefined = 0;
    for row in &combined.rows {
        match row.variance {
            Amount::Number(v) if v == 0.0 => zero += 1,
            Amount::Number(_) => {}
            Amount::Absent => undefined += 1,
        }
    }

    ReconSummary {
        rows_a: parking.rows.len(),
        rows_b: settlement.rows.len(),
        groups_a: aggregate_a.rows.len(),
        groups_b: aggregate_b.rows.len(),
        combined_rows: combined.rows.len(),
        positive,
        negative,
        zero,
        undefined,
        missing_cells,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Cell;

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

    fn config() -> ReportConfig {
        let mut config = ReportConfig::default();
        config.parking.amount_column = 2;
        config.settlement.amount_column = 2;
        config
    }

    fn parking_ledger() -> LedgerTable {
        ledger(
            &["Name", "Terminal_id", "NCMC_SVP_Amt"],
            vec![
                vec![text("Alice"), text("T1"), num(60.0)],
                vec![text("Alice"), text("T1"), num(40.0)],
                vec![text("Bob"), text("T2"), num(50.0)],
                vec![text("Cara"), text("T3"), num(30.0)],
            ],
        )
    }

    fn settlement_ledger() -> LedgerTable {
        ledger(
            &["Merchant Name", "Terminal ID", "Settlement Amount"],
            vec![
                vec![text("Alice"), text("T1"), num(80.0)],
                vec![text("Bob"), text("T2"), num(70.0)],
                vec![text("Cara"), text("T3"), num(30.0)],
            ],
        )
    }

    #[test]
    fn run_assembles_a_full_report() {
        let report = run(&config(), &parking_ledger(), &settlement_ledger()).unwrap();

        assert_eq!(report.meta.config_name, "comparison_result");
        assert!(!report.meta.engine_version.is_empty());
        assert!(!report.meta.run_at.is_empty());

        assert_eq!(report.summary.rows_a, 4);
        assert_eq!(report.summary.rows_b, 3);
        assert_eq!(report.summary.groups_a, 3);
        assert_eq!(report.summary.groups_b, 3);
        assert_eq!(report.summary.combined_rows, 3);

        // Alice 100-80 = +20, Bob 50-70 = -20, Cara 30-30 = 0
        assert_eq!(report.summary.positive, 1);
        assert_eq!(report.summary.negative, 1);
        assert_eq!(report.summary.zero, 1);
        assert_eq!(report.summary.undefined, 0);
        assert_eq!(report.summary.missing_cells, 0);

        assert_eq!(report.totals.amount_a, 180.0);
        assert_eq!(report.totals.amount_b, 180.0);
        assert_eq!(report.totals.variance, 0.0);
    }

    #[test]
    fn run_counts_missing_and_undefined() {
        let parking = ledger(
            &["Name", "Terminal_id", "NCMC_SVP_Amt"],
            vec![
                vec![text("Alice"), text("T1"), num(100.0)],
                vec![text("Bob"), text("T2"), Cell::Empty],
            ],
        );
        let settlement = ledger(
            &["Merchant Name", "Terminal ID", "Settlement Amount"],
            vec![
                vec![text("Alice"), text("T1"), num(80.0)],
                vec![text("Bob"), text("T2"), num(70.0)],
            ],
        );
        let report = run(&config(), &parking, &settlement).unwrap();

        assert_eq!(report.summary.positive, 1);
        assert_eq!(report.summary.undefined, 1);
        assert_eq!(report.summary.missing_cells, 1);
        // Bob's absent amount is excluded from the totals, not zeroed.
        assert_eq!(report.totals.amount_a, 100.0);
        assert_eq!(report.totals.amount_b, 150.0);
        assert_eq!(report.totals.variance, 20.0);
    }

    #[test]
    fn run_propagates_schema_errors() {
        let parking = ledger(&["Name", "NCMC_SVP_Amt"], vec![vec![text("Alice"), num(1.0)]]);
        let err = run(&config(), &parking, &settlement_ledger()).unwrap_err();
        match err {
            ReconError::MissingColumn { ledger, column } => {
                assert_eq!(ledger, "parking");
                assert_eq!(column, "Terminal_id");
            }
            other => panic!("expected MissingColumn, got {other:?}"),
        }
    }
}
