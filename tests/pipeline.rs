use awb_recon::config::ExtractionConfig;
use awb_recon::models::{AwbKey, Cell, ReconciliationStatus, ReportRow, ReportTable, TOTAL_LABEL};
use awb_recon::parser::parse_awb_lines;
use awb_recon::service::assembler::{
    COL_DISCREPANCY, COL_ND_REPORT, COL_NET_DUE, COL_NET_YIELD_RATE, METRIC_DIFFERENCE,
    METRIC_INVOICE_AMOUNT, METRIC_INVOICE_COUNT, METRIC_REPORT_AMOUNT,
};
use awb_recon::source::TextPages;
use awb_recon::{process_document, Outcome, ReconciliationReport, ReportInput};
use bigdecimal::BigDecimal;
use std::str::FromStr;

const AWB_1: &str =
    "141 1234567 8 TLV JFK 560.00K 1.00 2.00 3.00 4.00 5.00 6.00 7.00 8.00 9.00 100.00 1.00000000 I 100.00";
const AWB_2: &str =
    "141 2222222 2 TLV DXB 40.00K 0.00 0.00 0.00 0.00 0.00 0.00 0.00 0.00 0.00 20.00 1.00000000 20.00";
const CCA_PAGE: &str = "Section B: CCA Details\n\
    12345 141 1234567 8 TLV PP CC (100.00) (20.00) (0.00) (5.00) (0.00) (3.00) (0.00) (128.00) 1.00 (128.00)\n\
    05MAR JFK";

fn dec(s: &str) -> BigDecimal {
    BigDecimal::from_str(s).unwrap()
}

fn pages(texts: &[&str]) -> TextPages {
    TextPages::new(texts.iter().map(|s| s.to_string()).collect())
}

fn awb_page() -> String {
    format!("Invoice page\n{AWB_1}\n01JAN25 0.50\n{AWB_2}\n15FEB25 0.50\nPage 2")
}

fn row(prefix: &str, suffix: &str, weight: &str, rate: &str, cost: &str) -> ReportRow {
    ReportRow {
        prefix: prefix.into(),
        suffix: suffix.into(),
        charge_weight: weight.into(),
        cost_rate: rate.into(),
        total_cost: cost.into(),
    }
}

fn completed(outcome: Outcome) -> ReconciliationReport {
    match outcome {
        Outcome::Completed(report) => *report,
        Outcome::NothingToReport => panic!("expected a completed report"),
    }
}

fn metric(report: &ReconciliationReport, name: &str) -> Option<Cell> {
    report
        .summary
        .rows
        .iter()
        .find(|r| r.cells[0] == Cell::text(name))
        .map(|r| r.cells[1].clone())
}

#[test]
fn single_awb_block_yields_normalized_record() {
    let records = parse_awb_lines(&[AWB_1, "01JAN25 0.50"]);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].serial, "12345678");

    let report = completed(process_document(
        &pages(&["cover", &format!("{AWB_1}\n01JAN25 0.50")]),
        ReportInput::None,
        &ExtractionConfig::default(),
    ));
    let invoices = &report.invoices;
    assert_eq!(invoices.data_row_count(), 1);
    let first = &invoices.rows[0];
    assert_eq!(first.cells[1], Cell::text("12345678"));
    assert_eq!(first.cells[2], Cell::text("01/01/2025"));
    assert_eq!(
        first.cells[invoices.column_index("Charge Weight").unwrap()],
        Cell::Number(dec("560.00"))
    );
    assert_eq!(report.reconciliation_status, ReconciliationStatus::SkippedNoReport);
    assert!(report.reconciliation.is_empty());
}

#[test]
fn report_without_matching_keys_flags_every_line() {
    let report_table = ReportTable::new(vec![row("141", "99999999", "1", "1", "1")]);
    let report = completed(process_document(
        &pages(&["cover", &awb_page()]),
        ReportInput::Table(report_table),
        &ExtractionConfig::default(),
    ));

    let recon = &report.reconciliation;
    assert_eq!(report.reconciliation_status, ReconciliationStatus::Completed);
    assert_eq!(recon.data_row_count(), 2);
    let flag = recon.column_index(COL_DISCREPANCY).unwrap();
    let nd_report = recon.column_index(COL_ND_REPORT).unwrap();
    for data in recon.data_rows() {
        assert_eq!(data.cells[flag], Cell::Bool(true));
        assert_eq!(data.cells[nd_report], Cell::Empty);
        assert_eq!(data.cells[3], Cell::Empty);
        assert_eq!(data.cells[5], Cell::Empty);
    }
    // 没有可比差额, 所以没有净应付不一致的发票行
    assert!(report.discrepant_keys.is_empty());
}

#[test]
fn cca_page_without_blocks_gives_empty_cca_table() {
    let report = completed(process_document(
        &pages(&["cover", &awb_page(), "Section B: CCA Details\nno adjustments this period"]),
        ReportInput::None,
        &ExtractionConfig::default(),
    ));
    assert_eq!(report.cca_rows, 0);
    assert!(report.cca.is_empty());
    assert!(report.cca.total_row().is_none());
    assert_eq!(report.invoices_rows, 2);
}

#[test]
fn cca_only_document_is_still_reported() {
    let report = completed(process_document(
        &pages(&["cover", CCA_PAGE]),
        ReportInput::None,
        &ExtractionConfig::default(),
    ));
    assert_eq!(report.invoices_rows, 0);
    assert_eq!(report.cca_rows, 1);
    let cca = &report.cca;
    assert_eq!(cca.rows[0].cells[cca.column_index("CCA Issue Date").unwrap()], Cell::text("05/Mar"));
    let total = cca.total_row().unwrap();
    assert_eq!(
        total.cells[cca.column_index("Freight Charge").unwrap()],
        Cell::Number(dec("-100.00"))
    );
    assert_eq!(metric(&report, METRIC_INVOICE_COUNT), Some(Cell::Number(dec("0"))));
}

#[test]
fn duplicate_report_keys_use_first_row() {
    let report_table = ReportTable::new(vec![
        row("141.0", "12345678", "560", "0.5", "100"),
        row("141", "12345678", "1", "9", "999"),
        row("141", "22222222", "40", "0.5", "25"),
    ]);
    let report = completed(process_document(
        &pages(&["cover", &awb_page(), CCA_PAGE]),
        ReportInput::Table(report_table),
        &ExtractionConfig::default(),
    ));

    let recon = &report.reconciliation;
    let flag = recon.column_index(COL_DISCREPANCY).unwrap();
    assert_eq!(recon.data_row_count(), 2);
    assert_eq!(recon.rows[0].cells[flag], Cell::Bool(false));
    assert_eq!(recon.rows[1].cells[flag], Cell::Bool(true));
    assert_eq!(
        report.discrepant_keys.iter().collect::<Vec<_>>(),
        vec![&AwbKey::new("141", "22222222")]
    );
    assert_eq!(report.cca_rows, 1);
}

#[test]
fn totals_rows_never_inflate_summary_figures() {
    let report_table = ReportTable::new(vec![
        row("141", "12345678", "560", "0.5", "100"),
        row("141", "22222222", "40", "0.5", "25"),
    ]);
    let report = completed(process_document(
        &pages(&["cover", &awb_page()]),
        ReportInput::Table(report_table),
        &ExtractionConfig::default(),
    ));

    let invoice_total = report.invoices.total_row().unwrap();
    assert_eq!(
        invoice_total.cells[report.invoices.column_index(COL_NET_YIELD_RATE).unwrap()],
        Cell::Number(dec("1.00"))
    );
    assert!(report.reconciliation.total_row().is_some());
    assert_eq!(report.total_net_due_awb, dec("120"));
    assert_eq!(report.invoices.column_sum(COL_NET_DUE), dec("120"));

    assert_eq!(metric(&report, METRIC_INVOICE_COUNT), Some(Cell::Number(dec("2"))));
    assert_eq!(metric(&report, METRIC_INVOICE_AMOUNT), Some(Cell::Number(dec("120"))));
    assert_eq!(metric(&report, METRIC_REPORT_AMOUNT), Some(Cell::Number(dec("125"))));
    assert_eq!(metric(&report, METRIC_DIFFERENCE), Some(Cell::Number(dec("5"))));

    let recon = &report.reconciliation;
    let total = recon.total_row().unwrap();
    assert_eq!(recon.display_cell(total, 0), Cell::text(TOTAL_LABEL));
    assert_eq!(total.cells[recon.column_index(COL_DISCREPANCY).unwrap()], Cell::Empty);
}

#[test]
fn missing_report_columns_skip_reconciliation_only() {
    let report = completed(process_document(
        &pages(&["cover", &awb_page()]),
        ReportInput::MissingColumns(vec!["total_cost".to_string()]),
        &ExtractionConfig::default(),
    ));
    assert_eq!(
        report.reconciliation_status,
        ReconciliationStatus::SkippedMissingColumns(vec!["total_cost".to_string()])
    );
    assert!(report.reconciliation.is_empty());
    assert_eq!(report.invoices_rows, 2);
    assert_eq!(metric(&report, METRIC_DIFFERENCE), None);
}

#[test]
fn empty_report_is_skipped() {
    let report = completed(process_document(
        &pages(&["cover", &awb_page()]),
        ReportInput::Table(ReportTable::default()),
        &ExtractionConfig::default(),
    ));
    assert_eq!(report.reconciliation_status, ReconciliationStatus::SkippedEmptyReport);
}

#[test]
fn document_without_records_has_nothing_to_report() {
    let outcome = process_document(
        &pages(&["cover", "no data here", "Section B: CCA Details"]),
        ReportInput::None,
        &ExtractionConfig::default(),
    );
    assert!(matches!(outcome, Outcome::NothingToReport));
}
