use bigdecimal::{BigDecimal, Zero};
use indexmap::IndexMap;

use crate::models::{
    Aggregation, CcaRecord, Cell, InvoiceLine, ReconciliationRow, Table,
};
use crate::normalize::CurrencyValue;

pub const SHEET_SUMMARY: &str = "Summary";
pub const SHEET_RECONCILIATION: &str = "Reconciliation";
pub const SHEET_INVOICES: &str = "Invoices";
pub const SHEET_CCA: &str = "CCA";

pub const COL_AWB_PREFIX: &str = "AWB Prefix";
pub const COL_AWB_SERIAL: &str = "AWB Serial";

pub const COL_CW_INVOICE: &str = "Charge Weight (Invoice)";
pub const COL_CW_REPORT: &str = "Charge Weight (Report)";
pub const COL_NYR_INVOICE: &str = "Net Yield Rate (Invoice)";
pub const COL_NYR_REPORT: &str = "Net Yield Rate (Report)";
pub const COL_ND_INVOICE: &str = "Net Due (Invoice)";
pub const COL_ND_REPORT: &str = "Net Due (Report)";
pub const COL_DIFF_NET_DUE: &str = "Diff Net Due";
pub const COL_DISCREPANCY: &str = "Discrepancy Found";

const RECONCILIATION_COLUMNS: [&str; 10] = [
    COL_AWB_PREFIX,
    COL_AWB_SERIAL,
    COL_CW_INVOICE,
    COL_CW_REPORT,
    COL_NYR_INVOICE,
    COL_NYR_REPORT,
    COL_ND_INVOICE,
    COL_ND_REPORT,
    COL_DIFF_NET_DUE,
    COL_DISCREPANCY,
];

pub const COL_CHARGE_WEIGHT: &str = "Charge Weight";
pub const COL_NET_YIELD_RATE: &str = "Net Yield Rate";
pub const COL_NET_DUE: &str = "Net Due for AWB";

const INVOICE_AMOUNT_COLUMNS: [&str; 10] = [
    "PP Freight Charge",
    "PP Due Airline",
    "CC Freight Charge",
    "CC Due Agent",
    "CC Due Airline",
    "Disc.",
    "Agency Comm.",
    "Taxes",
    "Others",
    COL_NET_DUE,
];

pub const COL_CCA_REF: &str = "CCA Ref. No";

const CCA_AMOUNT_COLUMNS: [&str; 8] = [
    "Freight Charge",
    "Due Airline",
    "Due Agent",
    "Disc.",
    "Agency Comm.",
    "Taxes",
    "Others",
    "Net Due for AWB (Sale Currency)",
];

pub const METRIC_INVOICE_COUNT: &str = "Invoice AWB Count";
pub const METRIC_INVOICE_AMOUNT: &str = "Total Invoice Amount (Net Due)";
pub const METRIC_INVOICE_WEIGHT: &str = "Total Invoice Charge Weight";
pub const METRIC_AVG_RATE: &str = "Average Net Yield Rate";
pub const METRIC_REPORT_AMOUNT: &str = "Total Report Amount (for Matched AWBs)";
pub const METRIC_DIFFERENCE: &str = "Difference (Report - Invoice)";

/// 发票明细, 主键列在前, 带合计行
pub fn invoices_table(lines: &[InvoiceLine]) -> Table {
    let mut columns = vec![
        COL_AWB_PREFIX,
        COL_AWB_SERIAL,
        "Flight Date",
        "Origin",
        "Destination",
        COL_CHARGE_WEIGHT,
        COL_NET_YIELD_RATE,
    ];
    columns.extend(INVOICE_AMOUNT_COLUMNS);
    let mut table = Table::new(SHEET_INVOICES, &columns).with_label_column(COL_AWB_PREFIX);

    for line in lines {
        let mut cells = vec![
            Cell::text(&line.key.prefix),
            Cell::text(&line.key.serial),
            Cell::text(&line.flight_date),
            Cell::text(&line.origin),
            Cell::text(&line.destination),
            Cell::number(line.charge_weight.clone()),
            Cell::number(line.net_yield_rate.clone()),
        ];
        cells.extend(
            [
                &line.pp_freight_charge,
                &line.pp_due_airline,
                &line.cc_freight_charge,
                &line.cc_due_agent,
                &line.cc_due_airline,
                &line.discount,
                &line.agency_commission,
                &line.taxes,
                &line.others,
                &line.net_due,
            ]
            .into_iter()
            .map(|v| Cell::number(v.clone())),
        );
        table.push_row(cells);
    }

    let mut sums = vec![
        (COL_CHARGE_WEIGHT, Aggregation::Sum),
        (COL_NET_YIELD_RATE, Aggregation::Sum),
    ];
    sums.extend(INVOICE_AMOUNT_COLUMNS.iter().map(|c| (*c, Aggregation::Sum)));
    table.append_totals(&sums);
    table
}

/// 对账明细, 合计行汇总重量、净应付和差额
pub fn reconciliation_table(rows: &[ReconciliationRow]) -> Table {
    let mut table =
        Table::new(SHEET_RECONCILIATION, &RECONCILIATION_COLUMNS).with_label_column(COL_AWB_PREFIX);
    for row in rows {
        table.push_row(vec![
            Cell::text(&row.key.prefix),
            Cell::text(&row.key.serial),
            Cell::number(row.charge_weight_invoice.clone()),
            Cell::number(row.charge_weight_report.clone()),
            Cell::number(row.net_yield_rate_invoice.clone()),
            Cell::number(row.net_yield_rate_report.clone()),
            Cell::number(row.net_due_invoice.clone()),
            Cell::number(row.net_due_report.clone()),
            Cell::number(row.diff_net_due.clone()),
            Cell::Bool(row.discrepancy),
        ]);
    }
    // 在差异标记之后追加; 标记列留空
    table.append_totals(&[
        (COL_CW_INVOICE, Aggregation::Sum),
        (COL_CW_REPORT, Aggregation::Sum),
        (COL_ND_INVOICE, Aggregation::Sum),
        (COL_ND_REPORT, Aggregation::Sum),
        (COL_DIFF_NET_DUE, Aggregation::Sum),
    ]);
    table
}

fn currency_cell(value: &CurrencyValue) -> Cell {
    match value {
        CurrencyValue::Amount(v) => Cell::Number(v.clone()),
        CurrencyValue::Text(s) => Cell::text(s),
    }
}

/// CCA 明细. 合计只覆盖每条记录都是数值的列
pub fn cca_table(records: &[CcaRecord]) -> Table {
    let mut columns = vec![
        COL_AWB_PREFIX,
        COL_AWB_SERIAL,
        COL_CCA_REF,
        "CCA Issue Date",
        "Origin",
        "Destination",
        "MOP Freight Charge",
        "MOP Other Charge",
    ];
    columns.extend(CCA_AMOUNT_COLUMNS);
    let mut table = Table::new(SHEET_CCA, &columns).with_label_column(COL_CCA_REF);

    for rec in records {
        let mut cells = vec![
            Cell::text(&rec.awb_prefix),
            Cell::text(&rec.awb_serial),
            Cell::text(&rec.reference),
            Cell::text(&rec.issue_date),
            Cell::text(&rec.origin),
            Cell::text(&rec.destination),
            Cell::text(&rec.mop_freight),
            Cell::text(&rec.mop_other),
        ];
        cells.extend(rec.amounts().into_iter().map(currency_cell));
        table.push_row(cells);
    }

    let sums: Vec<_> = CCA_AMOUNT_COLUMNS
        .iter()
        .map(|c| (*c, Aggregation::SumIfAllNumeric))
        .collect();
    if !table.append_totals(&sums) && !records.is_empty() {
        tracing::info!("CCA table has no fully numeric columns, no totals row added");
    }
    table
}

/// 汇总指标, 仅由数据行计算
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryFigures {
    pub invoice_count: usize,
    pub total_invoice_amount: BigDecimal,
    pub total_charge_weight: BigDecimal,
    pub average_net_yield_rate: BigDecimal,
    /// 未执行对账时为 `None`
    pub total_report_amount: Option<BigDecimal>,
}

impl SummaryFigures {
    pub fn from_tables(invoices: &Table, reconciliation: Option<&Table>) -> Self {
        let total_invoice_amount = invoices.column_sum(COL_NET_DUE);
        let total_charge_weight = invoices.column_sum(COL_CHARGE_WEIGHT);
        let average_net_yield_rate = if total_charge_weight.is_zero() {
            BigDecimal::zero()
        } else {
            &total_invoice_amount / &total_charge_weight
        };
        Self {
            invoice_count: invoices.data_row_count(),
            total_invoice_amount,
            total_charge_weight,
            average_net_yield_rate,
            total_report_amount: reconciliation.map(|t| t.column_sum(COL_ND_REPORT)),
        }
    }

    pub fn difference(&self) -> Option<BigDecimal> {
        self.total_report_amount
            .as_ref()
            .map(|report| report - &self.total_invoice_amount)
    }

    /// 有序的指标/值对
    pub fn metrics(&self) -> IndexMap<&'static str, Cell> {
        let mut metrics = IndexMap::new();
        metrics.insert(
            METRIC_INVOICE_COUNT,
            Cell::Number(BigDecimal::from(self.invoice_count as u64)),
        );
        metrics.insert(METRIC_INVOICE_AMOUNT, Cell::Number(self.total_invoice_amount.clone()));
        metrics.insert(METRIC_INVOICE_WEIGHT, Cell::Number(self.total_charge_weight.clone()));
        metrics.insert(METRIC_AVG_RATE, Cell::Number(self.average_net_yield_rate.clone()));
        metrics.insert(
            METRIC_REPORT_AMOUNT,
            Cell::Number(self.total_report_amount.clone().unwrap_or_else(BigDecimal::zero)),
        );
        if let Some(diff) = self.difference() {
            metrics.insert(METRIC_DIFFERENCE, Cell::Number(diff));
        }
        metrics
    }

    pub fn to_table(&self) -> Table {
        let mut table = Table::new(SHEET_SUMMARY, &["Metric", "Value"]);
        for (metric, value) in self.metrics() {
            table.push_row(vec![Cell::text(metric), value]);
        }
        table
    }
}
