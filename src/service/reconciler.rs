use bigdecimal::{BigDecimal, Zero};
use indexmap::{IndexMap, IndexSet};

use crate::models::{AwbKey, InvoiceLine, ReconciliationRow, ReportRow, ReportTable};
use crate::normalize::safe_numeric;

/// 归一化后某个主键在报表侧的数据
#[derive(Debug, Clone, PartialEq)]
pub struct ReportFigures {
    pub charge_weight: Option<BigDecimal>,
    pub cost_rate: Option<BigDecimal>,
    pub total_cost: Option<BigDecimal>,
}

/// 发票行与报表连接的结果
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciliation {
    /// 每条发票行恰好一行, 按发票顺序
    pub rows: Vec<ReconciliationRow>,
    /// 因重复主键被丢弃的报表行
    pub duplicates_dropped: usize,
    /// 报表中没有对应行的发票行
    pub unmatched: usize,
}

impl Reconciliation {
    pub fn discrepancy_count(&self) -> usize {
        self.rows.iter().filter(|r| r.discrepancy).count()
    }

    /// 发票与报表净应付不一致的主键
    pub fn net_due_discrepancies(&self) -> IndexSet<AwbKey> {
        self.rows
            .iter()
            .filter(|r| r.has_net_due_difference())
            .map(|r| r.key.clone())
            .collect()
    }
}

/// 去除空白, 再去掉数值型编号在导出时带上的 `.0`
pub fn normalize_report_key(raw: &str) -> String {
    let trimmed = raw.trim();
    trimmed.strip_suffix(".0").unwrap_or(trimmed).trim().to_string()
}

fn report_key(row: &ReportRow) -> AwbKey {
    AwbKey::new(normalize_report_key(&row.prefix), normalize_report_key(&row.suffix))
}

/// 按主键去重, 保留首次出现. 返回去重后的行和丢弃数
pub fn dedup_report(report: &ReportTable) -> (IndexMap<AwbKey, ReportFigures>, usize) {
    let mut unique: IndexMap<AwbKey, ReportFigures> = IndexMap::with_capacity(report.len());
    for row in &report.rows {
        unique.entry(report_key(row)).or_insert_with(|| ReportFigures {
            charge_weight: safe_numeric(&row.charge_weight),
            cost_rate: safe_numeric(&row.cost_rate),
            total_cost: safe_numeric(&row.total_cost),
        });
    }
    let dropped = report.len() - unique.len();
    (unique, dropped)
}

/// 两侧都有且四舍五入后不同, 或只有一侧有值
fn mismatch(invoice: &Option<BigDecimal>, report: &Option<BigDecimal>, digits: i64) -> bool {
    match (invoice, report) {
        (Some(a), Some(b)) => a.round(digits) != b.round(digits),
        (None, None) => false,
        _ => true,
    }
}

fn difference(report: &Option<BigDecimal>, invoice: &Option<BigDecimal>) -> Option<BigDecimal> {
    match (report, invoice) {
        (Some(r), Some(i)) => Some(r - i),
        _ => None,
    }
}

/// 以发票行为驱动, 左连接去重后的报表
pub fn reconcile(invoices: &[InvoiceLine], report: &ReportTable) -> Reconciliation {
    let (unique, duplicates_dropped) = dedup_report(report);
    if duplicates_dropped > 0 {
        tracing::info!(
            "Removed {} duplicate AWB entries from the report data",
            duplicates_dropped
        );
    }

    let mut unmatched = 0usize;
    let rows: Vec<ReconciliationRow> = invoices
        .iter()
        .map(|line| {
            let key = AwbKey::new(line.key.prefix.trim(), line.key.serial.trim());
            let figures = unique.get(&key);
            if figures.is_none() {
                unmatched += 1;
            }
            let charge_weight_report = figures.and_then(|f| f.charge_weight.clone());
            let net_yield_rate_report = figures.and_then(|f| f.cost_rate.clone());
            let net_due_report = figures.and_then(|f| f.total_cost.clone());

            let diff_net_due = difference(&net_due_report, &line.net_due);
            let discrepancy = mismatch(&line.charge_weight, &charge_weight_report, 2)
                || mismatch(&line.net_yield_rate, &net_yield_rate_report, 5)
                || diff_net_due
                    .as_ref()
                    .map(|d| !d.round(2).is_zero())
                    .unwrap_or(false);

            ReconciliationRow {
                key,
                charge_weight_invoice: line.charge_weight.clone(),
                charge_weight_report,
                net_yield_rate_invoice: line.net_yield_rate.clone(),
                net_yield_rate_report,
                net_due_invoice: line.net_due.clone(),
                net_due_report,
                diff_net_due,
                discrepancy,
            }
        })
        .collect();

    let reconciliation = Reconciliation {
        rows,
        duplicates_dropped,
        unmatched,
    };
    tracing::info!(
        "Reconciled {} invoice lines: {} unmatched, {} with discrepancies",
        reconciliation.rows.len(),
        reconciliation.unmatched,
        reconciliation.discrepancy_count()
    );
    reconciliation
}
