use bigdecimal::{BigDecimal, Zero};
use serde::Serialize;

use super::awb::AwbKey;

/// 一条发票行与至多一条报表行的连接结果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReconciliationRow {
    pub key: AwbKey,
    pub charge_weight_invoice: Option<BigDecimal>,
    pub charge_weight_report: Option<BigDecimal>,
    pub net_yield_rate_invoice: Option<BigDecimal>,
    pub net_yield_rate_report: Option<BigDecimal>,
    pub net_due_invoice: Option<BigDecimal>,
    pub net_due_report: Option<BigDecimal>,
    /// 报表 - 发票
    pub diff_net_due: Option<BigDecimal>,
    pub discrepancy: bool,
}

impl ReconciliationRow {
    /// 四舍五入后的净应付差额非零时为 true
    pub fn has_net_due_difference(&self) -> bool {
        self.diff_net_due
            .as_ref()
            .map(|d| !d.round(2).is_zero())
            .unwrap_or(false)
    }
}

/// 对账阶段是否执行及原因
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum ReconciliationStatus {
    Completed,
    SkippedNoReport,
    SkippedEmptyReport,
    SkippedNoInvoiceData,
    SkippedMissingColumns(Vec<String>),
}

impl ReconciliationStatus {
    pub fn ran(&self) -> bool {
        matches!(self, ReconciliationStatus::Completed)
    }
}
