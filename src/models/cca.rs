use serde::Serialize;

use crate::normalize::CurrencyValue;

/// 一条 CCA 调整, 取自 CCA 页上的两行块
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CcaRecord {
    pub reference: String,
    pub awb_prefix: String,
    /// 7+1 位数字, 去掉中间空格
    pub awb_serial: String,
    /// 格式化前为原始 `DDMMM`; 块中没有时为空
    pub issue_date: String,
    pub origin: String,
    pub destination: String,
    pub mop_freight: String,
    pub mop_other: String,
    pub freight_charge: CurrencyValue,
    pub due_airline: CurrencyValue,
    pub due_agent: CurrencyValue,
    pub discount: CurrencyValue,
    pub agency_commission: CurrencyValue,
    pub taxes: CurrencyValue,
    pub others: CurrencyValue,
    pub net_due: CurrencyValue,
}

impl CcaRecord {
    /// 按列顺序的金额字段
    pub fn amounts(&self) -> [&CurrencyValue; 8] {
        [
            &self.freight_charge,
            &self.due_airline,
            &self.due_agent,
            &self.discount,
            &self.agency_commission,
            &self.taxes,
            &self.others,
            &self.net_due,
        ]
    }
}

/// CCA 块正则的捕获组序号 (与正则一致, 从 1 开始)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CcaGroup {
    Reference = 1,
    Prefix,
    Serial,
    Origin,
    MopFreight,
    MopOther,
    FreightCharge,
    DueAirline,
    DueAgent,
    Discount,
    AgencyCommission,
    Taxes,
    Others,
    NetDue,
    IssueDate,
    Destination,
}

/// 完整块产生的捕获组数量
pub const CCA_GROUP_COUNT: usize = 16;
