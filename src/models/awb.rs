use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

use crate::normalize::{
    format_flight_date, parse_flight_date, safe_numeric, split_awb_number, strip_weight_unit,
};

/// 此版式发票中每张运单的承运人前缀
pub const AWB_PREFIX: &str = "141";
/// 运单章节中所有运单的始发港
pub const AWB_ORIGIN: &str = "TLV";
/// 标识真实运单行的固定汇率
pub const EXCHANGE_RATE_ANCHOR: &str = "1.00000000";

/// 发票行与报表行共用的联合主键
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AwbKey {
    pub prefix: String,
    pub serial: String,
}

impl AwbKey {
    pub fn new(prefix: impl Into<String>, serial: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            serial: serial.into(),
        }
    }
}

/// 从发票文本中提取的一条运单明细, 数值为原始字符串
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AwbRecord {
    /// `"<前缀> <serial1> <serial2>"`
    pub awb_number: String,
    pub prefix: String,
    /// serial1 与 serial2 拼接, 去除空白
    pub serial: String,
    pub serial_part1: String,
    pub serial_part2: String,
    pub flight_date: String,
    pub origin: String,
    pub destination: String,
    /// 保留末尾的 `K`
    pub charge_weight: String,
    /// 第二行没有费率时为空
    pub net_yield_rate: String,
    pub pp_freight_charge: String,
    pub pp_due_airline: String,
    pub cc_freight_charge: String,
    pub cc_due_agent: String,
    pub cc_due_airline: String,
    pub discount: String,
    pub agency_commission: String,
    pub taxes: String,
    pub others: String,
    pub net_due: String,
    pub exchange_rate: String,
}

/// 拆分主键并将金额转为十进制的 [`AwbRecord`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceLine {
    pub key: AwbKey,
    pub flight_date: String,
    /// 航班日期解析失败时为 false, 此时 `flight_date` 保存原始值
    pub flight_date_parsed: bool,
    pub origin: String,
    pub destination: String,
    pub charge_weight: Option<BigDecimal>,
    pub net_yield_rate: Option<BigDecimal>,
    pub pp_freight_charge: Option<BigDecimal>,
    pub pp_due_airline: Option<BigDecimal>,
    pub cc_freight_charge: Option<BigDecimal>,
    pub cc_due_agent: Option<BigDecimal>,
    pub cc_due_airline: Option<BigDecimal>,
    pub discount: Option<BigDecimal>,
    pub agency_commission: Option<BigDecimal>,
    pub taxes: Option<BigDecimal>,
    pub others: Option<BigDecimal>,
    pub net_due: Option<BigDecimal>,
}

impl From<&AwbRecord> for InvoiceLine {
    fn from(rec: &AwbRecord) -> Self {
        let (prefix, serial) = split_awb_number(&rec.awb_number);
        Self {
            key: AwbKey::new(prefix.trim(), serial.trim()),
            flight_date: format_flight_date(&rec.flight_date),
            flight_date_parsed: parse_flight_date(&rec.flight_date).is_some(),
            origin: rec.origin.clone(),
            destination: rec.destination.clone(),
            charge_weight: safe_numeric(strip_weight_unit(&rec.charge_weight)),
            net_yield_rate: safe_numeric(&rec.net_yield_rate),
            pp_freight_charge: safe_numeric(&rec.pp_freight_charge),
            pp_due_airline: safe_numeric(&rec.pp_due_airline),
            cc_freight_charge: safe_numeric(&rec.cc_freight_charge),
            cc_due_agent: safe_numeric(&rec.cc_due_agent),
            cc_due_airline: safe_numeric(&rec.cc_due_airline),
            discount: safe_numeric(&rec.discount),
            agency_commission: safe_numeric(&rec.agency_commission),
            taxes: safe_numeric(&rec.taxes),
            others: safe_numeric(&rec.others),
            net_due: safe_numeric(&rec.net_due),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn record() -> AwbRecord {
        AwbRecord {
            awb_number: "141 1234567 8".into(),
            prefix: AWB_PREFIX.into(),
            serial: "12345678".into(),
            serial_part1: "1234567".into(),
            serial_part2: "8".into(),
            flight_date: "01JAN25".into(),
            origin: AWB_ORIGIN.into(),
            destination: "JFK".into(),
            charge_weight: "560.00K".into(),
            net_yield_rate: "".into(),
            pp_freight_charge: "10.00".into(),
            pp_due_airline: "20.00".into(),
            cc_freight_charge: "0.00".into(),
            cc_due_agent: "0.00".into(),
            cc_due_airline: "30.00".into(),
            discount: "0.00".into(),
            agency_commission: "0.00".into(),
            taxes: "5.00".into(),
            others: "-".into(),
            net_due: "55.00".into(),
            exchange_rate: EXCHANGE_RATE_ANCHOR.into(),
        }
    }

    #[test]
    fn invoice_line_normalizes_keys_units_and_dates() {
        let rec = record();
        let line = InvoiceLine::from(&rec);
        assert_eq!(line.key, AwbKey::new("141", "12345678"));
        assert_eq!(line.flight_date, "01/01/2025");
        assert!(line.flight_date_parsed);
        assert_eq!(line.charge_weight, Some(BigDecimal::from_str("560").unwrap()));
        assert_eq!(line.net_yield_rate, None);
        assert_eq!(line.others, None);
        assert_eq!(line.net_due, Some(BigDecimal::from_str("55").unwrap()));
    }

    #[test]
    fn unparsed_flight_date_is_kept_and_flagged() {
        let mut rec = record();
        rec.flight_date = "FZ123".into();
        let line = InvoiceLine::from(&rec);
        assert_eq!(line.flight_date, "FZ123");
        assert!(!line.flight_date_parsed);
    }
}
