use regex::{Captures, Regex};
use std::sync::OnceLock;

use crate::models::{CcaGroup, CcaRecord, CCA_GROUP_COUNT};
use crate::normalize::clean_currency;

/// 每条调整占两行: 第一行是编号、运单号、付款方式和金额; 第二行是可选的签发日期和目的港.
/// 折扣之后的惰性匹配吸收间距不一致的后半段.
const CCA_BLOCK_PATTERN: &str = concat!(
    r"(?ms)^\s*(\d{5,})\s+",
    r"(\d{3})\s*",
    r"(\d{7}\s\d{1})\s*",
    r"([A-Z]{3})\s+",
    r"(\S+)\s+",
    r"(\S+)\s+",
    r"([\d().,-]+)\s+",
    r"([\d().,-]+)\s+",
    r"([\d().,-]+)\s+",
    r"([\d().,-]+)",
    r".*?",
    r"([\d().,-]+)\s+",
    r"([\d().,-]+)\s+",
    r"([\d().,-]+)\s+",
    r"([\d().,-]+)\s+",
    r"\d\.\d{2}\s+",
    r"[\d().,-]+\s*?",
    r"\n\s*",
    r"(\d{2}[A-Z]{3})?",
    r".*?",
    r"\b([A-Z]{3})\b",
);

fn block_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(CCA_BLOCK_PATTERN).expect("CCA block pattern is valid"))
}

/// 从左到右查找页面中所有不重叠的 CCA 块
pub fn parse_cca_text(text: &str) -> Vec<CcaRecord> {
    let mut records = Vec::new();
    let mut matches = 0usize;
    for caps in block_regex().captures_iter(text) {
        matches += 1;
        match record_from_captures(&caps) {
            Some(record) => records.push(record),
            None => {
                tracing::warn!(
                    "CCA match is missing groups ({} of {} captured), skipping: {:?}",
                    caps.iter().skip(1).flatten().count(),
                    CCA_GROUP_COUNT,
                    caps.get(0).map(|m| m.as_str())
                );
            }
        }
    }
    tracing::info!("Found {} CCA blocks, parsed {} records", matches, records.len());
    records
}

/// 全有或全无: 缺少任一必需分组的块不产生记录
fn record_from_captures(caps: &Captures<'_>) -> Option<CcaRecord> {
    let group = |g: CcaGroup| caps.get(g as usize).map(|m| m.as_str());
    let required = |g: CcaGroup| group(g).map(str::to_string);
    let amount = |g: CcaGroup| group(g).map(clean_currency);

    Some(CcaRecord {
        reference: required(CcaGroup::Reference)?,
        awb_prefix: required(CcaGroup::Prefix)?,
        awb_serial: group(CcaGroup::Serial)?.replace(' ', ""),
        issue_date: group(CcaGroup::IssueDate).unwrap_or_default().to_string(),
        origin: required(CcaGroup::Origin)?,
        destination: required(CcaGroup::Destination)?,
        mop_freight: required(CcaGroup::MopFreight)?,
        mop_other: required(CcaGroup::MopOther)?,
        freight_charge: amount(CcaGroup::FreightCharge)?,
        due_airline: amount(CcaGroup::DueAirline)?,
        due_agent: amount(CcaGroup::DueAgent)?,
        discount: amount(CcaGroup::Discount)?,
        agency_commission: amount(CcaGroup::AgencyCommission)?,
        taxes: amount(CcaGroup::Taxes)?,
        others: amount(CcaGroup::Others)?,
        net_due: amount(CcaGroup::NetDue)?,
    })
}
