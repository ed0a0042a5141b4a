use regex::{Captures, Regex};
use std::sync::OnceLock;

use crate::models::{AwbRecord, AWB_ORIGIN, AWB_PREFIX};
use crate::normalize::collapse_whitespace;

/// 计费重量与汇率锚点之间的费用列
const FEE_FIELDS: usize = 10;

fn line1_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        let fee = r"([\d.,-]+)\s+";
        let pattern = format!(
            r"^\s*141\s+(\d{{7}})\s+(\d)\s+TLV\s+([A-Z]{{3}})\s+(\d+[.,]\d{{2}}\s*K)\s+{}(1\.00000000)\s+I?\s*([\d.,-]+)\s*$",
            fee.repeat(FEE_FIELDS)
        );
        Regex::new(&pattern).expect("AWB line pattern is valid")
    })
}

fn rate_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d+\.\d+)").expect("rate pattern is valid"))
}

/// 检查游标所在行的结果
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// 首行匹配, 下一行给出了航班日期
    Accepted(Box<AwbRecord>),
    /// 首行匹配, 但没有可用的第二行
    MissingSecondLine,
    /// 不是运单行
    NoMatch,
}

impl Step {
    /// 游标前进的行数. 被拒的第二行会重新作为首行尝试
    pub fn advance(&self) -> usize {
        match self {
            Step::Accepted(_) => 2,
            Step::MissingSecondLine | Step::NoMatch => 1,
        }
    }
}

/// 等待日期/费率行的首行匹配
struct PendingLine<'t> {
    groups: Captures<'t>,
}

/// 检查 `lines[cursor]` 及其下一行, 在此做行归一化
pub fn step<S: AsRef<str>>(lines: &[S], cursor: usize) -> Step {
    let Some(first) = lines.get(cursor) else {
        return Step::NoMatch;
    };
    let first = collapse_whitespace(first.as_ref());
    let Some(groups) = line1_regex().captures(&first) else {
        return Step::NoMatch;
    };
    let pending = PendingLine { groups };

    let Some(second) = lines.get(cursor + 1) else {
        return Step::MissingSecondLine;
    };
    let second = collapse_whitespace(second.as_ref());
    let flight_date = second.split(' ').next().unwrap_or_default();
    if flight_date.is_empty() {
        return Step::MissingSecondLine;
    }
    let net_yield_rate = rate_regex()
        .find(&second)
        .map(|m| m.as_str())
        .unwrap_or_default();

    Step::Accepted(Box::new(pending.into_record(flight_date, net_yield_rate)))
}

impl PendingLine<'_> {
    fn group(&self, i: usize) -> String {
        self.groups
            .get(i)
            .map(|m| m.as_str().replace(',', ".").trim().to_string())
            .unwrap_or_default()
    }

    fn into_record(self, flight_date: &str, net_yield_rate: &str) -> AwbRecord {
        let serial_part1 = self.group(1);
        let serial_part2 = self.group(2);
        AwbRecord {
            awb_number: format!("{AWB_PREFIX} {serial_part1} {serial_part2}"),
            prefix: AWB_PREFIX.to_string(),
            serial: format!("{serial_part1}{serial_part2}")
                .split_whitespace()
                .collect(),
            serial_part1,
            serial_part2,
            flight_date: flight_date.to_string(),
            origin: AWB_ORIGIN.to_string(),
            destination: self.group(3),
            charge_weight: self.group(4),
            net_yield_rate: net_yield_rate.to_string(),
            pp_freight_charge: self.group(5),
            pp_due_airline: self.group(6),
            cc_freight_charge: self.group(7),
            cc_due_agent: self.group(8),
            cc_due_airline: self.group(9),
            discount: self.group(10),
            agency_commission: self.group(11),
            taxes: self.group(12),
            others: self.group(13),
            net_due: self.group(14),
            exchange_rate: self.group(15),
        }
    }
}

/// 逐行扫描运单区域, 每对通过的两行输出一条记录
pub fn parse_awb_lines<S: AsRef<str>>(lines: &[S]) -> Vec<AwbRecord> {
    let mut records = Vec::new();
    let mut cursor = 0;
    while cursor < lines.len() {
        let outcome = step(lines, cursor);
        cursor += outcome.advance();
        match outcome {
            Step::Accepted(record) => records.push(*record),
            Step::MissingSecondLine => {
                tracing::debug!("AWB line at {} has no date line, re-scanning from next line", cursor - 1);
            }
            Step::NoMatch => {}
        }
    }
    tracing::info!("Parsed {} AWB records from {} lines", records.len(), lines.len());
    records
}
