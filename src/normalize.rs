//! 发票文本与报表单元格的通用取值转换

use bigdecimal::{BigDecimal, Zero};
use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// 解析十进制数, 无法解析时返回 `None`
pub fn safe_numeric(raw: &str) -> Option<BigDecimal> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    BigDecimal::from_str(trimmed).ok()
}

/// `01JAN25` -> `01/01/2025`, 无法解析时原样返回
pub fn format_flight_date(raw: &str) -> String {
    match parse_flight_date(raw) {
        Some(date) => date.format("%d/%m/%Y").to_string(),
        None => raw.to_string(),
    }
}

pub fn parse_flight_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%d%b%y").ok()
}

/// `05MAR` -> `05/Mar`. 没有年份, 按 1900 年校验
pub fn format_cca_date(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return raw.to_string();
    }
    match NaiveDate::parse_from_str(&format!("{trimmed}1900"), "%d%b%Y") {
        Ok(date) => date.format("%d/%b").to_string(),
        Err(_) => raw.to_string(),
    }
}

/// `"141 1234567 8"` -> `("141", "12345678")`.
pub fn split_awb_number(raw: &str) -> (String, String) {
    let mut tokens = raw.split_whitespace();
    let prefix = tokens.next().unwrap_or_default().to_string();
    let serial: String = tokens.collect();
    (prefix, serial)
}

/// 去掉重量末尾的 `K` 单位 (连同前面的空白)
pub fn strip_weight_unit(raw: &str) -> &str {
    let trimmed = raw.trim();
    match trimmed.strip_suffix('K') {
        Some(rest) => rest.trim_end(),
        None => trimmed,
    }
}

/// 将两个及以上的连续空白合并为一个空格并去除首尾空白
pub fn collapse_whitespace(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut run = String::new();
    for ch in raw.chars() {
        if ch.is_whitespace() {
            run.push(ch);
            continue;
        }
        flush_whitespace(&mut out, &mut run);
        out.push(ch);
    }
    flush_whitespace(&mut out, &mut run);
    out.trim().to_string()
}

fn flush_whitespace(out: &mut String, run: &mut String) {
    match run.chars().count() {
        0 => {}
        1 => out.push_str(run),
        _ => out.push(' '),
    }
    run.clear();
}

/// CCA 金额字段: 带符号金额, 非数值时保留原文
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CurrencyValue {
    Amount(BigDecimal),
    Text(String),
}

impl CurrencyValue {
    pub fn amount(&self) -> Option<&BigDecimal> {
        match self {
            CurrencyValue::Amount(v) => Some(v),
            CurrencyValue::Text(_) => None,
        }
    }
}

impl fmt::Display for CurrencyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CurrencyValue::Amount(v) => write!(f, "{v}"),
            CurrencyValue::Text(s) => f.write_str(s),
        }
    }
}

/// 括号表示负数; 缺少右括号的 `(123.45` 同样为负
pub fn clean_currency(raw: &str) -> CurrencyValue {
    let without_commas = raw.replace(',', "");
    let cleaned = without_commas.trim();

    let (negative, body) = if cleaned.len() >= 2 && cleaned.starts_with('(') && cleaned.ends_with(')')
    {
        (true, &cleaned[1..cleaned.len() - 1])
    } else if let Some(rest) = cleaned.strip_prefix('(') {
        if !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit() || c == '.') {
            (true, rest)
        } else {
            (false, cleaned)
        }
    } else {
        (false, cleaned)
    };

    match BigDecimal::from_str(body) {
        Ok(value) if negative => CurrencyValue::Amount(-value),
        Ok(value) => CurrencyValue::Amount(value),
        Err(_) if body.is_empty() && raw.trim() == "()" => CurrencyValue::Amount(BigDecimal::zero()),
        Err(_) => CurrencyValue::Text(raw.to_string()),
    }
}
