use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::ReportError;

pub const COL_PREFIX: &str = "awbprefix";
pub const COL_SUFFIX: &str = "awbsuffix";
pub const COL_CHARGE_WEIGHT: &str = "chargewt";
pub const COL_COST_RATE: &str = "frt_cost_rate";
pub const COL_TOTAL_COST: &str = "total_cost";

/// 报表必须包含的列 (去除空白后不区分大小写匹配)
pub const REQUIRED_COLUMNS: [&str; 5] = [
    COL_PREFIX,
    COL_SUFFIX,
    COL_CHARGE_WEIGHT,
    COL_COST_RATE,
    COL_TOTAL_COST,
];

/// 报表中的一行, 保留导出时的原始值
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRow {
    pub prefix: String,
    pub suffix: String,
    pub charge_weight: String,
    pub cost_rate: String,
    pub total_cost: String,
}

/// 只保留对账所需列的报表
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportTable {
    pub rows: Vec<ReportRow>,
}

impl ReportTable {
    pub fn new(rows: Vec<ReportRow>) -> Self {
        Self { rows }
    }

    /// 由表头 + 数据行构建, 缺失的必需列全部报告
    pub fn from_records<H, R, C>(headers: &[H], rows: R) -> Result<Self, ReportError>
    where
        H: AsRef<str>,
        R: IntoIterator<Item = Vec<C>>,
        C: AsRef<str>,
    {
        let positions: HashMap<String, usize> = headers
            .iter()
            .enumerate()
            .map(|(i, h)| (h.as_ref().trim().to_lowercase(), i))
            .collect();

        let missing: Vec<String> = REQUIRED_COLUMNS
            .iter()
            .filter(|c| !positions.contains_key(**c))
            .map(|c| c.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(ReportError::MissingColumns(missing));
        }

        let idx = |name: &str| positions[name];
        let (p, s, w, r, t) = (
            idx(COL_PREFIX),
            idx(COL_SUFFIX),
            idx(COL_CHARGE_WEIGHT),
            idx(COL_COST_RATE),
            idx(COL_TOTAL_COST),
        );

        let rows = rows
            .into_iter()
            .map(|cells| {
                let get = |i: usize| {
                    cells
                        .get(i)
                        .map(|c| c.as_ref().to_string())
                        .unwrap_or_default()
                };
                ReportRow {
                    prefix: get(p),
                    suffix: get(s),
                    charge_weight: get(w),
                    cost_rate: get(r),
                    total_cost: get(t),
                }
            })
            .collect();

        Ok(Self { rows })
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }
}
