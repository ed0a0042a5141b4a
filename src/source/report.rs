use calamine::{open_workbook_auto_from_rs, Data, Reader};
use serde::{Deserialize, Serialize};
use std::io::Cursor;

use crate::error::ReportError;
use crate::models::ReportTable;

/// 上传报表的文件格式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// xlsx / xls / ods, 按内容识别
    #[default]
    Xlsx,
    Csv,
}

/// 读取第一个工作表 (或 CSV 正文), 首行为表头
pub fn load_report(bytes: &[u8], format: ReportFormat) -> Result<ReportTable, ReportError> {
    let (headers, rows) = match format {
        ReportFormat::Xlsx => read_workbook(bytes)?,
        ReportFormat::Csv => read_csv(bytes)?,
    };
    tracing::info!(
        "Loaded report with {} rows and columns: {:?}",
        rows.len(),
        headers
    );
    ReportTable::from_records(&headers, rows)
}

fn read_workbook(bytes: &[u8]) -> Result<(Vec<String>, Vec<Vec<String>>), ReportError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|e| ReportError::Unreadable(e.to_string()))?;
    let sheet = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| ReportError::Unreadable("workbook has no sheets".to_string()))?;
    let range = workbook
        .worksheet_range(&sheet)
        .map_err(|e| ReportError::Unreadable(format!("sheet {sheet}: {e}")))?;

    let mut rows = range.rows().map(|row| row.iter().map(cell_text).collect::<Vec<_>>());
    let headers = rows.next().unwrap_or_default();
    let body = rows
        .filter(|r| r.iter().any(|c| !c.is_empty()))
        .collect();
    Ok((headers, body))
}

fn read_csv(bytes: &[u8]) -> Result<(Vec<String>, Vec<Vec<String>>), ReportError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(bytes);
    let headers = reader
        .headers()
        .map_err(|e| ReportError::Unreadable(e.to_string()))?
        .iter()
        .map(str::to_string)
        .collect();
    let mut body = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| ReportError::Unreadable(e.to_string()))?;
        body.push(record.iter().map(str::to_string).collect());
    }
    Ok((headers, body))
}

/// 单元格的纯文本. 浮点数不强制带小数 (`141.0` -> `141`)
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}
