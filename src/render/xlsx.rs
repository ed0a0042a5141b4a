use bigdecimal::{BigDecimal, ToPrimitive};
use indexmap::IndexSet;
use rust_xlsxwriter::{Color, Format, FormatBorder, Workbook, Worksheet, XlsxError};
use std::collections::HashMap;

use crate::models::{AwbKey, Cell, Table};
use crate::service::assembler::{
    COL_AWB_PREFIX, COL_AWB_SERIAL, COL_CW_INVOICE, COL_CW_REPORT, COL_DIFF_NET_DUE,
    COL_DISCREPANCY, COL_ND_INVOICE, COL_ND_REPORT, COL_NYR_INVOICE, COL_NYR_REPORT,
    METRIC_AVG_RATE, METRIC_INVOICE_COUNT, SHEET_INVOICES, SHEET_RECONCILIATION, SHEET_SUMMARY,
};
use crate::service::ReconciliationReport;

const HEADER_FILL: u32 = 0x2563EB;
const WEIGHT_TOLERANCE: f64 = 0.001;
const RATE_TOLERANCE: f64 = 0.000001;
const AMOUNT_FORMAT: &str = "#,##0.00";
const RATE_FORMAT: &str = "0.00000";
const COUNT_FORMAT: &str = "0";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fill {
    /// 存在差异的行
    Yellow,
    /// 发票与报表不一致的一侧
    LightRed,
    /// 净应付差额非零, 加粗边框
    BrightRed,
    /// 净应付与报表不一致的发票行
    Red,
}

impl Fill {
    fn apply(self, format: Format) -> Format {
        match self {
            Fill::Yellow => format.set_background_color(Color::RGB(0xFFFF00)),
            Fill::LightRed => format.set_background_color(Color::RGB(0xFFC7CE)),
            Fill::BrightRed => format
                .set_background_color(Color::RGB(0xFF0000))
                .set_border(FormatBorder::Thick)
                .set_border_color(Color::Black),
            Fill::Red => format.set_background_color(Color::RGB(0xFF0000)),
        }
    }
}

/// 按 (`Table::rows` 行号, 列号) 索引的填充色
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Highlights {
    cells: HashMap<(usize, usize), Fill>,
}

impl Highlights {
    fn set(&mut self, row: usize, col: usize, fill: Fill) {
        self.cells.insert((row, col), fill);
    }

    fn set_row(&mut self, row: usize, width: usize, fill: Fill) {
        for col in 0..width {
            self.set(row, col, fill);
        }
    }

    pub fn get(&self, row: usize, col: usize) -> Option<Fill> {
        self.cells.get(&(row, col)).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

fn as_f64(cell: &Cell) -> Option<f64> {
    cell.as_number().and_then(BigDecimal::to_f64)
}

/// 两侧都是数值且相差超过 `tolerance`
fn differs(a: &Cell, b: &Cell, tolerance: f64) -> bool {
    match (as_f64(a), as_f64(b)) {
        (Some(a), Some(b)) => (a - b).abs() > tolerance,
        _ => false,
    }
}

pub fn reconciliation_highlights(table: &Table) -> Highlights {
    let mut highlights = Highlights::default();
    let col = |name: &str| table.column_index(name);
    let (
        Some(cw_inv),
        Some(cw_rep),
        Some(nyr_inv),
        Some(nyr_rep),
        Some(nd_inv),
        Some(nd_rep),
        Some(diff),
        Some(flag),
    ) = (
        col(COL_CW_INVOICE),
        col(COL_CW_REPORT),
        col(COL_NYR_INVOICE),
        col(COL_NYR_REPORT),
        col(COL_ND_INVOICE),
        col(COL_ND_REPORT),
        col(COL_DIFF_NET_DUE),
        col(COL_DISCREPANCY),
    )
    else {
        return highlights;
    };

    for (i, row) in table.rows.iter().enumerate() {
        if row.is_total {
            continue;
        }
        let cells = &row.cells;
        if cells[flag] == Cell::Bool(true) {
            highlights.set_row(i, table.columns.len(), Fill::Yellow);
        }
        if differs(&cells[cw_inv], &cells[cw_rep], WEIGHT_TOLERANCE) {
            highlights.set(i, cw_inv, Fill::LightRed);
            highlights.set(i, cw_rep, Fill::LightRed);
        }
        if differs(&cells[nyr_inv], &cells[nyr_rep], RATE_TOLERANCE) {
            highlights.set(i, nyr_inv, Fill::LightRed);
            highlights.set(i, nyr_rep, Fill::LightRed);
        }
        if as_f64(&cells[diff]).is_some_and(|d| d.abs() > WEIGHT_TOLERANCE) {
            highlights.set(i, nd_inv, Fill::LightRed);
            highlights.set(i, nd_rep, Fill::LightRed);
            highlights.set(i, diff, Fill::BrightRed);
        }
    }
    highlights
}

pub fn invoice_highlights(table: &Table, discrepant: &IndexSet<AwbKey>) -> Highlights {
    let mut highlights = Highlights::default();
    if discrepant.is_empty() {
        return highlights;
    }
    let (Some(prefix), Some(serial)) = (
        table.column_index(COL_AWB_PREFIX),
        table.column_index(COL_AWB_SERIAL),
    ) else {
        return highlights;
    };

    for (i, row) in table.rows.iter().enumerate() {
        if row.is_total {
            continue;
        }
        let key = AwbKey::new(
            row.cells[prefix].as_text().unwrap_or_default(),
            row.cells[serial].as_text().unwrap_or_default(),
        );
        if discrepant.contains(&key) {
            highlights.set_row(i, table.columns.len(), Fill::Red);
        }
    }
    highlights
}

fn number_format(table: &Table, row: usize, col: usize) -> &'static str {
    if table.name == SHEET_SUMMARY {
        return match table.rows[row].cells[0].as_text() {
            Some(METRIC_INVOICE_COUNT) => COUNT_FORMAT,
            Some(METRIC_AVG_RATE) => RATE_FORMAT,
            _ => AMOUNT_FORMAT,
        };
    }
    if table.columns[col].contains("Rate") {
        RATE_FORMAT
    } else {
        AMOUNT_FORMAT
    }
}

fn write_table(
    worksheet: &mut Worksheet,
    table: &Table,
    highlights: &Highlights,
) -> Result<(), XlsxError> {
    worksheet.set_name(&table.name)?;

    let header_format = Format::new()
        .set_bold()
        .set_background_color(Color::RGB(HEADER_FILL))
        .set_font_color(Color::White);
    for (col, name) in table.columns.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, name, &header_format)?;
    }

    for (i, row) in table.rows.iter().enumerate() {
        let sheet_row = (i + 1) as u32;
        for col in 0..table.columns.len() {
            let fill = highlights.get(i, col);
            let mut format = Format::new();
            if row.is_total {
                format = format.set_bold();
            }
            if let Some(fill) = fill {
                format = fill.apply(format);
            }
            let sheet_col = col as u16;

            match table.display_cell(row, col) {
                Cell::Empty if row.is_total || fill.is_some() => {
                    worksheet.write_blank(sheet_row, sheet_col, &format)?;
                }
                Cell::Empty => {}
                Cell::Text(s) => {
                    worksheet.write_string_with_format(sheet_row, sheet_col, &s, &format)?;
                }
                Cell::Number(n) => {
                    let format = format.set_num_format(number_format(table, i, col));
                    match n.to_f64() {
                        Some(v) => {
                            worksheet.write_number_with_format(sheet_row, sheet_col, v, &format)?
                        }
                        None => worksheet.write_string_with_format(
                            sheet_row,
                            sheet_col,
                            &n.to_string(),
                            &format,
                        )?,
                    };
                }
                Cell::Bool(b) => {
                    worksheet.write_boolean_with_format(sheet_row, sheet_col, b, &format)?;
                }
            }
        }
    }

    worksheet.autofit();
    worksheet.set_freeze_panes(1, 0)?;
    Ok(())
}

/// 将四张表写入一个工作簿, 包括高亮
pub fn write_workbook(report: &ReconciliationReport) -> Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();
    for table in report.tables() {
        let highlights = match table.name.as_str() {
            SHEET_RECONCILIATION => reconciliation_highlights(table),
            SHEET_INVOICES => invoice_highlights(table, &report.discrepant_keys),
            _ => Highlights::default(),
        };
        write_table(workbook.add_worksheet(), table, &highlights)?;
    }
    let buffer = workbook.save_to_buffer()?;
    tracing::info!("Workbook written: {} bytes", buffer.len());
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExtractionConfig;
    use crate::models::{ReportRow, ReportTable, TOTAL_LABEL};
    use crate::service::{process_document, Outcome, ReportInput};
    use crate::source::TextPages;
    use calamine::{open_workbook_auto_from_rs, Data, Reader};
    use std::io::Cursor;

    const LINE_1: &str =
        "141 1234567 8 TLV JFK 560.00K 1.00 2.00 3.00 4.00 5.00 6.00 7.00 8.00 9.00 100.00 1.00000000 I 100.00";
    const LINE_2: &str =
        "141 7654321 0 TLV DXB 100.00K 1.00 2.00 3.00 4.00 5.00 6.00 7.00 8.00 9.00 50.00 1.00000000 50.00";

    fn report_row(suffix: &str, weight: &str, rate: &str, cost: &str) -> ReportRow {
        ReportRow {
            prefix: "141".into(),
            suffix: suffix.into(),
            charge_weight: weight.into(),
            cost_rate: rate.into(),
            total_cost: cost.into(),
        }
    }

    fn sample_report() -> ReconciliationReport {
        let pages = TextPages::new(vec![
            "cover".into(),
            format!("{LINE_1}\n01JAN25 0.50\n{LINE_2}\n02JAN25 0.50"),
        ]);
        let report = ReportTable::new(vec![
            report_row("12345678", "560", "0.5", "100"),
            report_row("76543210", "90", "0.5", "45"),
        ]);
        match process_document(&pages, ReportInput::Table(report), &ExtractionConfig::default()) {
            Outcome::Completed(report) => *report,
            Outcome::NothingToReport => panic!("expected a report"),
        }
    }

    #[test]
    fn mismatching_pairs_and_differences_are_highlighted() {
        let report = sample_report();
        let table = &report.reconciliation;
        let h = reconciliation_highlights(table);
        let col = |name: &str| table.column_index(name).unwrap();

        // 第一行与报表一致
        assert_eq!(h.get(0, col(COL_DISCREPANCY)), None);

        assert_eq!(h.get(1, col(COL_AWB_PREFIX)), Some(Fill::Yellow));
        assert_eq!(h.get(1, col(COL_CW_INVOICE)), Some(Fill::LightRed));
        assert_eq!(h.get(1, col(COL_NYR_INVOICE)), Some(Fill::Yellow));
        assert_eq!(h.get(1, col(COL_ND_REPORT)), Some(Fill::LightRed));
        assert_eq!(h.get(1, col(COL_DIFF_NET_DUE)), Some(Fill::BrightRed));

        // 合计行从不高亮
        assert_eq!(h.get(2, col(COL_DIFF_NET_DUE)), None);
    }

    #[test]
    fn invoice_rows_with_net_due_differences_are_red() {
        let report = sample_report();
        let h = invoice_highlights(&report.invoices, &report.discrepant_keys);
        assert_eq!(h.get(0, 0), None);
        assert_eq!(h.get(1, 0), Some(Fill::Red));
        assert!(invoice_highlights(&report.invoices, &IndexSet::new()).is_empty());
    }

    #[test]
    fn workbook_has_four_sheets_in_order_with_labelled_totals() {
        let report = sample_report();
        let bytes = write_workbook(&report).unwrap();

        let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes)).unwrap();
        assert_eq!(
            workbook.sheet_names(),
            vec!["Summary", "Reconciliation", "Invoices", "CCA"]
        );

        let range = workbook.worksheet_range("Reconciliation").unwrap();
        assert_eq!(range.get_value((0, 0)), Some(&Data::String("AWB Prefix".into())));
        assert_eq!(range.get_value((3, 0)), Some(&Data::String(TOTAL_LABEL.into())));
        assert_eq!(range.get_value((2, 9)), Some(&Data::Bool(true)));

        let cca = workbook.worksheet_range("CCA").unwrap();
        assert_eq!(cca.height(), 1);
    }
}
