use bigdecimal::BigDecimal;
use indexmap::IndexSet;
use serde::Serialize;

use crate::config::ExtractionConfig;
use crate::error::{PipelineError, ReportError};
use crate::models::{AwbKey, CcaRecord, InvoiceLine, ReconciliationStatus, ReportTable, Table};
use crate::normalize::format_cca_date;
use crate::parser::{extract_sections, parse_awb_lines, parse_cca_text};
use crate::service::assembler::{
    cca_table, invoices_table, reconciliation_table, SummaryFigures, COL_NET_DUE,
};
use crate::service::reconciler::reconcile;
use crate::source::{PageSource, PdfPages};

/// 传入一次运行的对账报表 (按读取结果)
#[derive(Debug, Clone, Default)]
pub enum ReportInput {
    #[default]
    None,
    Table(ReportTable),
    /// 报表可读, 但缺少这些必需列
    MissingColumns(Vec<String>),
}

impl From<Option<ReportTable>> for ReportInput {
    fn from(table: Option<ReportTable>) -> Self {
        table.map(ReportInput::Table).unwrap_or_default()
    }
}

impl ReportInput {
    /// 将读取结果转为输入, 只有缺列可以恢复
    pub fn from_load(result: Result<ReportTable, ReportError>) -> Result<Self, ReportError> {
        match result {
            Ok(table) => Ok(ReportInput::Table(table)),
            Err(ReportError::MissingColumns(cols)) => Ok(ReportInput::MissingColumns(cols)),
            Err(e) => Err(e),
        }
    }
}

/// 一次运行的全部产出
#[derive(Debug, Clone, Serialize)]
pub struct ReconciliationReport {
    pub summary: Table,
    pub reconciliation: Table,
    pub invoices: Table,
    pub cca: Table,
    /// 净应付与报表不一致的运单号
    pub discrepant_keys: IndexSet<AwbKey>,
    pub invoices_rows: usize,
    pub cca_rows: usize,
    pub total_net_due_awb: BigDecimal,
    pub reconciliation_status: ReconciliationStatus,
}

impl ReconciliationReport {
    /// 按工作表顺序排列的表格
    pub fn tables(&self) -> [&Table; 4] {
        [&self.summary, &self.reconciliation, &self.invoices, &self.cca]
    }
}

#[derive(Debug, Clone)]
pub enum Outcome {
    Completed(Box<ReconciliationReport>),
    /// 没有找到运单或 CCA 记录
    NothingToReport,
}

/// 对一个文档执行完整的提取与对账
pub fn process_document(
    source: &dyn PageSource,
    report: ReportInput,
    config: &ExtractionConfig,
) -> Outcome {
    // 阶段1: 提取两个区域的文本
    let sections = extract_sections(source, config);

    // 阶段2: 解析记录
    let awb_records = parse_awb_lines(&sections.awb_lines);
    let mut cca_records: Vec<CcaRecord> = match sections.cca_text.as_deref() {
        Some(text) => parse_cca_text(text),
        None => {
            tracing::info!("No CCA section in document");
            Vec::new()
        }
    };

    if awb_records.is_empty() && cca_records.is_empty() {
        tracing::warn!("No AWB or CCA data extracted, nothing to report");
        return Outcome::NothingToReport;
    }

    // 阶段3: 规范化
    let invoice_lines: Vec<InvoiceLine> = awb_records.iter().map(InvoiceLine::from).collect();
    let unparsed_dates = invoice_lines.iter().filter(|l| !l.flight_date_parsed).count();
    if unparsed_dates > 0 {
        tracing::warn!(
            "{} of {} flight dates could not be parsed and were kept as extracted",
            unparsed_dates,
            invoice_lines.len()
        );
    }
    for record in &mut cca_records {
        record.issue_date = format_cca_date(&record.issue_date);
    }

    // 阶段4: 有可比数据时与报表对账
    let (status, reconciliation) = match report {
        ReportInput::None => (ReconciliationStatus::SkippedNoReport, None),
        ReportInput::MissingColumns(cols) => {
            tracing::warn!("Report is missing required columns {:?}, skipping reconciliation", cols);
            (ReconciliationStatus::SkippedMissingColumns(cols), None)
        }
        ReportInput::Table(table) if table.is_empty() => {
            tracing::info!("Report has no rows, skipping reconciliation");
            (ReconciliationStatus::SkippedEmptyReport, None)
        }
        ReportInput::Table(_) if invoice_lines.is_empty() => {
            tracing::info!("No AWB data to reconcile");
            (ReconciliationStatus::SkippedNoInvoiceData, None)
        }
        ReportInput::Table(table) => {
            (ReconciliationStatus::Completed, Some(reconcile(&invoice_lines, &table)))
        }
    };

    // 阶段5: 组装输出表格
    let recon_table = reconciliation_table(
        reconciliation.as_ref().map(|r| r.rows.as_slice()).unwrap_or_default(),
    );
    let invoices = invoices_table(&invoice_lines);
    let cca = cca_table(&cca_records);
    let figures = SummaryFigures::from_tables(
        &invoices,
        reconciliation.as_ref().map(|_| &recon_table),
    );

    let report = ReconciliationReport {
        summary: figures.to_table(),
        reconciliation: recon_table,
        discrepant_keys: reconciliation
            .as_ref()
            .map(|r| r.net_due_discrepancies())
            .unwrap_or_default(),
        invoices_rows: invoices.data_row_count(),
        cca_rows: cca.data_row_count(),
        total_net_due_awb: invoices.column_sum(COL_NET_DUE),
        invoices,
        cca,
        reconciliation_status: status,
    };
    tracing::info!(
        "Processed document: {} invoice rows, {} CCA rows, reconciliation {:?}",
        report.invoices_rows,
        report.cca_rows,
        report.reconciliation_status
    );
    Outcome::Completed(Box::new(report))
}

/// 绑定提取配置的处理服务
pub struct ReconciliationService {
    config: ExtractionConfig,
}

impl ReconciliationService {
    pub fn new(config: ExtractionConfig) -> Self {
        Self { config }
    }

    pub fn process(&self, source: &dyn PageSource, report: ReportInput) -> Outcome {
        process_document(source, report, &self.config)
    }

    /// 打开并处理 PDF, 文档不可读时直接失败
    pub fn process_pdf(&self, bytes: &[u8], report: ReportInput) -> Result<Outcome, PipelineError> {
        let pages = PdfPages::from_bytes(bytes).map_err(|e| {
            tracing::error!("Could not open invoice PDF: {}", e);
            e
        })?;
        tracing::info!("Opened invoice PDF with {} pages", pages.page_count());
        Ok(self.process(&pages, report))
    }
}
