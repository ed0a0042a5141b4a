use crate::api::AppState;
use crate::error::{PipelineError, ReportError};
use crate::models::ReconciliationStatus;
use crate::render::write_workbook;
use crate::service::{Outcome, ReconciliationService, ReportInput};
use crate::source::{load_report, ReportFormat, TextPages};
use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 请求体: base64 编码的 PDF 或已提取的页面文本, 以及可选的对账报表
#[derive(Debug, Default, Deserialize)]
pub struct ReconcileRequest {
    pub pdf_file: Option<String>,
    pub pages: Option<Vec<String>>,
    pub excel_file: Option<String>,
    #[serde(default)]
    pub report_format: ReportFormat,
}

/// 响应体
#[derive(Debug, Serialize)]
pub struct ReconcileResponse {
    pub success: bool,
    pub invoices_rows: usize,
    pub cca_rows: usize,
    pub total_net_due_awb: BigDecimal,
    pub reconciliation: ReconciliationStatus,
    /// base64 编码的 XLSX 工作簿
    pub excel_file: String,
}

/// 错误响应体
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Report(#[from] ReportError),

    #[error("no AWB or CCA data found in the document")]
    NothingToReport,

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("processing task failed: {0}")]
    Internal(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::Report(_) => StatusCode::BAD_REQUEST,
            ApiError::NothingToReport => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Pipeline(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

enum Document {
    Pdf(Vec<u8>),
    Pages(Vec<String>),
}

fn decode(field: &str, value: &str) -> Result<Vec<u8>, ApiError> {
    BASE64
        .decode(value.trim())
        .map_err(|e| ApiError::BadRequest(format!("{field} is not valid base64: {e}")))
}

/// 健康检查
pub async fn health_check() -> &'static str {
    "OK"
}

/// 提取、对账并生成一张发票的工作簿
pub async fn reconcile(
    State(state): State<AppState>,
    Json(req): Json<ReconcileRequest>,
) -> Response {
    match handle(state, req).await {
        Ok(response) => {
            tracing::info!(
                "Reconciled invoice: {} AWB rows, {} CCA rows",
                response.invoices_rows,
                response.cca_rows
            );
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => {
            let status = e.status();
            if status.is_server_error() {
                tracing::error!("Reconcile request failed: {}", e);
            } else {
                tracing::warn!("Reconcile request rejected: {}", e);
            }
            let response = ErrorResponse {
                success: false,
                message: e.to_string(),
            };
            (status, Json(response)).into_response()
        }
    }
}

async fn handle(state: AppState, req: ReconcileRequest) -> Result<ReconcileResponse, ApiError> {
    let document = match (req.pdf_file.as_deref(), req.pages) {
        (Some(pdf), None) => Document::Pdf(decode("pdf_file", pdf)?),
        (None, Some(pages)) => Document::Pages(pages),
        (Some(_), Some(_)) => {
            return Err(ApiError::BadRequest(
                "provide either pdf_file or pages, not both".to_string(),
            ))
        }
        (None, None) => {
            return Err(ApiError::BadRequest(
                "pdf_file or pages is required".to_string(),
            ))
        }
    };
    let report = req
        .excel_file
        .as_deref()
        .map(|b64| decode("excel_file", b64))
        .transpose()?;
    let format = req.report_format;

    let service = state.service.clone();
    tokio::task::spawn_blocking(move || run(&service, document, report, format))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
}

fn run(
    service: &ReconciliationService,
    document: Document,
    report: Option<Vec<u8>>,
    format: ReportFormat,
) -> Result<ReconcileResponse, ApiError> {
    let report = match report {
        Some(bytes) => ReportInput::from_load(load_report(&bytes, format))?,
        None => ReportInput::None,
    };

    let outcome = match document {
        Document::Pdf(bytes) => service.process_pdf(&bytes, report)?,
        Document::Pages(pages) => service.process(&TextPages::new(pages), report),
    };
    let Outcome::Completed(report) = outcome else {
        return Err(ApiError::NothingToReport);
    };

    let workbook = write_workbook(&report).map_err(PipelineError::from)?;
    Ok(ReconcileResponse {
        success: true,
        invoices_rows: report.invoices_rows,
        cca_rows: report.cca_rows,
        total_net_due_awb: report.total_net_due_awb.clone(),
        reconciliation: report.reconciliation_status.clone(),
        excel_file: BASE64.encode(workbook),
    })
}
