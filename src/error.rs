use thiserror::Error;

/// 页面文本源的错误
#[derive(Debug, Error)]
pub enum SourceError {
    /// 文档无法打开或解析
    #[error("document unreadable: {0}")]
    Unreadable(String),

    /// 单页失败; 调用方记录后继续
    #[error("page {index}: {message}")]
    Page { index: usize, message: String },
}

/// 读取或校验对账报表时的错误
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("report is missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("report unreadable: {0}")]
    Unreadable(String),

    #[error("unsupported report format: {0}")]
    UnsupportedFormat(String),
}

/// 处理流程的致命错误, 返回时不产生任何表格
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    SourceUnreadable(#[from] SourceError),

    #[error("workbook rendering failed: {0}")]
    Render(#[from] rust_xlsxwriter::XlsxError),
}
