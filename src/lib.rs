pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod normalize;
pub mod parser;
pub mod render;
pub mod service;
pub mod source;

pub use config::AppConfig;
pub use error::{PipelineError, ReportError, SourceError};
pub use service::{process_document, Outcome, ReconciliationReport, ReconciliationService, ReportInput};
