pub mod assembler;
pub mod pipeline;
pub mod reconciler;

pub use assembler::SummaryFigures;
pub use pipeline::{process_document, Outcome, ReconciliationReport, ReconciliationService, ReportInput};
pub use reconciler::{reconcile, Reconciliation};
