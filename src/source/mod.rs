pub mod layout;
pub mod pages;
pub mod report;

pub use layout::{assemble_lines, text_runs, Spacing, TextRun};
pub use pages::{ExtractMode, PageSource, PdfPages, TextPages};
pub use report::{load_report, ReportFormat};
