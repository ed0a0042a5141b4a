pub mod xlsx;

pub use xlsx::{invoice_highlights, reconciliation_highlights, write_workbook, Fill, Highlights};
