pub mod awb;
pub mod cca;
pub mod reconciliation;
pub mod report;
pub mod table;

pub use awb::{AwbKey, AwbRecord, InvoiceLine, AWB_ORIGIN, AWB_PREFIX, EXCHANGE_RATE_ANCHOR};
pub use cca::{CcaGroup, CcaRecord, CCA_GROUP_COUNT};
pub use reconciliation::{ReconciliationRow, ReconciliationStatus};
pub use report::{ReportRow, ReportTable, REQUIRED_COLUMNS};
pub use table::{Aggregation, Cell, Row, Table, TOTAL_LABEL};
