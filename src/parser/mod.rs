pub mod awb;
pub mod cca;
pub mod sections;

pub use awb::{parse_awb_lines, step, Step};
pub use cca::parse_cca_text;
pub use sections::{extract_sections, locate_sections, CcaLocation, SectionLayout, SectionText};
