use std::ops::Range;

use crate::config::ExtractionConfig;
use crate::source::{ExtractMode, PageSource};

/// CCA 章节的起始位置 (如果有)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CcaLocation {
    Found(usize),
    Absent,
}

/// 发票文档的页面划分, 第 0 页 (封面) 不属于任何区域
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionLayout {
    pub awb_pages: Range<usize>,
    pub cca: CcaLocation,
}

/// 两个区域收集到的文本
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionText {
    /// 所有运单页的原始行, 按页序
    pub awb_lines: Vec<String>,
    /// CCA 页全文; 没有该章节时为 `None`
    pub cca_text: Option<String>,
}

/// 从第 1 页开始查找第一个包含 `marker` 的页面
pub fn locate_sections(source: &dyn PageSource, marker: &str) -> SectionLayout {
    let page_count = source.page_count();
    for index in 1..page_count {
        match source.extract_text(index, ExtractMode::Plain) {
            Ok(text) if text.contains(marker) => {
                tracing::info!("Found '{}' on page {}, AWB data ends before it", marker, index + 1);
                return SectionLayout {
                    awb_pages: 1..index,
                    cca: CcaLocation::Found(index),
                };
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!("Error checking page {} for section marker: {}", index + 1, e);
            }
        }
    }

    tracing::info!("'{}' not found, AWB data runs to the end of the document", marker);
    SectionLayout {
        awb_pages: 1..page_count.max(1),
        cca: CcaLocation::Absent,
    }
}

/// 定位两个区域并提取文本, 失败的页面记录日志后跳过
pub fn extract_sections(source: &dyn PageSource, config: &ExtractionConfig) -> SectionText {
    let layout = locate_sections(source, &config.section_marker);
    tracing::info!("AWB target pages (0-based): {:?}", layout.awb_pages);

    let awb_mode = ExtractMode::Layout {
        x_tolerance: config.layout_x_tolerance,
    };
    let mut awb_lines = Vec::new();
    for index in layout.awb_pages.clone() {
        match source.extract_text(index, awb_mode) {
            Ok(text) if text.is_empty() => {
                tracing::info!("No text extracted from page {}", index + 1);
            }
            Ok(text) => {
                let before = awb_lines.len();
                awb_lines.extend(text.split('\n').map(str::to_string));
                tracing::debug!("Extracted {} lines from page {}", awb_lines.len() - before, index + 1);
            }
            Err(e) => {
                tracing::warn!("Error extracting text from page {}: {}", index + 1, e);
            }
        }
    }
    tracing::info!("Total text lines collected from AWB pages: {}", awb_lines.len());

    let cca_text = match layout.cca {
        CcaLocation::Found(index) => match source.extract_text(index, ExtractMode::Plain) {
            Ok(text) => Some(text),
            Err(e) => {
                tracing::warn!("Error extracting text from CCA page {}: {}", index + 1, e);
                Some(String::new())
            }
        },
        CcaLocation::Absent => None,
    };

    SectionText { awb_lines, cca_text }
}
