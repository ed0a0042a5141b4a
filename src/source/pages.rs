use lopdf::content::Content;
use lopdf::{Document, ObjectId};

use crate::error::SourceError;
use crate::source::layout::{assemble_lines, text_runs, Spacing};

/// 普通模式下判定词间隔的水平容差
const PLAIN_X_TOLERANCE: f32 = 3.0;

/// 从文档中提取页面文本的方式
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ExtractMode {
    /// 保留列间距; 间隔小于 `x_tolerance` 的字符并为一个词
    Layout { x_tolerance: f32 },
    /// 按阅读顺序输出, 空白归一化
    Plain,
}

/// 按页索引的文本来源
pub trait PageSource {
    fn page_count(&self) -> usize;

    fn extract_text(&self, index: usize, mode: ExtractMode) -> Result<String, SourceError>;
}

/// 已在上游提取好文本的页面
#[derive(Debug, Clone, Default)]
pub struct TextPages {
    pages: Vec<String>,
}

impl TextPages {
    pub fn new(pages: Vec<String>) -> Self {
        Self { pages }
    }
}

impl PageSource for TextPages {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn extract_text(&self, index: usize, _mode: ExtractMode) -> Result<String, SourceError> {
        self.pages.get(index).cloned().ok_or(SourceError::Page {
            index,
            message: "page out of range".to_string(),
        })
    }
}

/// 内存中的 PDF. 从内容流重建文本行, 两种模式只在词间距处理上不同
pub struct PdfPages {
    doc: Document,
    /// 按文档顺序排列的页面对象
    page_ids: Vec<ObjectId>,
}

impl PdfPages {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SourceError> {
        let doc = Document::load_mem(bytes).map_err(|e| SourceError::Unreadable(e.to_string()))?;
        let page_ids = doc.get_pages().into_values().collect();
        Ok(Self { doc, page_ids })
    }
}

impl PageSource for PdfPages {
    fn page_count(&self) -> usize {
        self.page_ids.len()
    }

    fn extract_text(&self, index: usize, mode: ExtractMode) -> Result<String, SourceError> {
        let page_error = |message: String| SourceError::Page { index, message };
        let page_id = self
            .page_ids
            .get(index)
            .ok_or_else(|| page_error("page out of range".to_string()))?;
        let raw = self
            .doc
            .get_page_content(*page_id)
            .map_err(|e| page_error(e.to_string()))?;
        let content = Content::decode(&raw).map_err(|e| page_error(e.to_string()))?;

        let spacing = match mode {
            ExtractMode::Layout { x_tolerance } => Spacing::Layout { x_tolerance },
            ExtractMode::Plain => Spacing::Single {
                x_tolerance: PLAIN_X_TOLERANCE,
            },
        };
        Ok(assemble_lines(text_runs(&content), spacing))
    }
}
