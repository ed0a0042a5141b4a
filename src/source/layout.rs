//! 从页面内容流重建文本行 (按基线聚类, 按 x 排序)

use lopdf::content::{Content, Operation};
use lopdf::Object;

/// 平均字形宽度 (em 比例), 没有字体度量时用来估算文本宽度
const AVG_GLYPH_WIDTH: f32 = 0.5;
/// 基线差在此范围内视为同一行
const Y_TOLERANCE: f32 = 3.0;

type Matrix = [f32; 6];

const IDENTITY: Matrix = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

/// a × b (PDF 行向量约定)
fn multiply(a: &Matrix, b: &Matrix) -> Matrix {
    [
        a[0] * b[0] + a[1] * b[2],
        a[0] * b[1] + a[1] * b[3],
        a[2] * b[0] + a[3] * b[2],
        a[2] * b[1] + a[3] * b[3],
        a[4] * b[0] + a[5] * b[2] + b[4],
        a[4] * b[1] + a[5] * b[3] + b[5],
    ]
}

fn translation(tx: f32, ty: f32) -> Matrix {
    [1.0, 0.0, 0.0, 1.0, tx, ty]
}

/// 页面上一段连续绘制的文本 (用户空间坐标)
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    /// 估算的单个字符宽度, 用于把间距换算成空格数
    pub char_width: f32,
    pub text: String,
}

impl TextRun {
    fn end(&self) -> f32 {
        self.x + self.width
    }
}

/// 行内两段文本之间的连接方式
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Spacing {
    /// 间距超过 `x_tolerance` 时按间距宽度补空格, 保留列对齐
    Layout { x_tolerance: f32 },
    /// 间距超过 `x_tolerance` 时只补一个空格
    Single { x_tolerance: f32 },
}

#[derive(Debug, Clone)]
struct TextState {
    ctm: Matrix,
    stack: Vec<Matrix>,
    text_matrix: Matrix,
    line_matrix: Matrix,
    font_size: f32,
    leading: f32,
    char_spacing: f32,
    word_spacing: f32,
    horiz_scale: f32,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            ctm: IDENTITY,
            stack: Vec::new(),
            text_matrix: IDENTITY,
            line_matrix: IDENTITY,
            font_size: 0.0,
            leading: 0.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            horiz_scale: 1.0,
        }
    }
}

impl TextState {
    fn translate_line(&mut self, tx: f32, ty: f32) {
        self.line_matrix = multiply(&translation(tx, ty), &self.line_matrix);
        self.text_matrix = self.line_matrix;
    }

    fn origin(&self) -> (f32, f32) {
        let m = multiply(&self.text_matrix, &self.ctm);
        (m[4], m[5])
    }

    fn scale(&self) -> f32 {
        let m = multiply(&self.text_matrix, &self.ctm);
        m[0].hypot(m[1])
    }

    /// 文本空间中的水平位移
    fn advance(&self, text: &str) -> f32 {
        text.chars()
            .map(|c| {
                let word = if c == ' ' { self.word_spacing } else { 0.0 };
                (AVG_GLYPH_WIDTH * self.font_size + self.char_spacing + word) * self.horiz_scale
            })
            .sum()
    }

    fn show(&mut self, text: String, runs: &mut Vec<TextRun>) {
        if text.is_empty() {
            return;
        }
        let (x, y) = self.origin();
        let char_width = AVG_GLYPH_WIDTH * self.font_size * self.horiz_scale * self.scale();
        let dx = self.advance(&text);
        self.shift(dx);
        let (end, _) = self.origin();
        if !text.trim().is_empty() {
            runs.push(TextRun {
                x,
                y,
                width: end - x,
                char_width,
                text,
            });
        }
    }

    fn shift(&mut self, dx: f32) {
        self.text_matrix = multiply(&translation(dx, 0.0), &self.text_matrix);
    }
}

fn number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r as f32),
        _ => None,
    }
}

fn numbers<const N: usize>(operands: &[Object]) -> Option<[f32; N]> {
    let mut out = [0.0; N];
    for (slot, obj) in out.iter_mut().zip(operands) {
        *slot = number(obj)?;
    }
    (operands.len() >= N).then_some(out)
}

/// UTF-16BE (带 BOM) 或按单字节编码解码
fn decode_string(obj: &Object) -> Option<String> {
    let Object::String(bytes, _) = obj else {
        return None;
    };
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let units: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return Some(String::from_utf16_lossy(&units));
    }
    Some(bytes.iter().map(|&b| b as char).collect())
}

/// 遍历内容流操作, 记录每次文本绘制的位置
pub fn text_runs(content: &Content<Vec<Operation>>) -> Vec<TextRun> {
    let mut state = TextState::default();
    let mut runs = Vec::new();

    for op in &content.operations {
        let operands = op.operands.as_slice();
        match op.operator.as_str() {
            "q" => state.stack.push(state.ctm),
            "Q" => {
                if let Some(ctm) = state.stack.pop() {
                    state.ctm = ctm;
                }
            }
            "cm" => {
                if let Some(m) = numbers::<6>(operands) {
                    state.ctm = multiply(&m, &state.ctm);
                }
            }
            "BT" => {
                state.text_matrix = IDENTITY;
                state.line_matrix = IDENTITY;
            }
            "Tf" => {
                if let Some(size) = operands.get(1).and_then(number) {
                    state.font_size = size;
                }
            }
            "Tm" => {
                if let Some(m) = numbers::<6>(operands) {
                    state.text_matrix = m;
                    state.line_matrix = m;
                }
            }
            "Td" => {
                if let Some([tx, ty]) = numbers::<2>(operands) {
                    state.translate_line(tx, ty);
                }
            }
            "TD" => {
                if let Some([tx, ty]) = numbers::<2>(operands) {
                    state.leading = -ty;
                    state.translate_line(tx, ty);
                }
            }
            "T*" => state.translate_line(0.0, -state.leading),
            "TL" => {
                if let Some([v]) = numbers::<1>(operands) {
                    state.leading = v;
                }
            }
            "Tc" => {
                if let Some([v]) = numbers::<1>(operands) {
                    state.char_spacing = v;
                }
            }
            "Tw" => {
                if let Some([v]) = numbers::<1>(operands) {
                    state.word_spacing = v;
                }
            }
            "Tz" => {
                if let Some([v]) = numbers::<1>(operands) {
                    state.horiz_scale = v / 100.0;
                }
            }
            "Tj" => {
                if let Some(text) = operands.first().and_then(decode_string) {
                    state.show(text, &mut runs);
                }
            }
            "'" => {
                state.translate_line(0.0, -state.leading);
                if let Some(text) = operands.first().and_then(decode_string) {
                    state.show(text, &mut runs);
                }
            }
            "\"" => {
                if let Some([aw, ac]) = numbers::<2>(operands) {
                    state.word_spacing = aw;
                    state.char_spacing = ac;
                }
                state.translate_line(0.0, -state.leading);
                if let Some(text) = operands.get(2).and_then(decode_string) {
                    state.show(text, &mut runs);
                }
            }
            "TJ" => {
                let Some(Object::Array(items)) = operands.first() else {
                    continue;
                };
                // 每个字符串单独成段, 数字调整只移动位置, 由行拼接决定是否补空格
                for item in items {
                    match decode_string(item) {
                        Some(text) => state.show(text, &mut runs),
                        None => {
                            if let Some(adj) = number(item) {
                                state.shift(-adj / 1000.0 * state.font_size * state.horiz_scale);
                            }
                        }
                    }
                }
            }
            _ => {}
        }
    }
    runs
}

/// 按基线把文本段聚成行 (自上而下), 行内按 x 拼接
pub fn assemble_lines(mut runs: Vec<TextRun>, spacing: Spacing) -> String {
    runs.sort_by(|a, b| b.y.total_cmp(&a.y).then(a.x.total_cmp(&b.x)));

    let mut lines: Vec<Vec<TextRun>> = Vec::new();
    for run in runs {
        match lines.last_mut() {
            Some(line) if (line[0].y - run.y).abs() <= Y_TOLERANCE => line.push(run),
            _ => lines.push(vec![run]),
        }
    }

    lines
        .into_iter()
        .map(|mut line| {
            line.sort_by(|a, b| a.x.total_cmp(&b.x));
            join_line(&line, spacing)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn join_line(line: &[TextRun], spacing: Spacing) -> String {
    let mut out = String::new();
    let mut prev: Option<&TextRun> = None;
    for run in line {
        if let Some(prev) = prev {
            let gap = run.x - prev.end();
            match spacing {
                Spacing::Layout { x_tolerance } if gap > x_tolerance => {
                    let width = prev.char_width.max(f32::EPSILON);
                    let count = ((gap / width).round() as usize).max(1);
                    out.extend(std::iter::repeat(' ').take(count));
                }
                Spacing::Single { x_tolerance } if gap > x_tolerance => out.push(' '),
                _ => {}
            }
        }
        out.push_str(&run.text);
        prev = Some(run);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(x: f32, y: f32, text: &str) -> TextRun {
        TextRun {
            x,
            y,
            width: text.len() as f32 * 5.0,
            char_width: 5.0,
            text: text.to_string(),
        }
    }

    #[test]
    fn runs_on_one_baseline_form_one_line_in_x_order() {
        let runs = vec![
            run(100.0, 700.0, "TLV"),
            run(10.0, 700.5, "141"),
            run(10.0, 680.0, "01JAN25"),
            run(40.0, 699.0, "1234567"),
        ];
        let text = assemble_lines(runs, Spacing::Single { x_tolerance: 2.0 });
        assert_eq!(text, "141 1234567 TLV\n01JAN25");
    }

    #[test]
    fn tolerance_decides_whether_a_gap_is_a_word_break() {
        // "560.00" 结束于 30.0, "K" 在其后 1 个单位开始
        let runs = vec![run(0.0, 100.0, "560.00"), run(31.0, 100.0, "K")];
        assert_eq!(
            assemble_lines(runs.clone(), Spacing::Layout { x_tolerance: 2.0 }),
            "560.00K"
        );
        assert_eq!(
            assemble_lines(runs, Spacing::Layout { x_tolerance: 0.5 }),
            "560.00 K"
        );
    }

    #[test]
    fn layout_spacing_scales_with_the_gap() {
        let runs = vec![run(0.0, 100.0, "141"), run(40.0, 100.0, "X")];
        assert_eq!(
            assemble_lines(runs, Spacing::Layout { x_tolerance: 2.0 }),
            format!("141{}X", " ".repeat(5))
        );
    }

    #[test]
    fn positioning_operators_place_runs() {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 10.into()]),
                Operation::new("Td", vec![50.into(), 700.into()]),
                Operation::new("Tj", vec![Object::string_literal("141")]),
                Operation::new("Td", vec![0.into(), (-14).into()]),
                Operation::new("Tj", vec![Object::string_literal("01JAN25")]),
                Operation::new("ET", vec![]),
                Operation::new("BT", vec![]),
                Operation::new("Tm", vec![1.into(), 0.into(), 0.into(), 1.into(), 90.into(), 700.into()]),
                Operation::new(
                    "TJ",
                    vec![Object::Array(vec![
                        Object::string_literal("12345"),
                        Object::Integer(-400),
                        Object::string_literal("67"),
                    ])],
                ),
                Operation::new("ET", vec![]),
            ],
        };
        let runs = text_runs(&content);
        assert_eq!(runs.len(), 4);
        assert_eq!((runs[0].x, runs[0].y), (50.0, 700.0));
        assert_eq!((runs[1].x, runs[1].y), (50.0, 686.0));
        // 12345 前进 25 个单位, 字距调整再加 4
        assert!((runs[3].x - 119.0).abs() < 0.01);

        let text = assemble_lines(runs, Spacing::Layout { x_tolerance: 2.0 });
        assert_eq!(text, format!("141{}12345 67\n01JAN25", " ".repeat(5)));
    }
}
