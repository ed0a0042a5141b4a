use bigdecimal::{BigDecimal, Zero};
use serde::Serialize;

/// 渲染时写入合计行标签列的文字
pub const TOTAL_LABEL: &str = "Total";

/// 输出表格的单元格
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Empty,
    Text(String),
    Number(BigDecimal),
    Bool(bool),
}

impl Cell {
    pub fn text(value: impl Into<String>) -> Self {
        Cell::Text(value.into())
    }

    pub fn number(value: Option<BigDecimal>) -> Self {
        value.map(Cell::Number).unwrap_or(Cell::Empty)
    }

    pub fn as_number(&self) -> Option<&BigDecimal> {
        match self {
            Cell::Number(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Row {
    pub cells: Vec<Cell>,
    /// 合成的合计行, 不计入数据
    pub is_total: bool,
}

/// 列在合计行中的汇总方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregation {
    /// 数值求和, 跳过空值和文本
    Sum,
    /// 全部为数值时才求和, 否则留空
    SumIfAllNumeric,
}

impl Aggregation {
    fn apply<'a>(self, cells: impl Iterator<Item = &'a Cell>) -> Cell {
        let mut total = BigDecimal::zero();
        for cell in cells {
            match cell {
                Cell::Number(n) => total += n,
                _ if self == Aggregation::SumIfAllNumeric => return Cell::Empty,
                _ => {}
            }
        }
        Cell::Number(total)
    }
}

/// 带名称的有序行列数据, 用于写入工作表
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Table {
    pub name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
    /// 渲染时放置合计标签的列
    pub label_column: usize,
}

impl Table {
    pub fn new(name: &str, columns: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: Vec::new(),
            label_column: 0,
        }
    }

    pub fn with_label_column(mut self, column: &str) -> Self {
        if let Some(idx) = self.column_index(column) {
            self.label_column = idx;
        }
        self
    }

    pub fn push_row(&mut self, cells: Vec<Cell>) {
        debug_assert_eq!(cells.len(), self.columns.len());
        self.rows.push(Row {
            cells,
            is_total: false,
        });
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn data_rows(&self) -> impl Iterator<Item = &Row> {
        self.rows.iter().filter(|r| !r.is_total)
    }

    pub fn data_row_count(&self) -> usize {
        self.data_rows().count()
    }

    pub fn total_row(&self) -> Option<&Row> {
        self.rows.iter().find(|r| r.is_total)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// 仅对数据行求列和
    pub fn column_sum(&self, name: &str) -> BigDecimal {
        let Some(idx) = self.column_index(name) else {
            return BigDecimal::zero();
        };
        let mut total = BigDecimal::zero();
        for row in self.data_rows() {
            if let Some(n) = row.cells[idx].as_number() {
                total += n;
            }
        }
        total
    }

    /// 生成同形的合计行, 未指定汇总方式的列留空
    pub fn aggregate_row(&self, aggregations: &[(&str, Aggregation)]) -> Row {
        let mut cells = vec![Cell::Empty; self.columns.len()];
        for (column, aggregation) in aggregations {
            let Some(idx) = self.column_index(column) else {
                continue;
            };
            cells[idx] = aggregation.apply(self.data_rows().map(|r| &r.cells[idx]));
        }
        Row {
            cells,
            is_total: true,
        }
    }

    /// 追加一次合计行. 没有数据行、已有合计行或没有任何列得出数值时跳过
    pub fn append_totals(&mut self, aggregations: &[(&str, Aggregation)]) -> bool {
        if self.data_row_count() == 0 || self.total_row().is_some() {
            return false;
        }
        let row = self.aggregate_row(aggregations);
        if !row.cells.iter().any(|c| matches!(c, Cell::Number(_))) {
            return false;
        }
        self.rows.push(row);
        true
    }

    /// 展示用单元格: 合计行在 `label_column` 显示标签
    pub fn display_cell(&self, row: &Row, col: usize) -> Cell {
        if row.is_total && col == self.label_column {
            return Cell::text(TOTAL_LABEL);
        }
        row.cells[col].clone()
    }
}
