//! 两列对齐的编号表格，宽字符（中日韩）按两个终端单元计算

use crate::error::{Error, Result};
use std::io::Write;
use std::str::FromStr;

/// 单列宽度上限
pub const MAX_COLUMN_WIDTH: usize = 30;
/// 终端过窄时的单列宽度下限
pub const MIN_COLUMN_WIDTH: usize = 8;
/// 序号列宽度
const INDEX_WIDTH: usize = 4;

/// 是否为占两个单元的宽字符
///
/// 覆盖 Hangul Jamo、CJK 部首到注音/片假名扩展、以及 CJK 扩展 A 到统一汉字区。
pub fn is_wide(c: char) -> bool {
    matches!(c, '\u{1100}'..='\u{11FF}' | '\u{2E80}'..='\u{31FF}' | '\u{3400}'..='\u{9FFF}')
}

/// 字符串在终端中的显示宽度：字符数加上宽字符数
pub fn display_width(s: &str) -> usize {
    s.chars().map(|c| if is_wide(c) { 2 } else { 1 }).sum()
}

/// 对齐方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    Left,
    Right,
    Center,
}

impl FromStr for Alignment {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "<" | "left" => Ok(Alignment::Left),
            ">" | "right" => Ok(Alignment::Right),
            "^" | "center" => Ok(Alignment::Center),
            other => Err(Error::InvalidAlignment(other.to_string())),
        }
    }
}

/// 按显示宽度填充到 `width`，过长的字符串原样返回（不截断）
pub fn pad(s: &str, width: usize, align: Alignment) -> String {
    let current = display_width(s);
    if current >= width {
        return s.to_string();
    }

    let fill = width - current;
    match align {
        Alignment::Left => format!("{}{}", s, " ".repeat(fill)),
        Alignment::Right => format!("{}{}", " ".repeat(fill), s),
        Alignment::Center => {
            let left = fill / 2;
            format!("{}{}{}", " ".repeat(left), s, " ".repeat(fill - left))
        }
    }
}

/// 由终端列数推导单列宽度
pub fn column_width(terminal_columns: usize) -> usize {
    if terminal_columns >= 72 {
        MAX_COLUMN_WIDTH
    } else {
        (terminal_columns.saturating_sub(11) / 2).max(MIN_COLUMN_WIDTH)
    }
}

/// 编号表格渲染器
#[derive(Debug, Clone, Copy)]
pub struct TableRenderer {
    /// 单列宽度
    space: usize,
    /// 值列的对齐方式
    value_align: Alignment,
}

impl Default for TableRenderer {
    fn default() -> Self {
        Self::new(MAX_COLUMN_WIDTH)
    }
}

impl TableRenderer {
    pub fn new(space: usize) -> Self {
        Self { space: space.max(MIN_COLUMN_WIDTH), value_align: Alignment::Right }
    }

    /// 根据终端列数创建
    pub fn for_terminal(columns: usize) -> Self {
        Self::new(column_width(columns))
    }

    pub fn with_value_align(mut self, align: Alignment) -> Self {
        self.value_align = align;
        self
    }

    /// 打印表头和编号行，返回按显示顺序排列的行键
    ///
    /// `offset` 把宽度从右列挪给左列，名字较长的列表用它。
    pub fn render<W, K, V>(
        &self,
        out: &mut W,
        headers: (&str, &str),
        rows: &[(K, V)],
        offset: isize,
    ) -> Result<Vec<String>>
    where
        W: Write,
        K: ToString,
        V: ToString,
    {
        let left = self.space.saturating_add_signed(offset);
        let right = self.space.saturating_add_signed(-offset);

        writeln!(
            out,
            "{} {} {} {}",
            pad("#", INDEX_WIDTH, Alignment::Left),
            pad(headers.0, left, Alignment::Left),
            pad(headers.1, right, self.value_align),
            pad("#", INDEX_WIDTH, Alignment::Right),
        )?;

        let mut keys = Vec::with_capacity(rows.len());
        for (i, (key, value)) in rows.iter().enumerate() {
            let number = (i + 1).to_string();
            let key = key.to_string();
            writeln!(
                out,
                "{} {} {} {}",
                pad(&number, INDEX_WIDTH, Alignment::Left),
                pad(&key, left, Alignment::Left),
                pad(&value.to_string(), right, self.value_align),
                pad(&number, INDEX_WIDTH, Alignment::Right),
            )?;
            keys.push(key);
        }
        out.flush()?;
        Ok(keys)
    }
}
