//! 交互输入

use clashcli_core::{Error, Result};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::collections::VecDeque;

/// 一次提问的结果：用户取消，或给出了值
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer<T> {
    Cancelled,
    Value(T),
}

/// 读取一行输入；`None` 表示输入结束（Ctrl-D / Ctrl-C）
pub trait Prompter {
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>>;
}

/// 基于 rustyline 的终端输入
pub struct LinePrompter {
    editor: DefaultEditor,
}

impl LinePrompter {
    pub fn new() -> Result<Self> {
        let editor = DefaultEditor::new().map_err(readline_error)?;
        Ok(Self { editor })
    }
}

impl Prompter for LinePrompter {
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>> {
        match self.editor.readline(prompt) {
            Ok(line) => Ok(Some(line)),
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => Ok(None),
            Err(e) => Err(readline_error(e)),
        }
    }
}

fn readline_error(err: ReadlineError) -> Error {
    match err {
        ReadlineError::Io(e) => Error::Io(e),
        other => Error::Io(std::io::Error::other(other.to_string())),
    }
}

/// 预先准备好的输入，依次作答
impl Prompter for VecDeque<String> {
    fn read_line(&mut self, _prompt: &str) -> Result<Option<String>> {
        Ok(self.pop_front())
    }
}

/// 提问并解析；空输入或输入结束视为取消
pub fn ask<P, T, F>(prompter: &mut P, prompt: &str, parse: F) -> Result<Answer<T>>
where
    P: Prompter + ?Sized,
    F: FnOnce(&str) -> Result<T>,
{
    match prompter.read_line(prompt)? {
        None => Ok(Answer::Cancelled),
        Some(line) if line.trim().is_empty() => Ok(Answer::Cancelled),
        Some(line) => parse(line.trim()).map(Answer::Value),
    }
}

/// 解析 1 起始的序号，返回 0 起始的下标
pub fn parse_index(input: &str, len: usize) -> Result<usize> {
    let n: i64 = input
        .trim()
        .parse()
        .map_err(|_| Error::InputParse(input.to_string()))?;
    if n <= 0 || n as u64 > len as u64 {
        return Err(Error::SelectionOutOfRange(n));
    }
    Ok(n as usize - 1)
}

/// 端口号
pub fn parse_port(input: &str) -> Result<u16> {
    input.trim().parse().map_err(|_| Error::InputParse(input.to_string()))
}

/// 只有字面上的 "0" 是 false
pub fn parse_flag(input: &str) -> Result<bool> {
    Ok(input.trim() != "0")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn script(lines: &[&str]) -> VecDeque<String> {
        lines.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn empty_input_cancels() {
        let mut input = script(&[""]);
        assert_eq!(ask(&mut input, "> ", parse_port).unwrap(), Answer::Cancelled);
        assert_eq!(ask(&mut input, "> ", parse_port).unwrap(), Answer::Cancelled);
    }

    #[test]
    fn index_bounds() {
        assert_eq!(parse_index("1", 2).unwrap(), 0);
        assert_eq!(parse_index(" 2 ", 2).unwrap(), 1);
        assert!(matches!(parse_index("0", 2), Err(Error::SelectionOutOfRange(0))));
        assert!(matches!(parse_index("-3", 2), Err(Error::SelectionOutOfRange(-3))));
        assert!(matches!(parse_index("3", 2), Err(Error::SelectionOutOfRange(3))));
        assert!(matches!(parse_index("abc", 2), Err(Error::InputParse(_))));
    }

    #[test]
    fn flag_only_zero_is_false() {
        assert!(!parse_flag("0").unwrap());
        assert!(parse_flag("1").unwrap());
        assert!(parse_flag("no").unwrap());
    }

    #[test]
    fn port_must_be_numeric() {
        assert_eq!(parse_port("7890").unwrap(), 7890);
        assert!(matches!(parse_port("http"), Err(Error::InputParse(_))));
    }
}
