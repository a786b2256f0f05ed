//! 终端输出相关的小工具

use clashcli_core::{Alignment, LogLine, TableRenderer, TrafficSample};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};

/// 终端不可用时按 80 列处理
const FALLBACK_COLUMNS: usize = 80;

/// 当前终端的列数
pub fn terminal_columns() -> usize {
    console::Term::stdout()
        .size_checked()
        .map(|(_, columns)| columns as usize)
        .unwrap_or(FALLBACK_COLUMNS)
}

/// 适配当前终端宽度的表格
pub fn terminal_table(align: Alignment) -> TableRenderer {
    TableRenderer::for_terminal(terminal_columns()).with_value_align(align)
}

/// 创建一个标准格式的进度条
pub fn create_progress_bar(len: u64) -> ProgressBar {
    let pb = ProgressBar::new(len);
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    pb.set_style(style.progress_chars("#>-"));
    pb
}

/// 打印成功消息
pub fn print_success<W: Write>(out: &mut W, msg: &str) -> io::Result<()> {
    writeln!(out, "{} {}", "✓".green().bold(), msg.green())
}

/// 打印提示信息
pub fn print_info<W: Write>(out: &mut W, msg: &str) -> io::Result<()> {
    writeln!(out, "{}", msg.bright_black())
}

/// 流量行：原地刷新
pub fn format_traffic(sample: &TrafficSample) -> String {
    format!("up: {:<15}  down:{:<15}", sample.up, sample.down)
}

/// 日志行，级别着色
pub fn format_log(line: &LogLine) -> String {
    let level = format!("{:<8}", line.level);
    let level = match line.level.as_str() {
        "error" => level.red().bold(),
        "warning" => level.yellow(),
        "info" => level.green(),
        "debug" => level.bright_black(),
        _ => level.normal(),
    };
    format!("{}: {}", level, line.payload)
}
