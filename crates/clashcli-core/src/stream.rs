//! Streaming session engine
//!
//! Consumes a newline-delimited JSON feed (`/traffic`, `/logs`) and hands each
//! decoded record to a render callback, while watching the terminal for a
//! single keypress that ends the session. Both the feed and the keypress watch
//! are owned by the session, so they are released on every exit path.

use crate::error::{Error, Result};
use futures::{Stream, StreamExt};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::io::Read;
use tokio::sync::oneshot;
use tracing::{debug, warn};

/// `/traffic` 推送的一条速率记录（字节/秒）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct TrafficSample {
    pub up: u64,
    pub down: u64,
}

/// `/logs` 推送的一行日志
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LogLine {
    /// 日志级别
    #[serde(rename = "type")]
    pub level: String,
    pub payload: String,
}

/// 单行最大字节数，超出仍未见换行视为坏数据
pub const MAX_LINE_BYTES: usize = 1024 * 1024;

/// 按 `\n` 切分字节流，缓冲区在未完成的读取被取消后依然保留
pub struct LineStream<S> {
    inner: S,
    buf: Vec<u8>,
    finished: bool,
}

impl<S, B, E> LineStream<S>
where
    S: Stream<Item = std::result::Result<B, E>> + Unpin,
    B: AsRef<[u8]>,
    E: Into<Error>,
{
    pub fn new(inner: S) -> Self {
        Self { inner, buf: Vec::new(), finished: false }
    }

    /// 下一行（不含换行符），流结束时返回 `None`
    ///
    /// 取消安全：只有在底层 `next()` 完成之后才会修改缓冲区。
    pub async fn next_line(&mut self) -> Result<Option<Vec<u8>>> {
        loop {
            if let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
                let mut line: Vec<u8> = self.buf.drain(..=pos).collect();
                line.pop();
                return Ok(Some(line));
            }
            if self.buf.len() > MAX_LINE_BYTES {
                let buffered = self.buf.len();
                self.buf.clear();
                return Err(Error::MalformedRecord(format!(
                    "no newline within {} bytes ({} buffered)",
                    MAX_LINE_BYTES, buffered
                )));
            }
            if self.finished {
                if self.buf.is_empty() {
                    return Ok(None);
                }
                return Ok(Some(std::mem::take(&mut self.buf)));
            }

            match self.inner.next().await {
                Some(Ok(chunk)) => self.buf.extend_from_slice(chunk.as_ref()),
                Some(Err(e)) => return Err(e.into()),
                None => self.finished = true,
            }
        }
    }
}

/// 监听一次按键，触发后结束会话
pub struct KeypressWatch {
    rx: Option<oneshot::Receiver<()>>,
}

/// 测试或其他调用方用来模拟按键
pub struct KeypressTrigger(oneshot::Sender<()>);

impl KeypressTrigger {
    pub fn press(self) {
        let _ = self.0.send(());
    }
}

impl KeypressWatch {
    pub fn channel() -> (KeypressTrigger, KeypressWatch) {
        let (tx, rx) = oneshot::channel();
        (KeypressTrigger(tx), KeypressWatch { rx: Some(rx) })
    }

    /// 在独立线程中阻塞读取标准输入的一个字节
    ///
    /// 终端处于行缓冲模式，按下回车时这个字节才会到达。标准输入到达 EOF 时不会触发取消。
    /// 线程不会随监听一起结束：流先关闭时它仍阻塞在标准输入上，直到进程退出。
    pub fn stdin() -> Self {
        let (trigger, watch) = Self::channel();
        std::thread::spawn(move || {
            let mut byte = [0u8; 1];
            match std::io::stdin().lock().read(&mut byte) {
                Ok(1) => trigger.press(),
                Ok(_) => debug!("stdin closed, keypress watch disabled"),
                Err(e) => warn!("keypress watch failed: {}", e),
            }
        });
        watch
    }

    async fn pressed(&mut self) {
        if let Some(rx) = self.rx.as_mut() {
            if rx.await.is_ok() {
                return;
            }
            // 发送端已丢弃：永远不会再有按键
            self.rx = None;
        }
        std::future::pending::<()>().await
    }
}

/// 会话结束原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// 用户按键取消
    Cancelled,
    /// 控制器关闭了流
    Closed,
}

/// 会话统计
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSummary {
    /// 交给渲染回调的记录数
    pub delivered: usize,
    /// 无法解析而跳过的行数
    pub skipped: usize,
    pub end: SessionEnd,
}

/// 一次流式会话
pub struct StreamSession<S> {
    lines: LineStream<S>,
    watch: KeypressWatch,
}

impl<S, B, E> StreamSession<S>
where
    S: Stream<Item = std::result::Result<B, E>> + Unpin,
    B: AsRef<[u8]>,
    E: Into<Error>,
{
    pub fn new(stream: S, watch: KeypressWatch) -> Self {
        Self { lines: LineStream::new(stream), watch }
    }

    /// 逐条解码并渲染，直到按键取消或流结束
    ///
    /// 读取失败会在释放流和按键监听之后向上返回。
    pub async fn run<T, F>(self, mut render: F) -> Result<SessionSummary>
    where
        T: DeserializeOwned,
        F: FnMut(T),
    {
        let StreamSession { mut lines, mut watch } = self;
        let mut delivered = 0;
        let mut skipped = 0;

        let end = loop {
            tokio::select! {
                biased;
                _ = watch.pressed() => {
                    debug!("keypress received, ending session");
                    break SessionEnd::Cancelled;
                }
                line = lines.next_line() => {
                    let Some(line) = line? else {
                        debug!("stream closed by controller");
                        break SessionEnd::Closed;
                    };
                    if line.iter().all(u8::is_ascii_whitespace) {
                        continue;
                    }
                    match decode::<T>(&line) {
                        Ok(record) => {
                            render(record);
                            delivered += 1;
                        }
                        Err(e) => {
                            warn!("{}", e);
                            skipped += 1;
                        }
                    }
                }
            }
        };

        Ok(SessionSummary { delivered, skipped, end })
    }
}

fn decode<T: DeserializeOwned>(line: &[u8]) -> Result<T> {
    serde_json::from_slice(line).map_err(|e| {
        Error::MalformedRecord(format!("{} in {:?}", e, String::from_utf8_lossy(line)))
    })
}
