//! clashcli Core - client side of the Clash RESTful controller API
//! 
//! This library provides the controller client, the streaming session engine
//! for `/traffic` and `/logs`, the width-aware table renderer and the on-disk
//! default settings.

// 导出模块
pub mod client;
pub mod error;
pub mod proxy;
pub mod settings;
pub mod stream;
pub mod subscription;
pub mod table;
pub mod tester;

// 从模块导出核心类型
pub use client::{ByteStream, ClientOptions, ControlClient, DelayOptions, Rule};
pub use error::{Error, Result};
pub use proxy::{DelaySample, Latency, Proxies, Proxy, ProxyKind};
pub use settings::{Overrides, Settings};
pub use stream::{KeypressWatch, LogLine, SessionEnd, SessionSummary, StreamSession, TrafficSample};
pub use table::{display_width, pad, Alignment, TableRenderer};
pub use subscription::update_subscription;
pub use tester::{TestResult, Tester};
pub use reqwest::StatusCode;

/// Initialize the logger with default settings
///
/// `RUST_LOG` wins; otherwise `verbose` selects `debug` over `warn`. Logs go to
/// stderr so they never mix with tables and stream output.
pub fn init_logger(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let fallback = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}
