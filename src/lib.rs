//! clashcli - A command-line client for the Clash RESTful controller API
//! 
//! This library re-exports the core and CLI crates used by the `clashcli` binary.

// 重导出core库
pub use clashcli_core::{
    Settings, Overrides,
    Error, Result,
    ControlClient, ClientOptions,
    Proxies, Proxy, Latency,
    StreamSession, KeypressWatch,
    TableRenderer,
    init_logger
};

// 重导出命令行界面
pub use clashcli_cli::{run, Cli, Command, Outcome};
