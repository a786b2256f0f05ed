//! clashcli CLI - Command Line Interface for the Clash RESTful controller
//!
//! This library provides the command surface, the interactive selection flows
//! and the dispatcher used by the `clashcli` binary.

use clap::{Args, Parser, Subcommand};
use clashcli_core::{Alignment, Overrides};
use std::path::PathBuf;

pub mod commands;
pub mod interactive;
pub mod prompt;
pub mod ui;

pub use commands::{run, Outcome};
pub use interactive::Interactive;
pub use prompt::{Answer, LinePrompter, Prompter};

/// 命令行参数
#[derive(Debug, Parser)]
#[command(name = "clashcli", version, about = "A cli tool for the Clash RESTful API")]
pub struct Cli {
    /// 输出调试日志
    #[arg(short, long, global = true)]
    pub verbose: bool,
    /// 设置文件位置（默认 ~/.config/clashcli/config.json）
    #[arg(long, global = true, value_name = "PATH")]
    pub settings: Option<PathBuf>,
    /// 表格值列的对齐方式（left/right/center 或 < > ^）
    #[arg(long, global = true, default_value = "right")]
    pub align: Alignment,
    #[command(subcommand)]
    pub command: Command,
}

/// CLI命令枚举
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Select proxy for selectors.
    Select(ConnectArgs),
    /// Change Clash configuration.
    Config(ConnectArgs),
    /// Test proxies delay.
    Test(ConnectArgs),
    /// Show your proxy traffic.
    Traffic(ConnectArgs),
    /// Show Clash logs.
    Log {
        #[command(flatten)]
        connect: ConnectArgs,
        /// Only show logs at or above this level (info/warning/error/debug).
        #[arg(long)]
        level: Option<String>,
    },
    /// List routing rules.
    Rules(ConnectArgs),
    /// Update your subscribe.
    Update(SubscriptionArgs),
    /// Write configs to file.
    Write {
        #[command(flatten)]
        connect: ConnectArgs,
        #[command(flatten)]
        subscription: SubscriptionArgs,
    },
}

/// 控制器连接参数
#[derive(Debug, Clone, Default, Args)]
pub struct ConnectArgs {
    /// Clash RESTful API ip.
    #[arg(short, long)]
    pub ip: Option<String>,
    /// Clash RESTful API port.
    #[arg(short = 'r', long)]
    pub port: Option<u16>,
    /// Clash RESTful API secret.
    #[arg(short, long)]
    pub secret: Option<String>,
}

/// 订阅参数
#[derive(Debug, Clone, Default, Args)]
pub struct SubscriptionArgs {
    /// Clash config file location for update target.
    #[arg(short, long, value_name = "PATH")]
    pub clash: Option<PathBuf>,
    /// Subscribe url.
    #[arg(short = 'l', long)]
    pub url: Option<String>,
}

impl Command {
    /// 命令行上显式给出的设置
    pub fn overrides(&self) -> Overrides {
        let (connect, subscription) = match self {
            Command::Select(c)
            | Command::Config(c)
            | Command::Test(c)
            | Command::Traffic(c)
            | Command::Rules(c)
            | Command::Log { connect: c, .. } => (Some(c), None),
            Command::Update(s) => (None, Some(s)),
            Command::Write { connect, subscription } => (Some(connect), Some(subscription)),
        };

        let connect = connect.cloned().unwrap_or_default();
        let subscription = subscription.cloned().unwrap_or_default();
        Overrides {
            ip: connect.ip,
            port: connect.port,
            secret: connect.secret,
            url: subscription.url,
            clash_config_path: subscription.clash,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn write_collects_all_overrides() {
        let cli = Cli::parse_from([
            "clashcli", "write", "-i", "10.0.0.1", "-r", "9091", "-s", "pw", "-l", "https://sub", "-c", "/tmp/c.yaml",
        ]);
        let overrides = cli.command.overrides();
        assert_eq!(overrides.ip.as_deref(), Some("10.0.0.1"));
        assert_eq!(overrides.port, Some(9091));
        assert_eq!(overrides.secret.as_deref(), Some("pw"));
        assert_eq!(overrides.url.as_deref(), Some("https://sub"));
        assert_eq!(overrides.clash_config_path, Some(PathBuf::from("/tmp/c.yaml")));
    }

    #[test]
    fn align_is_parsed_once_at_the_command_line() {
        let cli = Cli::parse_from(["clashcli", "rules", "--align", "^"]);
        assert_eq!(cli.align, Alignment::Center);
        assert_eq!(Cli::parse_from(["clashcli", "test"]).align, Alignment::Right);

        let err = Cli::try_parse_from(["clashcli", "rules", "--align", "="]).unwrap_err();
        assert!(err.to_string().contains("Invalid alignment option '='"), "{err}");
    }

    #[test]
    fn unspecified_flags_stay_empty() {
        let cli = Cli::parse_from(["clashcli", "log", "--level", "debug"]);
        let overrides = cli.command.overrides();
        assert!(overrides.ip.is_none() && overrides.port.is_none());
        assert!(matches!(cli.command, Command::Log { level: Some(ref l), .. } if l == "debug"));
    }
}
