use clap::Parser;
use clashcli::{init_logger, run, Cli, Outcome};
use colored::*;
use std::process::ExitCode;
use tracing::debug;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // 初始化日志
    init_logger(cli.verbose);

    match run(cli).await {
        Ok(outcome) => {
            if outcome == Outcome::Cancelled {
                debug!("cancelled by user");
            }
            outcome.exit_code()
        }
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}
