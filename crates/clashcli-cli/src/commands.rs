use crate::interactive::Interactive;
use crate::prompt::{Answer, LinePrompter};
use crate::ui::{create_progress_bar, format_log, format_traffic, print_info, print_success, terminal_table};
use crate::{Cli, Command};
use anyhow::{Context, Result};
use clashcli_core::{
    update_subscription, ClientOptions, ControlClient, DelayOptions, Error, KeypressWatch, LogLine,
    SessionEnd, Settings, StreamSession, TableRenderer, Tester, TrafficSample,
};
use std::io::{self, Write};
use std::process::ExitCode;
use tracing::{debug, info};

/// 命令的结束方式，两者的退出码都是 0
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Done,
    Cancelled,
}

impl<T> From<Answer<T>> for Outcome {
    fn from(answer: Answer<T>) -> Self {
        match answer {
            Answer::Value(_) => Outcome::Done,
            Answer::Cancelled => Outcome::Cancelled,
        }
    }
}

impl Outcome {
    /// 取消不是错误
    pub fn exit_code(self) -> ExitCode {
        ExitCode::SUCCESS
    }
}

/// 执行一条命令
pub async fn run(cli: Cli) -> Result<Outcome> {
    let settings_path = cli.settings.clone().unwrap_or_else(Settings::default_path);
    let stored = Settings::load_or_create(&settings_path)
        .with_context(|| format!("loading settings from {}", settings_path.display()))?;
    let settings = stored.apply(&cli.command.overrides());
    debug!("effective settings: {}:{}", settings.ip, settings.port);

    // 构造客户端不会发起连接，本地命令同样可以先建好
    let client = ControlClient::new(ClientOptions::from_settings(&settings))?;
    let table = terminal_table(cli.align);
    let outcome: Result<Outcome> = match cli.command {
        Command::Select(_) => {
            let mut flow = Interactive::new(&client, table, LinePrompter::new()?, io::stdout());
            flow.switch_proxy().await.map(Outcome::from).map_err(Into::into)
        }
        Command::Config(_) => {
            let mut flow = Interactive::new(&client, table, LinePrompter::new()?, io::stdout());
            flow.change_config().await.map(Outcome::from).map_err(Into::into)
        }
        Command::Test(_) => test(&client, table).await,
        Command::Rules(_) => rules(&client, table).await,
        Command::Traffic(_) => traffic(&client).await,
        Command::Log { level, .. } => logs(&client, level.as_deref()).await,
        Command::Update(_) => update(&settings).await,
        Command::Write { .. } => write(&settings, &settings_path),
    };
    client.close();
    outcome
}

fn write(settings: &Settings, path: &std::path::Path) -> Result<Outcome> {
    settings
        .save_to_file(path)
        .with_context(|| format!("writing settings to {}", path.display()))?;
    print_success(&mut io::stdout(), &format!("Settings written to {}", path.display()))?;
    Ok(Outcome::Done)
}

async fn test(client: &ControlClient, table: TableRenderer) -> Result<Outcome> {
    let tester = Tester::new(client, DelayOptions::default());
    let targets = tester.targets().await?;
    println!("Begin delay test:");

    let pb = create_progress_bar(targets.len() as u64);
    let results = tester
        .test_all(&targets, |result| {
            pb.set_message(result.proxy.clone());
            pb.inc(1);
        })
        .await;
    pb.finish_and_clear();

    let rows: Vec<_> = results.iter().map(|r| (r.proxy.clone(), r.latency.to_string())).collect();
    table.render(&mut io::stdout(), ("PROXY", "Delay"), &rows, 0)?;
    Ok(Outcome::Done)
}

async fn rules(client: &ControlClient, table: TableRenderer) -> Result<Outcome> {
    let rows: Vec<_> = client
        .rules()
        .await?
        .into_iter()
        .map(|rule| (rule.label(), rule.proxy))
        .collect();
    table.render(&mut io::stdout(), ("Rule", "Proxy"), &rows, 10)?;
    Ok(Outcome::Done)
}

async fn traffic(client: &ControlClient) -> Result<Outcome> {
    println!("Realtime traffic (enter to quit):");
    let stream = client.traffic().await?;
    let summary = StreamSession::new(stream, KeypressWatch::stdin())
        .run(|sample: TrafficSample| {
            let mut out = io::stdout();
            let _ = write!(out, "{}\r", format_traffic(&sample));
            let _ = out.flush();
        })
        .await?;
    println!();
    finish_session(summary.end)
}

async fn logs(client: &ControlClient, level: Option<&str>) -> Result<Outcome> {
    println!("Realtime proxy logs (enter to quit):");
    let stream = client.logs(level).await?;
    let summary = StreamSession::new(stream, KeypressWatch::stdin())
        .run(|line: LogLine| println!("{}", format_log(&line)))
        .await?;
    info!("{} log lines shown, {} skipped", summary.delivered, summary.skipped);
    finish_session(summary.end)
}

fn finish_session(end: SessionEnd) -> Result<Outcome> {
    if end == SessionEnd::Closed {
        print_info(&mut io::stdout(), "Stream closed by clash.")?;
    }
    Ok(Outcome::Done)
}

async fn update(settings: &Settings) -> Result<Outcome> {
    let url = settings
        .url
        .as_deref()
        .ok_or_else(|| Error::Configuration("no subscribe url, pass --url or run `write --url`".to_string()))?;
    let target = &settings.clash_config_path;
    let written = update_subscription(url, target).await?;
    print_success(
        &mut io::stdout(),
        &format!("Subscription saved to {} ({} bytes)", target.display(), written),
    )?;
    Ok(Outcome::Done)
}
