//! Interactive selection: pick a row from a numbered table, then send the
//! mutation to the controller.

use crate::prompt::{ask, parse_flag, parse_index, parse_port, Answer, Prompter};
use crate::ui::print_success;
use clashcli_core::{ControlClient, Error, Result, StatusCode, TableRenderer};
use serde_json::Value;
use std::io::Write;
use tracing::debug;

/// 右列让给名字的宽度
const MEMBER_OFFSET: isize = 10;

/// 可修改的配置项及其输入方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConfigField {
    Port,
    Flag,
    Text(&'static str),
}

fn config_field(key: &str) -> Result<ConfigField> {
    if key.contains("port") {
        return Ok(ConfigField::Port);
    }
    match key {
        "allow-lan" => Ok(ConfigField::Flag),
        "mode" => Ok(ConfigField::Text("Change to which mode (Rule/Global/Direct, empty to cancel): ")),
        "log-level" => Ok(ConfigField::Text(
            "Change to which level (info/warning/error/debug/silent, empty to cancel): ",
        )),
        "bind-address" => Ok(ConfigField::Text(
            "Change to which address (ip address or *, empty to cancel): ",
        )),
        "authentication" => Err(Error::UnsupportedConfig(
            "authentication is not supported yet".to_string(),
        )),
        other => Err(Error::UnsupportedConfig(format!("unknown config '{}'", other))),
    }
}

/// 切换 Selector 的结果
pub fn switch_outcome(status: StatusCode, selector: &str, proxy: &str) -> Result<()> {
    match status {
        s if s.is_success() => Ok(()),
        StatusCode::BAD_REQUEST => Err(Error::InvalidValue(format!(
            "proxy {} does not exist in {}",
            proxy, selector
        ))),
        StatusCode::NOT_FOUND => Err(Error::NotFound(format!("Selector {} not found!", selector))),
        other => Err(Error::UnknownDaemon(other.as_u16())),
    }
}

/// 修改配置的结果
pub fn config_outcome(status: StatusCode, key: &str) -> Result<()> {
    match status {
        s if s.is_success() => Ok(()),
        StatusCode::BAD_REQUEST => Err(Error::InvalidValue(format!("rejected value for {}", key))),
        StatusCode::NOT_FOUND => Err(Error::NotFound(format!("config {} not found", key))),
        other => Err(Error::UnknownDaemon(other.as_u16())),
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// 交互式会话：表格、输入和控制器
pub struct Interactive<'a, P, W> {
    client: &'a ControlClient,
    table: TableRenderer,
    prompter: P,
    out: W,
}

impl<'a, P: Prompter, W: Write> Interactive<'a, P, W> {
    pub fn new(client: &'a ControlClient, table: TableRenderer, prompter: P, out: W) -> Self {
        Self { client, table, prompter, out }
    }

    pub fn into_output(self) -> W {
        self.out
    }

    /// 从 `keys` 中选一个
    fn choose(&mut self, prompt: &str, keys: &[String]) -> Result<Answer<String>> {
        let answer = ask(&mut self.prompter, prompt, |input| parse_index(input, keys.len()))?;
        Ok(match answer {
            Answer::Value(i) => Answer::Value(keys[i].clone()),
            Answer::Cancelled => Answer::Cancelled,
        })
    }

    /// 选择 Selector 组，再选择要切换到的成员
    pub async fn switch_proxy(&mut self) -> Result<Answer<()>> {
        let selectors = self.client.selectors().await?;
        let keys = self.table.render(&mut self.out, ("Selector", "Now"), &selectors, 0)?;
        let Answer::Value(selector) =
            self.choose("Change which selector (number, empty to cancel): ", &keys)?
        else {
            return Ok(Answer::Cancelled);
        };

        let options = self.client.selector_options(&selector).await?;
        let keys = self
            .table
            .render(&mut self.out, ("Proxy", "Delay (ms)"), &options, MEMBER_OFFSET)?;
        let prompt = format!("Switch {} to which proxy (number, empty to cancel): ", selector);
        let Answer::Value(proxy) = self.choose(&prompt, &keys)? else {
            return Ok(Answer::Cancelled);
        };

        debug!("switching {} to {}", selector, proxy);
        let status = self.client.switch_proxy(&selector, &proxy).await?;
        switch_outcome(status, &selector, &proxy)?;
        print_success(&mut self.out, "Selector update succeed!")?;
        Ok(Answer::Value(()))
    }

    /// 选择一项配置，按类型读取新值后提交
    pub async fn change_config(&mut self) -> Result<Answer<()>> {
        let configs = self.client.configs().await?;
        let rows: Vec<(String, String)> = configs
            .iter()
            .map(|(k, v)| (k.clone(), display_value(v)))
            .collect();
        let keys = self.table.render(&mut self.out, ("Config", "Value"), &rows, 0)?;
        let Answer::Value(key) =
            self.choose("Change which config (number, empty to cancel): ", &keys)?
        else {
            return Ok(Answer::Cancelled);
        };

        let answer = match config_field(&key)? {
            ConfigField::Port => {
                let prompt = format!("Change {} to which port (number, empty to cancel): ", key);
                ask(&mut self.prompter, &prompt, |s| parse_port(s).map(Value::from))?
            }
            ConfigField::Flag => ask(
                &mut self.prompter,
                "Allow-lan (1 for true, 0 for false, empty to cancel): ",
                |s| parse_flag(s).map(Value::Bool),
            )?,
            ConfigField::Text(prompt) => {
                ask(&mut self.prompter, prompt, |s| Ok(Value::String(s.to_string())))?
            }
        };
        let Answer::Value(value) = answer else {
            return Ok(Answer::Cancelled);
        };

        debug!("changing {} to {}", key, value);
        let status = self.client.change_config(&key, value).await?;
        config_outcome(status, &key)?;
        print_success(&mut self.out, "Config change succeed!")?;
        Ok(Answer::Value(()))
    }
}
