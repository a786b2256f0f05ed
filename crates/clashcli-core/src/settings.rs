use serde::{Deserialize, Deserializer, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use crate::error::{Error, Result};
use tracing::{debug, info, warn};

/// 默认设置文件位置（相对于用户主目录）
const SETTINGS_FILE: &str = ".config/clashcli/config.json";
/// 默认 clash 配置文件位置（相对于用户主目录）
const CLASH_CONFIG_FILE: &str = ".config/clash/config.yaml";

/// 客户端默认设置，保存在 `~/.config/clashcli/config.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// 控制器地址
    #[serde(default = "default_ip")]
    pub ip: String,
    /// 控制器端口
    #[serde(default = "default_port", deserialize_with = "port_from_any")]
    pub port: u16,
    /// 控制器密钥
    #[serde(default)]
    pub secret: Option<String>,
    /// 订阅地址
    #[serde(default, deserialize_with = "url_or_placeholder")]
    pub url: Option<String>,
    /// `update` 写入的 clash 配置文件
    #[serde(rename = "clash-config-path", alias = "clash", default = "default_clash_config_path")]
    pub clash_config_path: PathBuf,
}

fn default_ip() -> String { "127.0.0.1".to_string() }
fn default_port() -> u16 { 9090 }

fn default_clash_config_path() -> PathBuf {
    home_dir().join(CLASH_CONFIG_FILE)
}

fn home_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("."))
}

/// 旧版本把端口写成字符串，这里两种都接受
fn port_from_any<'de, D>(deserializer: D) -> std::result::Result<u16, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Port {
        Number(u16),
        Text(String),
    }

    match Port::deserialize(deserializer)? {
        Port::Number(port) => Ok(port),
        Port::Text(text) => text.trim().parse().map_err(serde::de::Error::custom),
    }
}

/// 旧版本用 `"*"` 表示没有订阅地址
fn url_or_placeholder<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let url = Option::<String>::deserialize(deserializer)?;
    Ok(url.filter(|u| !matches!(u.trim(), "" | "*")))
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            ip: default_ip(),
            port: default_port(),
            secret: None,
            url: None,
            clash_config_path: default_clash_config_path(),
        }
    }
}

/// 命令行上显式给出的参数，未给出的字段沿用设置文件
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub ip: Option<String>,
    pub port: Option<u16>,
    pub secret: Option<String>,
    pub url: Option<String>,
    pub clash_config_path: Option<PathBuf>,
}

impl Settings {
    /// 默认的设置文件路径
    pub fn default_path() -> PathBuf {
        home_dir().join(SETTINGS_FILE)
    }

    /// 从文件加载设置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).map_err(|e| {
            warn!("cannot read settings file {}: {}", path.as_ref().display(), e);
            Error::Configuration(format!("cannot read {}: {}", path.as_ref().display(), e))
        })?;
        let settings = serde_json::from_str(&content)?;
        debug!("settings loaded from {}", path.as_ref().display());
        Ok(settings)
    }

    /// 加载设置，文件不存在时写入默认设置
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            return Self::from_file(path);
        }

        let settings = Settings::default();
        settings.save_to_file(path)?;
        info!("default settings written to {}", path.display());
        Ok(settings)
    }

    /// 保存设置到文件
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// 用命令行参数覆盖设置，返回生效的设置
    pub fn apply(&self, overrides: &Overrides) -> Settings {
        Settings {
            ip: overrides.ip.clone().unwrap_or_else(|| self.ip.clone()),
            port: overrides.port.unwrap_or(self.port),
            secret: overrides.secret.clone().or_else(|| self.secret.clone()),
            url: overrides.url.clone().or_else(|| self.url.clone()),
            clash_config_path: overrides
                .clash_config_path
                .clone()
                .unwrap_or_else(|| self.clash_config_path.clone()),
        }
    }

    /// 控制器的根地址
    pub fn controller_url(&self) -> String {
        format!("http://{}:{}/", self.ip, self.port)
    }
}
