use std::io;

/// Error type for clashcli operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO操作错误
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    /// 无法连接到控制器
    #[error("Cannot reach the controller: {0}. Check that clash is running and the host/port are correct")]
    Transport(String),
    /// 请求错误
    #[error("Request failed: {0}")]
    Request(String),
    /// 流中的某一行无法解析
    #[error("Malformed record: {0}")]
    MalformedRecord(String),
    /// 交互输入不是数字
    #[error("Invalid input '{0}', a number is required")]
    InputParse(String),
    /// 序号越界
    #[error("Selection {0} is out of range")]
    SelectionOutOfRange(i64),
    /// 控制器拒绝了新的值
    #[error("Value error: {0}")]
    InvalidValue(String),
    /// 控制器找不到目标
    #[error("{0}")]
    NotFound(String),
    /// 不支持修改的配置项
    #[error("Unsupported config: {0}")]
    UnsupportedConfig(String),
    /// 未知状态码
    #[error("Unknown error code[{0}]")]
    UnknownDaemon(u16),
    /// 订阅下载失败
    #[error("Download file error, code[{0}]")]
    Download(u16),
    /// 非法的对齐方式
    #[error("Invalid alignment option '{0}'")]
    InvalidAlignment(String),
    /// 配置错误
    #[error("Configuration error: {0}")]
    Configuration(String),
    /// 序列化错误
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type for clashcli operations
pub type Result<T> = std::result::Result<T, Error>;

/// 从reqwest错误转换
impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() {
            Error::Transport(err.to_string())
        } else {
            Error::Request(err.to_string())
        }
    }
}

/// 从serde_json错误转换
impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}
