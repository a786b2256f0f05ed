//! Clash RESTful 控制接口客户端

use crate::error::{Error, Result};
use crate::proxy::{Latency, Proxies};
use crate::settings::Settings;
use futures::stream::BoxStream;
use futures::{Stream, StreamExt};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;
use tracing::debug;

/// 延迟测试默认超时（毫秒）
pub const DEFAULT_DELAY_TIMEOUT_MS: u64 = 2000;
/// 延迟测试默认目标
pub const DEFAULT_DELAY_URL: &str = "http://www.gstatic.com/generate_204";

/// 客户端选项
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// 控制器地址
    pub host: String,
    /// 控制器端口
    pub port: u16,
    /// Bearer 密钥
    pub secret: Option<String>,
    /// 普通请求的超时
    pub request_timeout: Duration,
    /// 建立连接的超时（流式请求也适用）
    pub connect_timeout: Duration,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 9090,
            secret: None,
            request_timeout: Duration::from_secs(10),
            connect_timeout: Duration::from_secs(5),
        }
    }
}

impl ClientOptions {
    /// 由生效的设置创建
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            host: settings.ip.clone(),
            port: settings.port,
            secret: settings.secret.clone(),
            ..Self::default()
        }
    }
}

/// 延迟测试选项
#[derive(Debug, Clone)]
pub struct DelayOptions {
    /// 超时（毫秒）
    pub timeout_ms: u64,
    /// 测试目标
    pub url: String,
}

impl Default for DelayOptions {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_DELAY_TIMEOUT_MS,
            url: DEFAULT_DELAY_URL.to_string(),
        }
    }
}

/// 一条分流规则
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Rule {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub payload: String,
    pub proxy: String,
}

impl Rule {
    /// 规则的展示名，如 `DOMAIN-SUFFIX,google.com`
    pub fn label(&self) -> String {
        if self.payload.is_empty() {
            self.kind.clone()
        } else {
            format!("{},{}", self.kind, self.payload)
        }
    }
}

/// 控制器客户端
#[derive(Debug, Clone)]
pub struct ControlClient {
    http: reqwest::Client,
    base: Url,
    request_timeout: Duration,
}

impl ControlClient {
    /// 创建新的客户端
    pub fn new(options: ClientOptions) -> Result<Self> {
        let base = Url::parse(&format!("http://{}:{}/", options.host, options.port))
            .map_err(|e| Error::Configuration(format!("invalid controller address: {}", e)))?;

        let mut headers = HeaderMap::new();
        if let Some(secret) = options.secret.as_deref().filter(|s| !s.is_empty()) {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", secret))
                .map_err(|e| Error::Configuration(format!("invalid secret: {}", e)))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .connect_timeout(options.connect_timeout)
            .no_proxy()
            .build()?;

        Ok(Self { http, base, request_timeout: options.request_timeout })
    }

    /// 拼接路径段，每一段单独做百分号编码
    fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| Error::Configuration(format!("cannot-be-a-base url: {}", self.base)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, segments: &[&str]) -> Result<reqwest::RequestBuilder> {
        let url = self.url(segments)?;
        debug!("{} {}", method, url);
        Ok(self.http.request(method, url))
    }

    /// GET 并解析整个响应体
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        query: &[(&str, String)],
    ) -> Result<T> {
        let response = self
            .request(Method::GET, segments)?
            .query(query)
            .timeout(self.request_timeout)
            .send()
            .await?;
        if response.status() == StatusCode::UNAUTHORIZED {
            return Err(Error::Request("unauthorized, check the secret".to_string()));
        }
        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// GET 并返回持续推送的字节流，不设请求超时
    pub async fn get_stream(
        &self,
        segments: &[&str],
        query: &[(&str, String)],
    ) -> Result<ByteStream> {
        let response = self
            .request(Method::GET, segments)?
            .query(query)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(match status {
                StatusCode::UNAUTHORIZED => Error::Request("unauthorized, check the secret".to_string()),
                other => Error::UnknownDaemon(other.as_u16()),
            });
        }
        debug!("stream opened with status {}", status);
        Ok(ByteStream::new(response))
    }

    async fn send_json<B: Serialize + ?Sized>(
        &self,
        method: Method,
        segments: &[&str],
        body: &B,
    ) -> Result<StatusCode> {
        let response = self
            .request(method, segments)?
            .json(body)
            .timeout(self.request_timeout)
            .send()
            .await?;
        debug!("controller answered {}", response.status());
        Ok(response.status())
    }

    /// PUT，返回状态码
    pub async fn put_json<B: Serialize + ?Sized>(&self, segments: &[&str], body: &B) -> Result<StatusCode> {
        self.send_json(Method::PUT, segments, body).await
    }

    /// PATCH，返回状态码
    pub async fn patch_json<B: Serialize + ?Sized>(&self, segments: &[&str], body: &B) -> Result<StatusCode> {
        self.send_json(Method::PATCH, segments, body).await
    }

    /// 全部代理
    pub async fn proxies(&self) -> Result<Proxies> {
        let value: serde_json::Value = self.get_json(&["proxies"], &[]).await?;
        Proxies::from_json(value)
    }

    /// 当前运行配置，保留控制器返回的键顺序
    pub async fn configs(&self) -> Result<serde_json::Map<String, serde_json::Value>> {
        self.get_json(&["configs"], &[]).await
    }

    /// 分流规则
    pub async fn rules(&self) -> Result<Vec<Rule>> {
        #[derive(Deserialize)]
        struct Body {
            rules: Vec<Rule>,
        }
        let body: Body = self.get_json(&["rules"], &[]).await?;
        Ok(body.rules)
    }

    /// 所有 Selector 组及当前选中的成员
    pub async fn selectors(&self) -> Result<Vec<(String, String)>> {
        Ok(self.proxies().await?.selectors())
    }

    /// 组内成员及各自的延迟；每次调用都重新查询控制器
    pub async fn selector_options(&self, selector: &str) -> Result<Vec<(String, Latency)>> {
        let proxies = self.proxies().await?;
        let group = proxies
            .get(selector)
            .filter(|p| p.is_selector())
            .ok_or_else(|| Error::NotFound(format!("Selector {} not found!", selector)))?;

        Ok(group
            .members()
            .iter()
            .map(|member| (member.clone(), proxies.resolve_latency(member)))
            .collect())
    }

    /// 触发一次延迟测试
    pub async fn test_delay(&self, proxy: &str, options: &DelayOptions) -> Result<Latency> {
        #[derive(Deserialize)]
        struct Body {
            delay: Option<i64>,
            message: Option<String>,
        }

        let body: Body = self
            .get_json(
                &["proxies", proxy, "delay"],
                &[("timeout", options.timeout_ms.to_string()), ("url", options.url.clone())],
            )
            .await?;

        Ok(match (body.delay, body.message) {
            (Some(delay), _) => Latency::from_delay(delay),
            (None, Some(message)) => Latency::Failed(message),
            (None, None) => Latency::Unknown,
        })
    }

    /// 切换 Selector 组的成员
    pub async fn switch_proxy(&self, selector: &str, proxy: &str) -> Result<StatusCode> {
        self.put_json(&["proxies", selector], &serde_json::json!({ "name": proxy }))
            .await
    }

    /// 修改一项运行配置
    pub async fn change_config(&self, key: &str, value: serde_json::Value) -> Result<StatusCode> {
        let mut body = serde_json::Map::new();
        body.insert(key.to_string(), value);
        self.patch_json(&["configs"], &body).await
    }

    /// 实时流量
    pub async fn traffic(&self) -> Result<ByteStream> {
        self.get_stream(&["traffic"], &[]).await
    }

    /// 实时日志，`level` 为空时使用控制器的默认级别
    pub async fn logs(&self, level: Option<&str>) -> Result<ByteStream> {
        let query: Vec<(&str, String)> = level.map(|l| ("level", l.to_string())).into_iter().collect();
        self.get_stream(&["logs"], &query).await
    }

    /// 释放连接
    pub fn close(self) {
        debug!("closing controller client for {}", self.base);
    }
}

/// 响应体的字节流，丢弃即关闭连接
pub struct ByteStream {
    inner: BoxStream<'static, reqwest::Result<Vec<u8>>>,
}

impl ByteStream {
    fn new(response: reqwest::Response) -> Self {
        Self {
            inner: response.bytes_stream().map(|chunk| chunk.map(|b| b.to_vec())).boxed(),
        }
    }
}

impl Stream for ByteStream {
    type Item = reqwest::Result<Vec<u8>>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.poll_next_unpin(cx)
    }
}
