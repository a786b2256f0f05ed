use chrono::{DateTime, FixedOffset};
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;

/// 代理组的类型名，其余类型都按直连类代理处理
pub const GROUP_TYPES: &[&str] = &["Selector", "URLTest", "Fallback", "LoadBalance", "Relay"];

/// 组嵌套的最大解析深度，防止控制器返回循环引用
pub const MAX_GROUP_DEPTH: usize = 16;

/// 一次延迟测试记录
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DelaySample {
    /// 测试时间
    #[serde(default)]
    pub time: Option<DateTime<FixedOffset>>,
    /// 延迟（毫秒），0 表示超时
    pub delay: i64,
}

/// 控制器返回的原始代理信息
#[derive(Debug, Clone, Deserialize)]
struct RawProxy {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    now: Option<String>,
    #[serde(default)]
    all: Option<Vec<String>>,
    #[serde(default)]
    history: Vec<DelaySample>,
}

/// 代理种类
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProxyKind {
    /// 直连类代理，带测速历史
    Leaf { history: Vec<DelaySample> },
    /// 代理组，`now` 指向当前成员
    Group { now: String, all: Vec<String> },
    /// 缺少 `now` 的代理组
    Unknown,
}

/// 单个代理
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Proxy {
    /// 代理名
    pub name: String,
    /// 控制器报告的类型名
    pub type_name: String,
    /// 种类
    pub kind: ProxyKind,
}

impl Proxy {
    fn from_raw(name: String, raw: RawProxy) -> Self {
        let kind = if GROUP_TYPES.contains(&raw.kind.as_str()) {
            match raw.now {
                Some(now) => ProxyKind::Group { now, all: raw.all.unwrap_or_default() },
                None => ProxyKind::Unknown,
            }
        } else {
            ProxyKind::Leaf { history: raw.history }
        };

        Self { name, type_name: raw.kind, kind }
    }

    /// 是否为 Selector 组（可由客户端切换）
    pub fn is_selector(&self) -> bool {
        self.type_name == "Selector" && matches!(self.kind, ProxyKind::Group { .. })
    }

    /// 是否为直连类代理
    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, ProxyKind::Leaf { .. })
    }

    /// 代理组当前选中的成员
    pub fn now(&self) -> Option<&str> {
        match &self.kind {
            ProxyKind::Group { now, .. } => Some(now),
            _ => None,
        }
    }

    /// 代理组的全部成员
    pub fn members(&self) -> &[String] {
        match &self.kind {
            ProxyKind::Group { all, .. } => all,
            _ => &[],
        }
    }
}

/// 展示用的延迟
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Latency {
    /// 毫秒
    Millis(i64),
    /// 超时（控制器返回 0）
    Timeout,
    /// 从未测试过
    Untested,
    /// 测试失败
    Failed(String),
    /// 类型未知或组引用无法解析
    Unknown,
}

impl Latency {
    /// 将控制器的延迟值转换为展示值，0 为超时
    pub fn from_delay(delay: i64) -> Self {
        if delay == 0 {
            Latency::Timeout
        } else {
            Latency::Millis(delay)
        }
    }
}

impl fmt::Display for Latency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Latency::Millis(ms) => write!(f, "{}", ms),
            Latency::Timeout => write!(f, "timeout"),
            Latency::Untested => write!(f, "-"),
            Latency::Failed(_) => write!(f, "test error"),
            Latency::Unknown => write!(f, "unknown"),
        }
    }
}

/// `GET /proxies` 的结果，保留控制器返回的顺序
#[derive(Debug, Clone, Default)]
pub struct Proxies {
    entries: Vec<Proxy>,
    index: HashMap<String, usize>,
}

impl Proxies {
    /// 从 `{"proxies": {...}}` 响应体解析
    pub fn from_json(value: serde_json::Value) -> crate::Result<Self> {
        #[derive(Deserialize)]
        struct Body {
            proxies: serde_json::Map<String, serde_json::Value>,
        }

        let body: Body = serde_json::from_value(value)?;
        let mut proxies = Proxies::default();
        for (name, raw) in body.proxies {
            let raw: RawProxy = serde_json::from_value(raw)?;
            proxies.push(Proxy::from_raw(name, raw));
        }
        Ok(proxies)
    }

    fn push(&mut self, proxy: Proxy) {
        self.index.insert(proxy.name.clone(), self.entries.len());
        self.entries.push(proxy);
    }

    pub fn get(&self, name: &str) -> Option<&Proxy> {
        self.index.get(name).map(|&i| &self.entries[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Proxy> {
        self.entries.iter()
    }

    /// 所有 Selector 组及其当前成员
    pub fn selectors(&self) -> Vec<(String, String)> {
        self.iter()
            .filter(|p| p.is_selector())
            .filter_map(|p| p.now().map(|now| (p.name.clone(), now.to_string())))
            .collect()
    }

    /// 解析代理的延迟；组沿着 `now` 一路找到直连代理，取其最近一次测速
    pub fn resolve_latency(&self, name: &str) -> Latency {
        let mut current = name;
        for _ in 0..MAX_GROUP_DEPTH {
            let Some(proxy) = self.get(current) else {
                return Latency::Unknown;
            };
            match &proxy.kind {
                ProxyKind::Leaf { history } => {
                    return history
                        .last()
                        .map(|sample| Latency::from_delay(sample.delay))
                        .unwrap_or(Latency::Untested);
                }
                ProxyKind::Group { now, .. } => current = now,
                ProxyKind::Unknown => return Latency::Unknown,
            }
        }
        Latency::Unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Proxies {
        Proxies::from_json(json!({
            "proxies": {
                "Outer": {"type": "Selector", "now": "Middle", "all": ["Middle", "DIRECT"]},
                "Middle": {"type": "Fallback", "now": "Inner", "all": ["Inner"]},
                "Inner": {"type": "URLTest", "now": "香港 01", "all": ["香港 01"]},
                "香港 01": {"type": "Shadowsocks", "history": [
                    {"time": "2024-01-01T00:00:00.000+08:00", "delay": 300},
                    {"time": "2024-01-01T00:05:00.000+08:00", "delay": 87}
                ]},
                "DIRECT": {"type": "Direct", "history": []},
                "Dead": {"type": "Vmess", "history": [{"time": "2024-01-01T00:00:00Z", "delay": 0}]},
                "Tuic 01": {"type": "Tuic", "history": [{"time": "2024-01-01T00:00:00Z", "delay": 45}]},
                "Compat": {"type": "Compatible"},
                "Broken": {"type": "URLTest", "all": ["DIRECT"]}
            }
        }))
        .unwrap()
    }

    #[test]
    fn keeps_controller_order() {
        let names: Vec<_> = sample().iter().map(|p| p.name.clone()).collect();
        assert_eq!(names[0], "Outer");
        assert_eq!(names[3], "香港 01");
    }

    #[test]
    fn nested_groups_resolve_to_leaf_sample() {
        let proxies = sample();
        assert_eq!(proxies.resolve_latency("Outer"), Latency::Millis(87));
        assert_eq!(proxies.resolve_latency("Middle"), Latency::Millis(87));
    }

    #[test]
    fn zero_delay_is_timeout() {
        let proxies = sample();
        assert_eq!(proxies.resolve_latency("Dead"), Latency::Timeout);
        assert_eq!(Latency::from_delay(0).to_string(), "timeout");
    }

    #[test]
    fn untested_and_unknown_placeholders() {
        let proxies = sample();
        assert_eq!(proxies.resolve_latency("DIRECT"), Latency::Untested);
        assert_eq!(proxies.resolve_latency("Compat"), Latency::Untested);
        assert_eq!(proxies.resolve_latency("Broken"), Latency::Unknown);
        assert_eq!(proxies.resolve_latency("missing"), Latency::Unknown);
    }

    #[test]
    fn unlisted_types_are_leaves() {
        let proxies = sample();
        let tuic = proxies.get("Tuic 01").unwrap();
        assert!(tuic.is_leaf());
        assert_eq!(proxies.resolve_latency("Tuic 01"), Latency::Millis(45));
        assert!(!proxies.get("Broken").unwrap().is_leaf());
    }

    #[test]
    fn group_cycle_terminates() {
        let proxies = Proxies::from_json(json!({
            "proxies": {
                "A": {"type": "Selector", "now": "B", "all": ["B"]},
                "B": {"type": "Selector", "now": "A", "all": ["A"]}
            }
        }))
        .unwrap();
        assert_eq!(proxies.resolve_latency("A"), Latency::Unknown);
    }

    #[test]
    fn only_selectors_are_listed() {
        assert_eq!(
            sample().selectors(),
            vec![("Outer".to_string(), "Middle".to_string())]
        );
    }
}
