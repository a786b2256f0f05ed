use crate::client::{ControlClient, DelayOptions};
use crate::error::Result;
use crate::proxy::Latency;
use futures::stream::{self, StreamExt};
use tracing::{debug, warn};

/// 同时进行的测试数
const DEFAULT_CONCURRENCY: usize = 8;

/// 测试结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestResult {
    /// 代理名
    pub proxy: String,
    /// 延迟
    pub latency: Latency,
}

/// 代理延迟测试器
pub struct Tester<'a> {
    client: &'a ControlClient,
    options: DelayOptions,
    concurrency: usize,
}

impl<'a> Tester<'a> {
    /// 创建新的测试器
    pub fn new(client: &'a ControlClient, options: DelayOptions) -> Self {
        Self { client, options, concurrency: DEFAULT_CONCURRENCY }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// 需要测试的代理：所有直连类代理，按控制器顺序
    pub async fn targets(&self) -> Result<Vec<String>> {
        Ok(self
            .client
            .proxies()
            .await?
            .iter()
            .filter(|p| p.is_leaf())
            .map(|p| p.name.clone())
            .collect())
    }

    /// 测试单个代理；单个代理的请求失败记为测试失败，不中断整体测试
    pub async fn test_proxy(&self, proxy: &str) -> TestResult {
        let latency = match self.client.test_delay(proxy, &self.options).await {
            Ok(latency) => latency,
            Err(e) => {
                warn!("delay test for {} failed: {}", proxy, e);
                Latency::Failed(e.to_string())
            }
        };
        debug!("{} -> {}", proxy, latency);
        TestResult { proxy: proxy.to_string(), latency }
    }

    /// 并发测试全部代理，结果保持 `targets` 的顺序；每完成一个调用一次 `on_done`
    pub async fn test_all<F>(&self, targets: &[String], mut on_done: F) -> Vec<TestResult>
    where
        F: FnMut(&TestResult),
    {
        let mut results: Vec<(usize, TestResult)> = stream::iter(targets.iter().enumerate())
            .map(|(i, name)| async move { (i, self.test_proxy(name).await) })
            .buffer_unordered(self.concurrency)
            .inspect(|(_, result)| on_done(result))
            .collect()
            .await;

        results.sort_by_key(|(i, _)| *i);
        results.into_iter().map(|(_, r)| r).collect()
    }
}
