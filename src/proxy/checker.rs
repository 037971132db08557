//! Proxy checker module for probing proxy liveness

use crate::error::{Error, Result};
use crate::proxy::models::{ProxyCheckResult, ProxyRecord};
use async_trait::async_trait;
use reqwest::{Client, Proxy as ReqwestProxy, StatusCode};
use std::time::{Duration, Instant};
use tracing::debug;

/// Default timeout for proxy checks in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Default number of concurrent checks
pub const DEFAULT_CONCURRENCY: usize = 10;

/// Fixed URL proxies are probed against
pub const TEST_URL: &str = "https://api.github.com";

/// User agent sent with every probe; the test target rejects anonymous clients
pub const DEFAULT_USER_AGENT: &str = concat!("proxy-warden/", env!("CARGO_PKG_VERSION"));

/// Configuration for proxy checker
#[derive(Debug, Clone)]
pub struct CheckerConfig {
    /// Timeout for each proxy check
    pub timeout: Duration,
    /// Number of concurrent checks during import
    pub concurrency: usize,
    /// URL to test proxies against
    pub test_url: String,
    pub user_agent: String,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            concurrency: DEFAULT_CONCURRENCY,
            test_url: TEST_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl CheckerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_test_url(mut self, url: String) -> Self {
        self.test_url = url;
        self
    }

    pub fn with_user_agent(mut self, user_agent: String) -> Self {
        self.user_agent = user_agent;
        self
    }
}

/// A single liveness probe through a proxy
#[async_trait]
pub trait Probe: Send + Sync {
    /// Probe the proxy once; never fails, a failure is a dead proxy
    async fn probe(&self, proxy: &ProxyRecord) -> ProxyCheckResult;
}

/// Proxy checker issuing one GET to the test target through each proxy
#[derive(Clone, Default)]
pub struct ProxyChecker {
    config: CheckerConfig,
}

impl ProxyChecker {
    /// Create a new proxy checker with custom configuration
    pub fn with_config(config: CheckerConfig) -> Self {
        Self { config }
    }

    /// Check a single proxy
    pub async fn check_proxy(&self, proxy: &ProxyRecord) -> ProxyCheckResult {
        let start = Instant::now();
        let key = proxy.key();

        let client = match self.create_client(proxy) {
            Ok(client) => client,
            Err(e) => return ProxyCheckResult::failed(key, e.to_string()),
        };

        let result = match tokio::time::timeout(
            self.config.timeout,
            client.get(&self.config.test_url).send(),
        )
        .await
        {
            // Only an exact 200 counts, other 2xx codes are not a working proxy
            Ok(Ok(response)) if response.status() == StatusCode::OK => {
                ProxyCheckResult::working(key, start.elapsed().as_millis() as u64)
            }
            Ok(Ok(response)) => {
                ProxyCheckResult::failed(key, format!("HTTP status: {}", response.status()))
            }
            Ok(Err(e)) if e.is_timeout() => ProxyCheckResult::timeout(key),
            Ok(Err(e)) => ProxyCheckResult::failed(key, e.to_string()),
            Err(_) => ProxyCheckResult::timeout(key),
        };

        debug!(
            "{} is {}",
            proxy.uri(),
            if result.is_working() { "alive" } else { "dead" }
        );
        result
    }

    /// Create a reqwest client routed through the proxy
    fn create_client(&self, proxy: &ProxyRecord) -> Result<Client> {
        let reqwest_proxy =
            ReqwestProxy::all(proxy.uri()).map_err(|e| Error::Probe(e.to_string()))?;

        Client::builder()
            .proxy(reqwest_proxy)
            .timeout(self.config.timeout)
            .user_agent(&self.config.user_agent)
            .build()
            .map_err(|e| Error::Probe(e.to_string()))
    }
}

#[async_trait]
impl Probe for ProxyChecker {
    async fn probe(&self, proxy: &ProxyRecord) -> ProxyCheckResult {
        self.check_proxy(proxy).await
    }
}
