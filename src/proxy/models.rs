//! Proxy data models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Scheme assigned to candidates imported from the listing provider
pub const DEFAULT_SCHEME: &str = "http";

/// Identity key of a stored proxy
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProxyKey {
    pub host: String,
    pub port: String,
}

impl fmt::Display for ProxyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// One proxy endpoint and its last known status
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyRecord {
    #[serde(rename = "protocol")]
    pub scheme: String,
    pub host: String,
    /// Kept as text to match the stored format
    pub port: String,
    /// Country code resolved from `host`, empty when unknown
    pub country: String,
    /// True iff the most recent probe succeeded
    pub status: bool,
    pub checked_at: Option<DateTime<Utc>>,
}

impl ProxyRecord {
    /// Create a new, not yet checked record
    pub fn new(scheme: &str, host: String, port: String) -> Self {
        Self {
            scheme: scheme.to_string(),
            host,
            port,
            country: String::new(),
            status: false,
            checked_at: None,
        }
    }

    /// Create a new record as produced by the listing import
    pub fn candidate(host: String, port: String, country: String) -> Self {
        Self {
            country,
            ..Self::new(DEFAULT_SCHEME, host, port)
        }
    }

    /// Get the proxy URI (`scheme://host:port`)
    pub fn uri(&self) -> String {
        if self.host.contains(':') && !self.host.starts_with('[') {
            format!("{}://[{}]:{}", self.scheme, self.host, self.port)
        } else {
            format!("{}://{}:{}", self.scheme, self.host, self.port)
        }
    }

    pub fn key(&self) -> ProxyKey {
        ProxyKey {
            host: self.host.clone(),
            port: self.port.clone(),
        }
    }
}

impl fmt::Display for ProxyRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{} [{}]>", self.uri(), self.country)
    }
}

/// Result of proxy check operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ProxyCheckStatus {
    Working,
    Failed(String),
    Timeout,
}

/// Detailed result of a proxy check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyCheckResult {
    pub key: ProxyKey,
    pub status: ProxyCheckStatus,
    pub response_time_ms: Option<u64>,
}

impl ProxyCheckResult {
    pub fn working(key: ProxyKey, response_time_ms: u64) -> Self {
        Self {
            key,
            status: ProxyCheckStatus::Working,
            response_time_ms: Some(response_time_ms),
        }
    }

    pub fn failed(key: ProxyKey, error: String) -> Self {
        Self {
            key,
            status: ProxyCheckStatus::Failed(error),
            response_time_ms: None,
        }
    }

    pub fn timeout(key: ProxyKey) -> Self {
        Self {
            key,
            status: ProxyCheckStatus::Timeout,
            response_time_ms: None,
        }
    }

    pub fn is_working(&self) -> bool {
        matches!(self.status, ProxyCheckStatus::Working)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidate_defaults() {
        let proxy = ProxyRecord::candidate("1.2.3.4".to_string(), "8080".to_string(), "DE".to_string());
        assert_eq!(proxy.scheme, "http");
        assert_eq!(proxy.host, "1.2.3.4");
        assert_eq!(proxy.port, "8080");
        assert_eq!(proxy.country, "DE");
        assert!(!proxy.status);
        assert!(proxy.checked_at.is_none());
    }

    #[test]
    fn test_proxy_uri() {
        let proxy = ProxyRecord::new("http", "127.0.0.1".to_string(), "3128".to_string());
        assert_eq!(proxy.uri(), "http://127.0.0.1:3128");

        let proxy = ProxyRecord::new("socks5", "::1".to_string(), "1080".to_string());
        assert_eq!(proxy.uri(), "socks5://[::1]:1080");
    }

    #[test]
    fn test_proxy_display() {
        let proxy = ProxyRecord::candidate("10.0.0.1".to_string(), "3128".to_string(), "US".to_string());
        assert_eq!(proxy.to_string(), "<http://10.0.0.1:3128 [US]>");
    }

    #[test]
    fn test_proxy_key() {
        let proxy = ProxyRecord::candidate("10.0.0.1".to_string(), "3128".to_string(), String::new());
        let key = proxy.key();
        assert_eq!(key.to_string(), "10.0.0.1:3128");
        assert_eq!(key, ProxyKey { host: "10.0.0.1".to_string(), port: "3128".to_string() });
    }

    #[test]
    fn test_proxy_check_result() {
        let key = ProxyRecord::new("http", "127.0.0.1".to_string(), "8080".to_string()).key();

        let result = ProxyCheckResult::working(key.clone(), 100);
        assert!(result.is_working());
        assert_eq!(result.response_time_ms, Some(100));

        let result = ProxyCheckResult::failed(key.clone(), "Connection refused".to_string());
        assert!(!result.is_working());

        let result = ProxyCheckResult::timeout(key);
        assert!(!result.is_working());
    }
}
