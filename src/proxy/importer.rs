//! Importer for proxy candidates published by the listing provider
//!
//! This module provides functionality for:
//! - Fetching the provider's plain-text `host:port` listing
//! - Turning listing lines into proxy records with a resolved country
//! - Probing and persisting every candidate through a bounded worker pool

use crate::config::{Credentials, DEFAULT_LISTING_URL};
use crate::database::ProxyStore;
use crate::error::{Error, Result};
use crate::proxy::checker::{Probe, DEFAULT_CONCURRENCY, DEFAULT_USER_AGENT};
use crate::proxy::geo::CountryResolver;
use crate::proxy::models::ProxyRecord;
use crate::proxy::parser::ListingParser;
use futures::stream::{self, StreamExt};
use reqwest::{Client, Url};
use std::time::Duration;
use tracing::{debug, error, info};

/// Default timeout for the listing request in seconds
pub const DEFAULT_LISTING_TIMEOUT_SECS: u64 = 30;

/// Configuration for the importer
#[derive(Debug, Clone)]
pub struct ImporterConfig {
    /// Listing provider endpoint, without query
    pub listing_url: String,
    /// Timeout for the listing request
    pub timeout: Duration,
    pub user_agent: String,
    /// Number of candidates probed at once
    pub concurrency: usize,
}

impl Default for ImporterConfig {
    fn default() -> Self {
        Self {
            listing_url: DEFAULT_LISTING_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_LISTING_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

impl ImporterConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_listing_url(mut self, url: String) -> Self {
        self.listing_url = url;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: String) -> Self {
        self.user_agent = user_agent;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }
}

/// Totals for one import run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    /// Candidates parsed from the listing
    pub fetched: usize,
    pub alive: usize,
    pub dead: usize,
    /// Candidates whose result could not be written
    pub store_errors: usize,
}

enum Outcome {
    Stored { alive: bool },
    StoreFailed,
}

/// Importer fetching, probing and persisting listing candidates
pub struct Importer {
    config: ImporterConfig,
    client: Client,
}

impl Importer {
    /// Create a new importer with default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(ImporterConfig::default())
    }

    /// Create a new importer with custom configuration
    pub fn with_config(config: ImporterConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| Error::Fetch(e.to_string()))?;

        Ok(Self { config, client })
    }

    /// Full listing URL carrying the account credentials
    pub fn request_url(&self, credentials: &Credentials) -> Result<Url> {
        Url::parse_with_params(
            &self.config.listing_url,
            &[
                ("format", "txt"),
                ("type", "httpip"),
                ("login", credentials.login.as_str()),
                ("password", credentials.password.as_str()),
            ],
        )
        .map_err(|e| Error::Fetch(format!("invalid listing URL: {}", e)))
    }

    /// Download the raw listing body
    pub async fn fetch_listing(&self, credentials: &Credentials) -> Result<String> {
        let url = self.request_url(credentials)?;
        info!("Fetching proxy listing from {}", self.config.listing_url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| Error::Fetch(e.without_url().to_string()))?;

        response
            .text()
            .await
            .map_err(|e| Error::Fetch(e.without_url().to_string()))
    }

    /// Turn listing text into fresh records, resolving each host's country
    pub fn build_candidates(content: &str, geo: &dyn CountryResolver) -> Vec<ProxyRecord> {
        ListingParser::parse_listing(content)
            .into_iter()
            .map(|(host, port)| {
                let country = geo.country_or_empty(&host);
                ProxyRecord::candidate(host, port, country)
            })
            .collect()
    }

    /// Fetch the listing, then probe and upsert every candidate
    ///
    /// Returns once every candidate has been handled. A listing failure
    /// aborts before any record is touched.
    pub async fn import(
        &self,
        credentials: &Credentials,
        geo: &dyn CountryResolver,
        probe: &dyn Probe,
        store: &ProxyStore,
    ) -> Result<ImportSummary> {
        let content = self.fetch_listing(credentials).await?;
        let candidates = Self::build_candidates(&content, geo);
        info!("Parsed {} proxy candidates", candidates.len());

        Ok(self.check_and_store(candidates, probe, store).await)
    }

    /// Probe and upsert candidates with at most `concurrency` in flight
    pub async fn check_and_store(
        &self,
        candidates: Vec<ProxyRecord>,
        probe: &dyn Probe,
        store: &ProxyStore,
    ) -> ImportSummary {
        let fetched = candidates.len();

        stream::iter(candidates)
            .map(|proxy| async move {
                let alive = probe.probe(&proxy).await.is_working();
                match store.upsert(&proxy, alive).await {
                    Ok(()) => {
                        debug!("{} stored as {}", proxy, if alive { "alive" } else { "dead" });
                        Outcome::Stored { alive }
                    }
                    Err(e) => {
                        error!("Failed to store {}: {}", proxy, e);
                        Outcome::StoreFailed
                    }
                }
            })
            .buffer_unordered(self.config.concurrency)
            .fold(
                ImportSummary {
                    fetched,
                    ..Default::default()
                },
                |mut summary, outcome| async move {
                    match outcome {
                        Outcome::Stored { alive: true } => summary.alive += 1,
                        Outcome::Stored { alive: false } => summary.dead += 1,
                        Outcome::StoreFailed => summary.store_errors += 1,
                    }
                    summary
                },
            )
            .await
    }
}
