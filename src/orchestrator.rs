//! Top-level control flow for the check and download modes

use crate::config::{Config, Credentials, Mode};
use crate::database::ProxyStore;
use crate::error::{Error, Result};
use crate::proxy::checker::Probe;
use crate::proxy::geo::CountryResolver;
use crate::proxy::importer::{ImportSummary, Importer, ImporterConfig};
use futures::TryStreamExt;
use std::fmt;
use tracing::{error, info, warn};

/// Totals for one recheck run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CheckSummary {
    pub checked: usize,
    pub alive: usize,
    pub dead: usize,
    /// Records whose result could not be written
    pub store_errors: usize,
}

/// Outcome of a completed run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunReport {
    Checked(CheckSummary),
    Downloaded(ImportSummary),
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunReport::Checked(s) => write!(
                f,
                "Checked {} proxies: {} alive, {} dead, {} not saved",
                s.checked, s.alive, s.dead, s.store_errors
            ),
            RunReport::Downloaded(s) => write!(
                f,
                "Imported {} proxies: {} alive, {} dead, {} not saved",
                s.fetched, s.alive, s.dead, s.store_errors
            ),
        }
    }
}

/// Drives one run in the configured mode
pub struct Orchestrator<'a> {
    config: &'a Config,
    store: &'a ProxyStore,
    probe: &'a dyn Probe,
    geo: &'a dyn CountryResolver,
}

impl<'a> Orchestrator<'a> {
    pub fn new(
        config: &'a Config,
        store: &'a ProxyStore,
        probe: &'a dyn Probe,
        geo: &'a dyn CountryResolver,
    ) -> Self {
        Self {
            config,
            store,
            probe,
            geo,
        }
    }

    /// Run the configured mode to completion
    pub async fn run(&self) -> Result<RunReport> {
        self.config.validate()?;

        match self.config.mode {
            Mode::Check => {
                println!("Going to recheck all available proxies...");
                Ok(RunReport::Checked(self.check_all().await?))
            }
            Mode::Download => {
                println!("Going to download proxies from remote...");
                Ok(RunReport::Downloaded(
                    self.download(&self.config.credentials).await?,
                ))
            }
        }
    }

    /// Probe every stored proxy one at a time and write each result back
    ///
    /// The country is re-resolved on every pass; when resolution fails the
    /// stored value is kept. A failed write skips that record only.
    pub async fn check_all(&self) -> Result<CheckSummary> {
        let mut summary = CheckSummary::default();
        let mut records = self.store.iter_all();

        while let Some(proxy) = records.try_next().await? {
            let alive = self.probe.probe(&proxy).await.is_working();
            let country = self
                .geo
                .resolve_country(&proxy.host)
                .unwrap_or_else(|_| proxy.country.clone());

            summary.checked += 1;
            if alive {
                summary.alive += 1;
            } else {
                summary.dead += 1;
            }

            match self.store.update(&proxy.key(), alive, &country).await {
                Ok(true) => {}
                Ok(false) => warn!("{} vanished from the store during the check", proxy),
                Err(e) => {
                    error!("Failed to update {}: {}", proxy, e);
                    summary.store_errors += 1;
                }
            }
        }

        info!(
            "Recheck finished: {} checked, {} alive, {} dead",
            summary.checked, summary.alive, summary.dead
        );
        Ok(summary)
    }

    /// Import fresh candidates from the listing provider
    pub async fn download(&self, credentials: &Credentials) -> Result<ImportSummary> {
        if !credentials.is_complete() {
            return Err(Error::Config(
                "login and password are required for download mode".to_string(),
            ));
        }

        let importer = Importer::with_config(
            ImporterConfig::new()
                .with_listing_url(self.config.listing_url.clone())
                .with_timeout(self.config.listing_timeout)
                .with_user_agent(self.config.checker.user_agent.clone())
                .with_concurrency(self.config.checker.concurrency),
        )?;

        let summary = importer
            .import(credentials, self.geo, self.probe, self.store)
            .await?;
        info!(
            "Import finished: {} fetched, {} alive, {} dead",
            summary.fetched, summary.alive, summary.dead
        );
        Ok(summary)
    }
}
