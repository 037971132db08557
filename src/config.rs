//! Runtime configuration

use crate::error::{Error, Result};
use crate::proxy::checker::CheckerConfig;
use crate::proxy::importer::DEFAULT_LISTING_TIMEOUT_SECS;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Listing provider endpoint used by download mode
pub const DEFAULT_LISTING_URL: &str = "http://account.fineproxy.org/api/getproxy/";

/// Country database read when none is given
pub const DEFAULT_GEOIP_PATH: &str = "/usr/share/GeoIP/GeoLite2-Country.mmdb";

pub const DEFAULT_DATABASE: &str = "proxy";
pub const DEFAULT_COLLECTION: &str = "proxies";

/// Table names end up inside SQL text, so only plain identifiers pass
static IDENTIFIER_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("Invalid identifier regex"));

/// Run mode, chosen once per process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Mode {
    /// Re-probe every stored proxy
    #[default]
    Check,
    /// Import new candidates from the listing provider
    Download,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Check => write!(f, "check"),
            Mode::Download => write!(f, "download"),
        }
    }
}

/// Where proxy records are persisted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreSettings {
    /// Database name, file path or `sqlite:` URL
    pub database: String,
    /// Table holding the records
    pub collection: String,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            database: DEFAULT_DATABASE.to_string(),
            collection: DEFAULT_COLLECTION.to_string(),
        }
    }
}

impl StoreSettings {
    pub fn new(database: String, collection: String) -> Self {
        Self {
            database,
            collection,
        }
    }

    /// Connection URL for the database
    ///
    /// A bare name maps to `<name>.db` in the working directory.
    pub fn database_url(&self) -> String {
        if self.database.starts_with("sqlite:") {
            self.database.clone()
        } else if self.database.contains('/') || self.database.contains('.') {
            format!("sqlite://{}", self.database)
        } else {
            format!("sqlite://{}.db", self.database)
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.database.trim().is_empty() {
            return Err(Error::Config("database name must not be empty".to_string()));
        }
        if !IDENTIFIER_REGEX.is_match(&self.collection) {
            return Err(Error::Config(format!(
                "invalid collection name '{}': use letters, digits and underscores",
                self.collection
            )));
        }
        Ok(())
    }
}

/// Listing provider account
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub login: String,
    pub password: String,
}

impl Credentials {
    pub fn new(login: String, password: String) -> Self {
        Self { login, password }
    }

    pub fn is_complete(&self) -> bool {
        !self.login.is_empty() && !self.password.is_empty()
    }
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub mode: Mode,
    pub credentials: Credentials,
    pub store: StoreSettings,
    pub checker: CheckerConfig,
    pub geoip_path: PathBuf,
    pub listing_url: String,
    /// Timeout for the listing request
    pub listing_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mode: Mode::default(),
            credentials: Credentials::default(),
            store: StoreSettings::default(),
            checker: CheckerConfig::default(),
            geoip_path: PathBuf::from(DEFAULT_GEOIP_PATH),
            listing_url: DEFAULT_LISTING_URL.to_string(),
            listing_timeout: Duration::from_secs(DEFAULT_LISTING_TIMEOUT_SECS),
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_credentials(mut self, login: String, password: String) -> Self {
        self.credentials = Credentials::new(login, password);
        self
    }

    pub fn with_store(mut self, store: StoreSettings) -> Self {
        self.store = store;
        self
    }

    pub fn with_checker(mut self, checker: CheckerConfig) -> Self {
        self.checker = checker;
        self
    }

    pub fn with_geoip_path(mut self, path: PathBuf) -> Self {
        self.geoip_path = path;
        self
    }

    pub fn with_listing_url(mut self, url: String) -> Self {
        self.listing_url = url;
        self
    }

    pub fn with_listing_timeout(mut self, timeout: Duration) -> Self {
        self.listing_timeout = timeout;
        self
    }

    /// Check everything the selected mode needs before any side effect
    pub fn validate(&self) -> Result<()> {
        if self.mode == Mode::Download && !self.credentials.is_complete() {
            return Err(Error::Config(
                "You must provide login and password for the listing provider to use download mode"
                    .to_string(),
            ));
        }
        self.store.validate()
    }
}
