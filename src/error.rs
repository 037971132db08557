//! Error kinds for proxy-warden operations

/// Error type for proxy-warden operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid or incomplete runtime configuration
    #[error("Configuration error: {0}")]
    Config(String),
    /// Database connection or query failure
    #[error("Store error: {0}")]
    Store(#[from] sqlx::Error),
    /// Probe client could not be built for a proxy
    #[error("Probe failure: {0}")]
    Probe(String),
    /// Listing provider could not be fetched or read
    #[error("Listing fetch failed: {0}")]
    Fetch(String),
    /// Country lookup failed for a host
    #[error("Geo lookup failed: {0}")]
    Geo(String),
}

/// Result type for proxy-warden operations
pub type Result<T> = std::result::Result<T, Error>;

impl From<std::net::AddrParseError> for Error {
    fn from(err: std::net::AddrParseError) -> Self {
        Error::Geo(err.to_string())
    }
}
