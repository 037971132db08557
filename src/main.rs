use anyhow::{Context, Result};
use clap::Parser;
use proxy_warden::{
    config::{DEFAULT_COLLECTION, DEFAULT_DATABASE, DEFAULT_GEOIP_PATH, DEFAULT_LISTING_URL},
    proxy::{
        checker::DEFAULT_USER_AGENT, geo, importer::DEFAULT_LISTING_TIMEOUT_SECS, CheckerConfig,
        ProxyChecker,
    },
    Config, Mode, Orchestrator, ProxyStore, StoreSettings,
};
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;
use tracing_subscriber::EnvFilter;

/// Check stored proxies for liveness or import new ones from a listing provider
#[derive(Parser)]
#[command(name = "proxy-warden")]
#[command(about = "Check stored proxies for liveness or import new ones from a listing provider")]
struct Cli {
    /// Mode to run: `download` new or `check` existing proxies
    #[arg(short, long, value_enum, default_value_t = Mode::Check)]
    mode: Mode,

    /// Listing provider login for download mode
    #[arg(long, default_value = "")]
    login: String,

    /// Listing provider password for download mode
    #[arg(long, default_value = "")]
    password: String,

    /// Database name, file path or sqlite: URL
    #[arg(short, long, default_value = DEFAULT_DATABASE)]
    database: String,

    /// Table to read/write proxies
    #[arg(short, long, default_value = DEFAULT_COLLECTION)]
    collection: String,

    /// MaxMind country database used to locate proxies
    #[arg(long, default_value = DEFAULT_GEOIP_PATH)]
    geoip: PathBuf,

    /// Timeout in seconds for each probe
    #[arg(long, default_value = "10")]
    timeout: u64,

    /// Number of concurrent probes in download mode
    #[arg(short = 'n', long, default_value = "10")]
    concurrency: usize,

    /// Listing provider endpoint
    #[arg(long, default_value = DEFAULT_LISTING_URL)]
    listing_url: String,

    /// Timeout in seconds for the listing request
    #[arg(long, default_value_t = DEFAULT_LISTING_TIMEOUT_SECS)]
    listing_timeout: u64,

    /// User-Agent sent with probes and listing requests
    #[arg(long, default_value = DEFAULT_USER_AGENT)]
    user_agent: String,

    /// Accepted for compatibility and ignored: the store is a local SQLite file
    #[arg(long)]
    host: Option<String>,

    /// Accepted for compatibility and ignored: the store is a local SQLite file
    #[arg(long)]
    port: Option<u16>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    /// Server flags given on the command line that have no effect
    fn ignored_flags(&self) -> Vec<&'static str> {
        let mut ignored = Vec::new();
        if self.host.is_some() {
            ignored.push("--host");
        }
        if self.port.is_some() {
            ignored.push("--port");
        }
        ignored
    }

    fn into_config(self) -> Config {
        Config::new()
            .with_mode(self.mode)
            .with_credentials(self.login, self.password)
            .with_store(StoreSettings::new(self.database, self.collection))
            .with_checker(
                CheckerConfig::new()
                    .with_timeout(Duration::from_secs(self.timeout))
                    .with_concurrency(self.concurrency)
                    .with_user_agent(self.user_agent),
            )
            .with_geoip_path(self.geoip)
            .with_listing_url(self.listing_url)
            .with_listing_timeout(Duration::from_secs(self.listing_timeout))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    for flag in cli.ignored_flags() {
        warn!("{} is ignored: proxies are stored in a local SQLite database", flag);
    }

    let config = cli.into_config();

    // Bad configuration stops here, before any network or store access
    if let Err(e) = config.validate() {
        eprintln!("ERROR: {}", e);
        return Ok(());
    }

    let store = ProxyStore::open(&config.store)
        .await
        .with_context(|| format!("Could not open store {}", config.store.database_url()))?;

    let geo = geo::open_resolver(&config.geoip_path);
    let checker = ProxyChecker::with_config(config.checker.clone());

    let result = Orchestrator::new(&config, &store, &checker, geo.as_ref())
        .run()
        .await;
    store.close().await;

    let report = result?;
    println!("{}", report);

    Ok(())
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("proxy_warden={}", default_level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["proxy-warden"]).unwrap();
        assert!(cli.ignored_flags().is_empty());

        let config = cli.into_config();
        assert_eq!(config.mode, Mode::Check);
        assert_eq!(config.checker.user_agent, DEFAULT_USER_AGENT);
        assert_eq!(
            config.listing_timeout,
            Duration::from_secs(DEFAULT_LISTING_TIMEOUT_SECS)
        );
    }

    #[test]
    fn test_server_flags_are_accepted_and_ignored() {
        let cli = Cli::try_parse_from([
            "proxy-warden",
            "--host",
            "localhost",
            "--port",
            "27017",
            "-c",
            "proxies",
        ])
        .unwrap();
        assert_eq!(cli.ignored_flags(), vec!["--host", "--port"]);

        let config = cli.into_config();
        assert_eq!(config.store.collection, "proxies");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_listing_flags_reach_config() {
        let cli = Cli::try_parse_from([
            "proxy-warden",
            "-m",
            "download",
            "--login",
            "user",
            "--password",
            "secret",
            "--listing-timeout",
            "5",
            "--user-agent",
            "warden/2",
        ])
        .unwrap();

        let config = cli.into_config();
        assert_eq!(config.mode, Mode::Download);
        assert_eq!(config.listing_timeout, Duration::from_secs(5));
        assert_eq!(config.checker.user_agent, "warden/2");
        assert!(config.validate().is_ok());
    }
}
