//! Proxy module for parsing, locating and checking proxies
//!
//! This module provides functionality for:
//! - Parsing the listing provider's `host:port` text
//! - Resolving a proxy host to its country
//! - Probing proxy liveness through a fixed test target
//! - Importing listing candidates with a bounded worker pool

pub mod checker;
pub mod geo;
pub mod importer;
pub mod models;
pub mod parser;

pub use checker::{CheckerConfig, Probe, ProxyChecker};
pub use geo::{CountryResolver, GeoLocator, NoGeo};
pub use importer::{ImportSummary, Importer, ImporterConfig};
pub use models::{ProxyCheckResult, ProxyCheckStatus, ProxyKey, ProxyRecord};
pub use parser::ListingParser;
