//! Proxy Warden - proxy liveness checker
//!
//! Probes HTTP proxies through a fixed test target, keeps their liveness and
//! country in a SQLite store, and imports new candidates from a listing
//! provider.

pub mod config;
pub mod database;
pub mod error;
pub mod orchestrator;
pub mod proxy;

#[cfg(test)]
mod test_support;

pub use config::{Config, Credentials, Mode, StoreSettings};
pub use database::ProxyStore;
pub use error::{Error, Result};
pub use orchestrator::{CheckSummary, Orchestrator, RunReport};
pub use proxy::*;
