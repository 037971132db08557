//! Geolocation module for resolving a proxy host to its country using MMDB

use crate::error::{Error, Result};
use maxminddb::{geoip2, Reader};
use std::net::IpAddr;
use std::path::Path;
use std::sync::Arc;
use tracing::warn;

/// Capability mapping a host string to a country code
pub trait CountryResolver: Send + Sync {
    /// Resolve the country code for a host
    fn resolve_country(&self, host: &str) -> Result<String>;

    /// Resolve the country, degrading any failure to an empty code
    fn country_or_empty(&self, host: &str) -> String {
        self.resolve_country(host).unwrap_or_default()
    }
}

/// GeoLocator for looking up IP addresses in MMDB databases
pub struct GeoLocator {
    reader: Arc<Reader<Vec<u8>>>,
}

impl GeoLocator {
    /// Create a new GeoLocator from an MMDB file path
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let reader = Reader::open_readfile(path).map_err(|e| Error::Geo(e.to_string()))?;
        Ok(Self {
            reader: Arc::new(reader),
        })
    }

    /// Look up the ISO country code for an IpAddr
    pub fn lookup_ip(&self, ip: IpAddr) -> Result<Option<String>> {
        let lookup_result = self
            .reader
            .lookup(ip)
            .map_err(|e| Error::Geo(e.to_string()))?;

        // Country databases decode as a subset of the City record
        let country: Option<geoip2::Country> = lookup_result
            .decode()
            .map_err(|e| Error::Geo(e.to_string()))?;

        Ok(country.and_then(|c| c.country.iso_code.map(String::from)))
    }
}

impl CountryResolver for GeoLocator {
    fn resolve_country(&self, host: &str) -> Result<String> {
        let ip: IpAddr = host.parse()?;
        self.lookup_ip(ip)?
            .ok_or_else(|| Error::Geo(format!("no country recorded for {}", host)))
    }
}

impl Clone for GeoLocator {
    fn clone(&self) -> Self {
        Self {
            reader: Arc::clone(&self.reader),
        }
    }
}

/// Resolver used when no geo database is available
#[derive(Debug, Clone, Copy, Default)]
pub struct NoGeo;

impl CountryResolver for NoGeo {
    fn resolve_country(&self, _host: &str) -> Result<String> {
        Err(Error::Geo("no geo database loaded".to_string()))
    }
}

/// Open the geo database, falling back to [`NoGeo`] when it cannot be read
pub fn open_resolver<P: AsRef<Path>>(path: P) -> Arc<dyn CountryResolver> {
    match GeoLocator::from_path(&path) {
        Ok(locator) => Arc::new(locator),
        Err(e) => {
            warn!(
                "Could not open GeoIP database {}: {}",
                path.as_ref().display(),
                e
            );
            Arc::new(NoGeo)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct StaticGeo(HashMap<&'static str, &'static str>);

    impl CountryResolver for StaticGeo {
        fn resolve_country(&self, host: &str) -> Result<String> {
            self.0
                .get(host)
                .map(|c| c.to_string())
                .ok_or_else(|| Error::Geo(host.to_string()))
        }
    }

    #[test]
    fn test_no_geo_always_fails() {
        assert!(matches!(NoGeo.resolve_country("8.8.8.8"), Err(Error::Geo(_))));
        assert_eq!(NoGeo.country_or_empty("8.8.8.8"), "");
    }

    #[test]
    fn test_country_or_empty() {
        let geo = StaticGeo(HashMap::from([("10.0.0.1", "NL")]));
        assert_eq!(geo.country_or_empty("10.0.0.1"), "NL");
        assert_eq!(geo.country_or_empty("10.0.0.2"), "");
    }

    #[test]
    fn test_missing_database_falls_back() {
        let resolver = open_resolver("/nonexistent/GeoLite2-Country.mmdb");
        assert_eq!(resolver.country_or_empty("1.1.1.1"), "");
    }

    #[test]
    fn test_from_path_missing_file() {
        let result = GeoLocator::from_path("/nonexistent/GeoLite2-Country.mmdb");
        assert!(matches!(result, Err(Error::Geo(_))));
    }
}
