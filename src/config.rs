use crate::error::ConfigError;
use serde::Serialize;
use std::env;
use std::net::SocketAddr;

/// Labels shown by the administrative site. Built once at startup and shared read-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SiteConfig {
    pub site_header: String,
    pub site_title: String,
    pub index_title: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            site_header: "Vehicle Maintenance Administration".to_string(),
            site_title: "Maintenance Admin".to_string(),
            index_title: "Administration Panel".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// `None` runs the service on the in-memory store.
    pub database_url: Option<String>,
    pub max_connections: u32,
    pub log_level: String,
    pub site: SiteConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let port = match lookup("APP_PORT") {
            Some(raw) => raw.parse::<u16>().map_err(|_| ConfigError::InvalidPort)?,
            None => 8080,
        };
        let max_connections = match lookup("DB_MAX_CONNECTIONS") {
            Some(raw) => raw
                .parse::<u32>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or(ConfigError::InvalidNumber("DB_MAX_CONNECTIONS"))?,
            None => 20,
        };

        let defaults = SiteConfig::default();
        let site = SiteConfig {
            site_header: lookup("SITE_HEADER").unwrap_or(defaults.site_header),
            site_title: lookup("SITE_TITLE").unwrap_or(defaults.site_title),
            index_title: lookup("INDEX_TITLE").unwrap_or(defaults.index_title),
        };

        Ok(Self {
            host: lookup("APP_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
            database_url: lookup("DATABASE_URL").filter(|url| !url.trim().is_empty()),
            max_connections,
            log_level: lookup("APP_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            site,
        })
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let host = if self.host.eq_ignore_ascii_case("localhost") {
            "127.0.0.1"
        } else {
            self.host.as_str()
        };
        format!("{host}:{}", self.port)
            .parse()
            .map_err(|_| ConfigError::InvalidHost(self.host.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_without_environment() {
        let config = load(&[]).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.max_connections, 20);
        assert!(config.database_url.is_none());
        assert_eq!(config.site, SiteConfig::default());
        assert_eq!(config.socket_addr().unwrap().to_string(), "0.0.0.0:8080");
    }

    #[test]
    fn reads_overrides() {
        let config = load(&[
            ("APP_HOST", "localhost"),
            ("APP_PORT", "9000"),
            ("DATABASE_URL", "postgres://fleet@localhost/fleet"),
            ("SITE_HEADER", "Taller Central"),
        ])
        .unwrap();
        assert_eq!(config.socket_addr().unwrap().to_string(), "127.0.0.1:9000");
        assert_eq!(
            config.database_url.as_deref(),
            Some("postgres://fleet@localhost/fleet")
        );
        assert_eq!(config.site.site_header, "Taller Central");
        assert_eq!(config.site.site_title, SiteConfig::default().site_title);
    }

    #[test]
    fn rejects_bad_numbers() {
        assert!(matches!(
            load(&[("APP_PORT", "eighty")]),
            Err(ConfigError::InvalidPort)
        ));
        assert!(matches!(
            load(&[("DB_MAX_CONNECTIONS", "0")]),
            Err(ConfigError::InvalidNumber("DB_MAX_CONNECTIONS"))
        ));
    }

    #[test]
    fn blank_database_url_means_memory_store() {
        assert!(load(&[("DATABASE_URL", "  ")]).unwrap().database_url.is_none());
    }
}
