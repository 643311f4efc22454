//! Archive configuration

use std::time::Duration;

use serde::Deserialize;

use crate::pool::DatabaseConfig;

/// Process configuration for anything that opens the archive database
///
/// Read from `ARCHIVE_*` environment variables, e.g. `ARCHIVE_DATABASE_URL`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ArchiveConfig {
    /// Database URL
    pub database_url: String,
    /// Maximum pooled connections
    pub max_connections: u32,
    /// Minimum pooled connections
    pub min_connections: u32,
    /// Seconds to wait for a pooled connection
    pub connect_timeout_secs: u64,
    /// Log level
    pub log_level: String,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            database_url: "postgres://localhost/field_archive".to_string(),
            max_connections: 10,
            min_connections: 2,
            connect_timeout_secs: 30,
            log_level: "info".to_string(),
        }
    }
}

impl ArchiveConfig {
    /// Loads configuration from environment
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::Environment::with_prefix("ARCHIVE"))
            .build()?
            .try_deserialize()
    }

    /// Pool settings derived from this configuration
    pub fn database(&self) -> DatabaseConfig {
        DatabaseConfig::new(self.database_url.clone())
            .max_connections(self.max_connections)
            .min_connections(self.min_connections)
            .connect_timeout(Duration::from_secs(self.connect_timeout_secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_missing_keys() {
        let config: ArchiveConfig = config::Config::builder()
            .set_override("database_url", "postgres://archive@db/field_archive")
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.database_url, "postgres://archive@db/field_archive");
        assert_eq!(config.max_connections, 10);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_database_config_conversion() {
        let config = ArchiveConfig {
            max_connections: 4,
            connect_timeout_secs: 5,
            ..ArchiveConfig::default()
        };

        let database = config.database();
        assert_eq!(database.max_connections, 4);
        assert_eq!(database.connect_timeout, Duration::from_secs(5));
        assert_eq!(database.url, config.database_url);
    }
}
