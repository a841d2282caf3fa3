//! Rental API configuration module.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     RENTWELL_PORT=8080                                                 │
//! │     RENTWELL_PRICING_POLICY=recompute                                  │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     $RENTWELL_CONFIG, or                                               │
//! │     ~/.config/rentwell/rentwell.toml (Linux)                           │
//! │     ~/Library/Application Support/com.rentwell.rentwell/... (macOS)    │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [server]
//! bind_addr = "0.0.0.0"
//! port = 8080
//!
//! [database]
//! path = "rentwell.db"
//! max_connections = 5
//! busy_timeout_ms = 5000
//!
//! [auth]
//! jwt_secret = "change-me"
//! token_lifetime_secs = 86400
//!
//! [rentals]
//! pricing_policy = "trust_client"  # trust_client | recompute
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use rentwell_core::PricingPolicy;
use rentwell_db::DbConfig;

/// Secret used when none is configured. Fine for local runs only.
pub const DEV_JWT_SECRET: &str = "rentwell-dev-secret-change-in-production";

/// Rental API configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default)]
    pub server: ServerSettings,

    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub auth: AuthSettings,

    #[serde(default)]
    pub rentals: RentalSettings,
}

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_bind_addr() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerSettings {
    fn default() -> Self {
        ServerSettings {
            bind_addr: default_bind_addr(),
            port: default_port(),
        }
    }
}

/// SQLite settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// How long a writer waits for the write lock before failing.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("rentwell.db")
}

fn default_max_connections() -> u32 {
    5
}

fn default_busy_timeout_ms() -> u64 {
    5000
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: default_db_path(),
            max_connections: default_max_connections(),
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

/// Bearer token settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSettings {
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,

    /// Lifetime of tokens minted by the seeder.
    #[serde(default = "default_token_lifetime")]
    pub token_lifetime_secs: i64,
}

fn default_jwt_secret() -> String {
    DEV_JWT_SECRET.to_string()
}

fn default_token_lifetime() -> i64 {
    86_400
}

impl Default for AuthSettings {
    fn default() -> Self {
        AuthSettings {
            jwt_secret: default_jwt_secret(),
            token_lifetime_secs: default_token_lifetime(),
        }
    }
}

/// Rental engine settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RentalSettings {
    #[serde(default)]
    pub pricing_policy: PricingPolicy,
}

impl ApiConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (`RENTWELL_CONFIG` or the platform config dir)
    /// 3. Environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("RENTWELL_CONFIG")
            .ok()
            .map(PathBuf::from)
            .or_else(Self::default_config_path);

        let mut config = match path {
            Some(path) if path.exists() => {
                info!(?path, "Loading config from file");
                Self::from_file(&path)?
            }
            Some(path) => {
                debug!(?path, "Config file not found, using defaults");
                Self::default()
            }
            None => Self::default(),
        };

        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;

        Ok(config)
    }

    /// Parses a TOML config file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFailed {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&contents)?)
    }

    /// Applies `RENTWELL_*` overrides read through `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(addr) = lookup("RENTWELL_BIND_ADDR") {
            self.server.bind_addr = addr;
        }

        if let Some(port) = lookup("RENTWELL_PORT") {
            self.server.port = parse_var("RENTWELL_PORT", &port)?;
        }

        if let Some(path) = lookup("RENTWELL_DATABASE_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = PathBuf::from(path);
        }

        if let Some(max) = lookup("RENTWELL_DB_MAX_CONNECTIONS") {
            self.database.max_connections = parse_var("RENTWELL_DB_MAX_CONNECTIONS", &max)?;
        }

        if let Some(ms) = lookup("RENTWELL_DB_BUSY_TIMEOUT_MS") {
            self.database.busy_timeout_ms = parse_var("RENTWELL_DB_BUSY_TIMEOUT_MS", &ms)?;
        }

        if let Some(secret) = lookup("RENTWELL_JWT_SECRET") {
            self.auth.jwt_secret = secret;
        }

        if let Some(policy) = lookup("RENTWELL_PRICING_POLICY") {
            self.rentals.pricing_policy = parse_var("RENTWELL_PRICING_POLICY", &policy)?;
        }

        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::InvalidValue("server.port".to_string()));
        }

        if self.database.max_connections == 0 {
            return Err(ConfigError::InvalidValue("database.max_connections".to_string()));
        }

        if self.auth.jwt_secret.trim().is_empty() {
            return Err(ConfigError::MissingRequired("auth.jwt_secret".to_string()));
        }

        if self.auth.token_lifetime_secs <= 0 {
            return Err(ConfigError::InvalidValue("auth.token_lifetime_secs".to_string()));
        }

        if self.auth.jwt_secret == DEV_JWT_SECRET {
            warn!("Using the development JWT secret; set RENTWELL_JWT_SECRET in production");
        }

        Ok(())
    }

    /// `host:port` to listen on.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.bind_addr, self.server.port)
    }

    /// Pool settings for [`rentwell_db::Database::new`].
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(self.database.path.clone())
            .max_connections(self.database.max_connections)
            .busy_timeout(Duration::from_millis(self.database.busy_timeout_ms))
    }

    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "rentwell", "rentwell")
            .map(|dirs| dirs.config_dir().join("rentwell.toml"))
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue(name.to_string()))
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Failed to read config file {path:?}: {source}")]
    ReadFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config file: {0}")]
    Parse(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = ApiConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.bind_address(), "0.0.0.0:8080");
        assert_eq!(config.rentals.pricing_policy, PricingPolicy::TrustClient);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: ApiConfig = toml::from_str(
            r#"
            [server]
            port = 9000

            [rentals]
            pricing_policy = "recompute"
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.bind_addr, "0.0.0.0");
        assert_eq!(config.database.busy_timeout_ms, 5000);
        assert_eq!(config.rentals.pricing_policy, PricingPolicy::Recompute);
    }

    #[test]
    fn test_env_overrides_file_values() {
        let mut config = ApiConfig::default();
        config
            .apply_overrides(env(&[
                ("RENTWELL_PORT", "3000"),
                ("RENTWELL_DATABASE_PATH", "/tmp/r.db"),
                ("RENTWELL_PRICING_POLICY", "Recompute"),
                ("RENTWELL_DB_BUSY_TIMEOUT_MS", "250"),
            ]))
            .unwrap();

        assert_eq!(config.server.port, 3000);
        assert_eq!(config.database.path, PathBuf::from("/tmp/r.db"));
        assert_eq!(config.rentals.pricing_policy, PricingPolicy::Recompute);
        assert_eq!(config.database.busy_timeout_ms, 250);
    }

    #[test]
    fn test_bad_env_value_is_rejected() {
        let mut config = ApiConfig::default();
        let err = config
            .apply_overrides(env(&[("RENTWELL_PORT", "eighty")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(name) if name == "RENTWELL_PORT"));

        let err = config
            .apply_overrides(env(&[("RENTWELL_PRICING_POLICY", "haggle")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(_)));
    }

    #[test]
    fn test_validate_rejects_empty_secret() {
        let mut config = ApiConfig::default();
        config.auth.jwt_secret = "  ".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingRequired(_))
        ));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rentwell.toml");
        std::fs::write(&path, "[auth]\njwt_secret = \"s3cret\"\n").unwrap();

        let config = ApiConfig::from_file(&path).unwrap();
        assert_eq!(config.auth.jwt_secret, "s3cret");

        std::fs::write(&path, "[server\n").unwrap();
        assert!(matches!(
            ApiConfig::from_file(&path),
            Err(ConfigError::Parse(_))
        ));
    }
}
