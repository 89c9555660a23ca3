//! # Configuration
//!
//! Server settings come from three layers, later ones winning:
//!
//! 1. Built-in defaults
//! 2. A TOML file (`schoolhouse.toml`, or the path given with `-c`)
//! 3. `SCHOOLHOUSE_*` environment variables
//!
//! ## Environment Variables
//!
//! - `SCHOOLHOUSE_HOST`, `SCHOOLHOUSE_PORT`: bind address
//! - `SCHOOLHOUSE_CORS_ORIGINS`: comma-separated origins, or "*" for all
//! - `SCHOOLHOUSE_RATE_LIMIT`: requests per second (0 disables)
//! - `SCHOOLHOUSE_SESSION_TTL`: login lifetime in seconds
//! - `SCHOOLHOUSE_REMEMBER_TTL`: "remember me" login lifetime in seconds

use crate::AppError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Config file read when `-c` is not given and the file exists.
pub const DEFAULT_CONFIG_FILE: &str = "schoolhouse.toml";

/// Runtime configuration of the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Allowed CORS origins. Empty means localhost only; `["*"]` allows all.
    pub cors_origins: Vec<String>,
    /// Global requests per second. 0 disables rate limiting.
    pub rate_limit: u32,
    /// Lifetime of a login session in seconds.
    pub session_ttl_secs: u64,
    /// Lifetime of a "remember me" login in seconds.
    pub remember_ttl_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            cors_origins: Vec::new(),
            rate_limit: 100,
            session_ttl_secs: 12 * 60 * 60,
            remember_ttl_secs: 14 * 24 * 60 * 60,
        }
    }
}

impl Config {
    /// Parse a TOML document. Missing keys keep their defaults.
    pub fn from_toml(text: &str) -> Result<Self, AppError> {
        toml::from_str(text).map_err(|e| AppError::Config(format!("Invalid config: {}", e)))
    }

    /// Load configuration from an explicit file, or from `schoolhouse.toml`
    /// if present, then apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, AppError> {
        let mut config = match path {
            Some(path) => Self::read_file(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
                Self::read_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    fn read_file(path: &Path) -> Result<Self, AppError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Cannot read config '{}': {}", path.display(), e))
        })?;
        let config = Self::from_toml(&text)?;
        tracing::info!(path = %path.display(), "loaded configuration file");
        Ok(config)
    }

    /// Apply `SCHOOLHOUSE_*` overrides read through `lookup`.
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), AppError> {
        if let Some(host) = lookup("SCHOOLHOUSE_HOST") {
            self.host = host;
        }
        if let Some(port) = lookup("SCHOOLHOUSE_PORT") {
            self.port = parse_number("SCHOOLHOUSE_PORT", &port)?;
        }
        if let Some(origins) = lookup("SCHOOLHOUSE_CORS_ORIGINS") {
            self.cors_origins = origins
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(String::from)
                .collect();
        }
        if let Some(rate) = lookup("SCHOOLHOUSE_RATE_LIMIT") {
            self.rate_limit = parse_number("SCHOOLHOUSE_RATE_LIMIT", &rate)?;
        }
        if let Some(ttl) = lookup("SCHOOLHOUSE_SESSION_TTL") {
            self.session_ttl_secs = parse_number("SCHOOLHOUSE_SESSION_TTL", &ttl)?;
        }
        if let Some(ttl) = lookup("SCHOOLHOUSE_REMEMBER_TTL") {
            self.remember_ttl_secs = parse_number("SCHOOLHOUSE_REMEMBER_TTL", &ttl)?;
        }
        Ok(())
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, AppError> {
    value
        .trim()
        .parse()
        .map_err(|_| AppError::Config(format!("{} must be a number, got '{}'", key, value)))
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = Config::from_toml("port = 9000\ncors_origins = [\"https://school.example\"]")
            .expect("parse");
        assert_eq!(config.port, 9000);
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.cors_origins, vec!["https://school.example"]);
        assert_eq!(config.rate_limit, 100);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(Config::from_toml("prot = 9000").is_err());
    }

    #[test]
    fn environment_overrides_file_values() {
        let env: HashMap<&str, &str> = [
            ("SCHOOLHOUSE_PORT", "7000"),
            ("SCHOOLHOUSE_RATE_LIMIT", "0"),
            ("SCHOOLHOUSE_CORS_ORIGINS", "http://a.test, http://b.test,"),
        ]
        .into();
        let mut config = Config::default();
        config
            .apply_overrides(|k| env.get(k).map(|v| (*v).to_string()))
            .expect("overrides");
        assert_eq!(config.port, 7000);
        assert_eq!(config.rate_limit, 0);
        assert_eq!(config.cors_origins, vec!["http://a.test", "http://b.test"]);
    }

    #[test]
    fn bad_numbers_are_reported() {
        let mut config = Config::default();
        let result = config.apply_overrides(|k| (k == "SCHOOLHOUSE_PORT").then(|| "eighty".into()));
        assert!(matches!(result, Err(AppError::Config(_))));
    }
}
