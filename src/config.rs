//! Configuration loading from TOML with environment variable resolution.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs.
//! Secrets (API keys) are referenced by env-var name in the config and
//! resolved at runtime via `std::env::var`.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AppConfig {
    pub storage: StorageConfig,
    pub cache: CacheConfig,
    pub nhl: NhlConfig,
    pub golf: GolfConfig,
    pub nfl: NflConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    /// SQLite database file holding all fact and aggregate tables.
    pub db_path: String,
    /// Root directory for raw JSON snapshots written before DB load.
    pub raw_dir: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct CacheConfig {
    /// Root directory for the on-disk HTTP response cache.
    pub root: String,
    /// TTL for endpoints with no better classification.
    pub default_ttl_secs: u64,
    /// Short TTL for live/standings-like data that moves during a session.
    pub live_ttl_secs: u64,
    /// Long TTL for finalized historical data (past seasons, completed
    /// tournaments) that will never change.
    pub historical_ttl_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct NhlConfig {
    /// Minimum delay between outbound requests, in milliseconds.
    pub delay_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct GolfConfig {
    pub delay_ms: u64,
    /// Env var holding the RapidAPI key for the Live Golf Data API.
    pub api_key_env: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct NflConfig {
    pub delay_ms: u64,
    /// Env var holding the BallDontLie API key.
    pub api_key_env: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            storage: StorageConfig::default(),
            cache: CacheConfig::default(),
            nhl: NhlConfig::default(),
            golf: GolfConfig::default(),
            nfl: NflConfig::default(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: "data/stats.db".into(),
            raw_dir: "data/raw".into(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            root: "data/cache".into(),
            default_ttl_secs: 3_600,
            live_ttl_secs: 300,
            historical_ttl_secs: 86_400 * 7,
        }
    }
}

impl Default for NhlConfig {
    fn default() -> Self {
        // ~150 req/min, comfortably under what the NHL API tolerates.
        Self { delay_ms: 400 }
    }
}

impl Default for GolfConfig {
    fn default() -> Self {
        Self {
            delay_ms: 600,
            api_key_env: "RAPIDAPI_KEY".into(),
        }
    }
}

impl Default for NflConfig {
    fn default() -> Self {
        // ALL-STAR tier is 60 req/min.
        Self {
            delay_ms: 1_100,
            api_key_env: "BALLDONTLIE_API_KEY".into(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        let config: AppConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {path}"))?;
        Ok(config)
    }

    /// Load from `path` if it exists, otherwise fall back to defaults.
    pub fn load_or_default(path: &str) -> Result<Self> {
        if Path::new(path).exists() {
            Self::load(path)
        } else {
            tracing::warn!(path, "Config file not found, using built-in defaults");
            Ok(Self::default())
        }
    }

    /// Resolve an environment variable name to its value.
    /// Useful for loading secrets referenced in the config.
    pub fn resolve_env(env_name: &str) -> Result<String> {
        std::env::var(env_name)
            .with_context(|| format!("Environment variable not set: {env_name}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.storage.db_path, "data/stats.db");
        assert_eq!(cfg.cache.live_ttl_secs, 300);
        assert_eq!(cfg.cache.historical_ttl_secs, 86_400 * 7);
        assert_eq!(cfg.nhl.delay_ms, 400);
        assert_eq!(cfg.nfl.delay_ms, 1_100);
    }

    #[test]
    fn test_parse_partial_toml() {
        let cfg: AppConfig = toml::from_str(
            r#"
            [storage]
            db_path = "/tmp/x.db"

            [golf]
            delay_ms = 900
            "#,
        )
        .unwrap();
        assert_eq!(cfg.storage.db_path, "/tmp/x.db");
        assert_eq!(cfg.golf.delay_ms, 900);
        // Unspecified sections fall back to defaults
        assert_eq!(cfg.golf.api_key_env, "RAPIDAPI_KEY");
        assert_eq!(cfg.cache.default_ttl_secs, 3_600);
    }

    #[test]
    fn test_shipped_config_parses() {
        let cfg: AppConfig = toml::from_str(include_str!("../config.toml")).unwrap();
        assert_eq!(cfg.storage.db_path, "data/stats.db");
        assert_eq!(cfg.cache.historical_ttl_secs, 604_800);
        assert_eq!(cfg.golf.api_key_env, "RAPIDAPI_KEY");
        assert_eq!(cfg.nfl.api_key_env, "BALLDONTLIE_API_KEY");
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let cfg = AppConfig::load_or_default("/tmp/statline_no_such_config.toml").unwrap();
        assert_eq!(cfg.nhl.delay_ms, 400);
    }

    #[test]
    fn test_resolve_env_missing() {
        assert!(AppConfig::resolve_env("STATLINE_DEFINITELY_UNSET_VAR").is_err());
    }
}
