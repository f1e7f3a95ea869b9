//! Upstream API clients, one module per provider.
//!
//! Each client wraps an [`ApiClient`](crate::client::ApiClient) with typed
//! endpoint methods and serde response structs, the only place that knows
//! that provider's URL layout, auth headers and pagination style.

pub mod golf;
pub mod nfl;
pub mod nhl;

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tracing::warn;

use crate::config::CacheConfig;

/// Cache freshness windows per endpoint class.
///
/// Live data (current standings) gets minutes; finalized historical data
/// (past-season rosters, completed tournaments) gets days.
#[derive(Debug, Clone, Copy)]
pub struct TtlPolicy {
    pub default: Duration,
    pub live: Duration,
    pub historical: Duration,
}

impl TtlPolicy {
    pub fn from_config(cfg: &CacheConfig) -> Self {
        Self {
            default: Duration::from_secs(cfg.default_ttl_secs),
            live: Duration::from_secs(cfg.live_ttl_secs),
            historical: Duration::from_secs(cfg.historical_ttl_secs),
        }
    }
}

/// Decode a list of raw JSON records into typed response structs.
///
/// A record that fails to decode is logged and dropped — one malformed
/// upstream record must not discard the rest of the page.
pub(crate) fn decode_records<T: DeserializeOwned>(records: Vec<Value>, what: &str) -> Vec<T> {
    let total = records.len();
    let decoded: Vec<T> = records
        .into_iter()
        .filter_map(|r| match serde_json::from_value(r) {
            Ok(t) => Some(t),
            Err(e) => {
                warn!(what, error = %e, "Skipping undecodable record");
                None
            }
        })
        .collect();
    if decoded.len() < total {
        warn!(
            what,
            dropped = total - decoded.len(),
            kept = decoded.len(),
            "Some records failed to decode"
        );
    }
    decoded
}
