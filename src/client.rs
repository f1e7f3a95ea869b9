//! Rate-limited, cache-backed HTTP client.
//!
//! Every upstream provider gets its own `ApiClient`, constructed with the
//! provider's base URL, auth headers and minimum inter-request delay. A
//! request first consults the on-disk cache; a fresh entry is returned with
//! zero network calls and no rate-limit delay consumed. A genuine network
//! call waits out the minimum delay since the previous one, then retries
//! transient failures (HTTP 429/5xx, timeouts, connection errors) with
//! exponential backoff before giving up. Responses are written back to the
//! cache unconditionally, empty result sets included, so an endpoint that
//! legitimately has no data is not hammered on every run.

use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{info, warn};

use crate::cache::{cache_key, FileCache};

const USER_AGENT: &str = "statline/0.1.0 (stats-pipeline)";

/// Statuses worth retrying: rate limiting and transient server failures.
const RETRYABLE: [u16; 5] = [429, 500, 502, 503, 504];

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Failure modes of a single logical fetch.
///
/// Collectors use `is_transient` only for logging flavor — both transient
/// and permanent fetch errors are handled the same way at the resource
/// level (log, skip the resource, keep collecting). Persistence errors are
/// a different story and never pass through this type.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Non-retryable HTTP status (4xx other than 429).
    #[error("HTTP {status} for {endpoint}")]
    Status {
        endpoint: String,
        status: StatusCode,
    },

    /// Retries exhausted on 429/5xx or repeated transport failures.
    #[error("{endpoint}: giving up after {attempts} attempts ({last})")]
    RetriesExhausted {
        endpoint: String,
        attempts: u32,
        last: String,
    },

    /// Transport failure that is not worth retrying.
    #[error("request to {endpoint} failed: {source}")]
    Network {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    /// Body arrived but is not valid JSON.
    #[error("invalid JSON from {endpoint}: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },
}

impl FetchError {
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            FetchError::RetriesExhausted { .. } | FetchError::Network { .. }
        )
    }
}

// ---------------------------------------------------------------------------
// Rate limiter
// ---------------------------------------------------------------------------

/// Enforces a minimum delay between consecutive outbound requests.
///
/// The delay applies across all endpoints on the same client — it is a
/// hard ceiling on request rate regardless of how many logical callers
/// are active. Cache hits never touch the limiter.
#[derive(Debug)]
pub struct RateLimiter {
    min_delay: Duration,
    last: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(min_delay: Duration) -> Self {
        Self {
            min_delay,
            last: Mutex::new(None),
        }
    }

    /// Block until at least `min_delay` has passed since the last `mark`.
    pub async fn throttle(&self) {
        let last = *self.last.lock().await;
        if let Some(t) = last {
            let elapsed = t.elapsed();
            if elapsed < self.min_delay {
                tokio::time::sleep(self.min_delay - elapsed).await;
            }
        }
    }

    /// Record that an outbound request was just issued.
    pub async fn mark(&self) {
        *self.last.lock().await = Some(Instant::now());
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Per-provider client settings.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    /// Prefix namespacing this provider's cache entries (e.g. "nhl").
    pub cache_prefix: String,
    /// Minimum delay between consecutive network requests.
    pub min_delay: Duration,
    /// Per-request timeout. A timeout counts as a transient failure.
    pub timeout: Duration,
    /// Total attempts per request, first try included.
    pub max_attempts: u32,
    /// Base backoff; doubles on each retry.
    pub backoff_base: Duration,
    /// Provider auth headers, applied to every request.
    pub headers: HeaderMap,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>, cache_prefix: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            cache_prefix: cache_prefix.into(),
            min_delay: Duration::from_millis(400),
            timeout: Duration::from_secs(20),
            max_attempts: 4,
            backoff_base: Duration::from_millis(1_500),
            headers: HeaderMap::new(),
        }
    }
}

/// Rate-limited, cache-backed GET client for one upstream provider.
pub struct ApiClient {
    http: reqwest::Client,
    cfg: ClientConfig,
    cache: FileCache,
    limiter: Arc<RateLimiter>,
}

impl ApiClient {
    pub fn new(cfg: ClientConfig, cache: FileCache) -> anyhow::Result<Self> {
        let limiter = Arc::new(RateLimiter::new(cfg.min_delay));
        Self::with_shared_limiter(cfg, cache, limiter)
    }

    /// Build a client sharing a rate limiter with another client.
    ///
    /// Providers that spread one logical API over several base URLs (the
    /// NHL web and stats hosts) must still honor a single request-rate
    /// ceiling across all of them.
    pub fn with_shared_limiter(
        cfg: ClientConfig,
        cache: FileCache,
        limiter: Arc<RateLimiter>,
    ) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(cfg.timeout)
            .user_agent(USER_AGENT)
            .default_headers(cfg.headers.clone())
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build HTTP client: {e}"))?;

        Ok(Self {
            http,
            cfg,
            cache,
            limiter,
        })
    }

    /// The cache key this client would use for a request. Exposed so
    /// callers (and tests) can pre-seed or inspect cache entries.
    pub fn request_key(&self, endpoint: &str, params: &[(String, String)]) -> String {
        cache_key(&self.cfg.cache_prefix, endpoint, params)
    }

    /// GET `endpoint` with `params`, honoring cache, rate limit and retry.
    ///
    /// `ttl` selects the freshness window for the cache read; the caller
    /// picks it per endpoint class (live vs historical).
    pub async fn get_json(
        &self,
        endpoint: &str,
        params: &[(String, String)],
        ttl: Duration,
    ) -> Result<Value, FetchError> {
        let key = self.request_key(endpoint, params);
        if let Some(hit) = self.cache.read(&key, ttl) {
            return Ok(hit);
        }

        let url = format!(
            "{}/{}",
            self.cfg.base_url.trim_end_matches('/'),
            endpoint.trim_start_matches('/')
        );

        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            self.limiter.throttle().await;
            info!(endpoint, attempt, "GET {url}");

            let result = self.http.get(&url).query(params).send().await;
            self.limiter.mark().await;

            match result {
                Ok(resp) => {
                    let status = resp.status();
                    if status.is_success() {
                        let body = resp.text().await.map_err(|source| FetchError::Network {
                            endpoint: endpoint.to_string(),
                            source,
                        })?;
                        let value = serde_json::from_str(&body).map_err(|source| {
                            FetchError::Decode {
                                endpoint: endpoint.to_string(),
                                source,
                            }
                        })?;
                        self.cache.write(&key, &value);
                        return Ok(value);
                    }

                    if RETRYABLE.contains(&status.as_u16()) {
                        if attempt < self.cfg.max_attempts {
                            let delay = self.backoff(attempt);
                            warn!(
                                endpoint,
                                %status,
                                attempt,
                                delay_ms = delay.as_millis() as u64,
                                "Transient HTTP error, backing off"
                            );
                            tokio::time::sleep(delay).await;
                            continue;
                        }
                        return Err(FetchError::RetriesExhausted {
                            endpoint: endpoint.to_string(),
                            attempts: attempt,
                            last: format!("HTTP {status}"),
                        });
                    }

                    return Err(FetchError::Status {
                        endpoint: endpoint.to_string(),
                        status,
                    });
                }
                Err(e) if e.is_timeout() || e.is_connect() => {
                    if attempt < self.cfg.max_attempts {
                        let delay = self.backoff(attempt);
                        warn!(
                            endpoint,
                            error = %e,
                            attempt,
                            delay_ms = delay.as_millis() as u64,
                            "Transport error, backing off"
                        );
                        tokio::time::sleep(delay).await;
                        continue;
                    }
                    return Err(FetchError::RetriesExhausted {
                        endpoint: endpoint.to_string(),
                        attempts: attempt,
                        last: e.to_string(),
                    });
                }
                Err(source) => {
                    return Err(FetchError::Network {
                        endpoint: endpoint.to_string(),
                        source,
                    });
                }
            }
        }
    }

    fn backoff(&self, attempt: u32) -> Duration {
        // 1.5s, 3s, 6s, ... for the default base.
        self.cfg.backoff_base * 2u32.saturating_pow(attempt.saturating_sub(1))
    }

    /// Seed the cache for a request without going to the network.
    #[cfg(test)]
    pub fn seed_cache(&self, endpoint: &str, params: &[(String, String)], value: &Value) {
        let key = self.request_key(endpoint, params);
        self.cache.write(&key, value);
        tracing::debug!(key, "Seeded cache entry");
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
