//! On-disk HTTP response cache.
//!
//! One JSON file per cache key under a cache root directory. The key is
//! derived deterministically from (endpoint, parameters): a human-readable
//! slug of the endpoint plus a short hash of the full parameter set, so
//! distinct parameter sets never collide and entries stay easy to inspect
//! by hand. Freshness is judged from the file's mtime against a per-read
//! TTL; a stale entry is treated as absent and overwritten on the next
//! write. The whole directory is disposable — deleting it only costs
//! upstream calls.

use serde_json::Value;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tracing::{debug, warn};

/// Maximum length of the human-readable slug portion of a cache filename.
const SLUG_MAX: usize = 60;

/// Build a cache key from a source prefix, endpoint path and the request's
/// query parameters. Parameters are sorted before hashing so the key is
/// independent of the order the caller supplied them in.
pub fn cache_key(prefix: &str, endpoint: &str, params: &[(String, String)]) -> String {
    let mut sorted: Vec<&(String, String)> = params.iter().collect();
    sorted.sort();

    let mut hasher = Sha256::new();
    hasher.update(endpoint.as_bytes());
    for (k, v) in &sorted {
        hasher.update(b"\x1f");
        hasher.update(k.as_bytes());
        hasher.update(b"=");
        hasher.update(v.as_bytes());
    }
    let digest = hex::encode(hasher.finalize());

    let mut slug: String = endpoint
        .trim_matches('/')
        .replace('/', "_")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .collect();
    slug.truncate(SLUG_MAX);

    format!("{prefix}__{slug}__{}.json", &digest[..12])
}

/// File-per-key response cache rooted at a single directory.
#[derive(Debug, Clone)]
pub struct FileCache {
    root: PathBuf,
    enabled: bool,
}

impl FileCache {
    /// Create a cache rooted at `root`, creating the directory if needed.
    /// A disabled cache never hits and never writes.
    pub fn new(root: impl Into<PathBuf>, enabled: bool) -> std::io::Result<Self> {
        let root = root.into();
        if enabled {
            std::fs::create_dir_all(&root)?;
        }
        Ok(Self { root, enabled })
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }

    /// Return the cached payload for `key` if it exists and is younger
    /// than `ttl`. Unreadable or corrupt entries count as misses.
    pub fn read(&self, key: &str, ttl: Duration) -> Option<Value> {
        if !self.enabled {
            return None;
        }
        let path = self.path_for(key);
        let age = entry_age(&path)?;
        if age > ttl {
            debug!(key, age_secs = age.as_secs(), "Cache entry expired");
            return None;
        }
        let text = std::fs::read_to_string(&path).ok()?;
        match serde_json::from_str(&text) {
            Ok(value) => {
                debug!(key, "Cache hit");
                Some(value)
            }
            Err(e) => {
                warn!(key, error = %e, "Discarding corrupt cache entry");
                None
            }
        }
    }

    /// Persist a payload under `key`, replacing any existing entry.
    /// Failures are logged and swallowed — a broken cache must never fail
    /// a request that already succeeded upstream.
    pub fn write(&self, key: &str, value: &Value) {
        if !self.enabled {
            return;
        }
        let path = self.path_for(key);
        let text = match serde_json::to_string_pretty(value) {
            Ok(t) => t,
            Err(e) => {
                warn!(key, error = %e, "Failed to serialize cache entry");
                return;
            }
        };
        if let Err(e) = std::fs::write(&path, text) {
            warn!(key, error = %e, "Failed to write cache entry");
        }
    }
}

fn entry_age(path: &Path) -> Option<Duration> {
    let modified = std::fs::metadata(path).ok()?.modified().ok()?;
    SystemTime::now().duration_since(modified).ok()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn temp_cache() -> FileCache {
        let mut root = std::env::temp_dir();
        root.push(format!("statline_cache_test_{}", uuid::Uuid::new_v4()));
        FileCache::new(root, true).unwrap()
    }

    #[test]
    fn test_key_is_order_independent() {
        let a = vec![
            ("year".to_string(), "2025".to_string()),
            ("tournId".to_string(), "006".to_string()),
        ];
        let b = vec![
            ("tournId".to_string(), "006".to_string()),
            ("year".to_string(), "2025".to_string()),
        ];
        assert_eq!(
            cache_key("golf", "leaderboard", &a),
            cache_key("golf", "leaderboard", &b)
        );
    }

    #[test]
    fn test_key_distinguishes_params() {
        let a = vec![("year".to_string(), "2024".to_string())];
        let b = vec![("year".to_string(), "2025".to_string())];
        assert_ne!(
            cache_key("golf", "schedule", &a),
            cache_key("golf", "schedule", &b)
        );
    }

    #[test]
    fn test_key_has_readable_slug() {
        let key = cache_key("nhl", "skater/summary", &[]);
        assert!(key.starts_with("nhl__skater_summary__"));
        assert!(key.ends_with(".json"));
    }

    #[test]
    fn test_roundtrip_fresh_entry() {
        let cache = temp_cache();
        let payload = json!({"data": [1, 2, 3], "total": 3});
        cache.write("k1.json", &payload);

        let got = cache.read("k1.json", Duration::from_secs(60));
        assert_eq!(got, Some(payload));
    }

    #[test]
    fn test_expired_entry_is_a_miss() {
        let cache = temp_cache();
        cache.write("k2.json", &json!({"x": 1}));
        // Zero TTL: any entry already written is older than its TTL.
        assert_eq!(cache.read("k2.json", Duration::ZERO), None);
    }

    #[test]
    fn test_missing_entry_is_a_miss() {
        let cache = temp_cache();
        assert_eq!(cache.read("nope.json", Duration::from_secs(60)), None);
    }

    #[test]
    fn test_corrupt_entry_is_a_miss() {
        let cache = temp_cache();
        std::fs::write(cache.path_for("bad.json"), "{not json").unwrap();
        assert_eq!(cache.read("bad.json", Duration::from_secs(60)), None);
    }

    #[test]
    fn test_disabled_cache_never_hits() {
        let mut root = std::env::temp_dir();
        root.push(format!("statline_cache_off_{}", uuid::Uuid::new_v4()));
        let cache = FileCache::new(root, false).unwrap();
        cache.write("k.json", &json!(1));
        assert_eq!(cache.read("k.json", Duration::from_secs(60)), None);
    }

    #[test]
    fn test_write_overwrites() {
        let cache = temp_cache();
        cache.write("k.json", &json!({"v": 1}));
        cache.write("k.json", &json!({"v": 2}));
        let got = cache.read("k.json", Duration::from_secs(60)).unwrap();
        assert_eq!(got["v"], 2);
    }
}
