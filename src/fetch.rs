//! Paginated endpoint draining.
//!
//! Two upstream pagination styles exist in this pipeline: offset+total
//! (NHL stats REST, `start`/`limit` with a reported `total`) and opaque
//! cursor (BallDontLie, `meta.next_cursor`). `Paginator` drains either
//! style into one combined record list, preserving server order and
//! caching each page independently under its own parameter set — a rerun
//! of an already-drained sequence is fully cache-served while every page
//! is fresh.
//!
//! A failed page fails the whole drain; whatever was accumulated is
//! discarded so a partial sequence is never mistaken for a complete one.

use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::client::{ApiClient, FetchError};

/// How the server advances through pages.
#[derive(Debug, Clone)]
pub enum PageMode {
    /// `?start=N&limit=M` with a `total` count in each response.
    Offset {
        start_param: &'static str,
        limit_param: &'static str,
        total_field: &'static str,
    },
    /// `?per_page=M&cursor=...` with the next cursor nested in the
    /// response metadata; absent cursor means the sequence is drained.
    Cursor {
        cursor_param: &'static str,
        per_page_param: &'static str,
        meta_field: &'static str,
        next_cursor_field: &'static str,
    },
}

/// Drains one paginated collection endpoint.
#[derive(Debug, Clone)]
pub struct Paginator {
    mode: PageMode,
    /// Response field holding the page's record array.
    data_field: &'static str,
    page_size: u32,
}

impl Paginator {
    /// NHL stats REST style: `start`/`limit` params, `data` + `total` body.
    pub fn offset(page_size: u32) -> Self {
        Self {
            mode: PageMode::Offset {
                start_param: "start",
                limit_param: "limit",
                total_field: "total",
            },
            data_field: "data",
            page_size,
        }
    }

    /// BallDontLie style: `per_page`/`cursor` params, `data` + `meta.next_cursor`.
    pub fn cursor(page_size: u32) -> Self {
        Self {
            mode: PageMode::Cursor {
                cursor_param: "cursor",
                per_page_param: "per_page",
                meta_field: "meta",
                next_cursor_field: "next_cursor",
            },
            data_field: "data",
            page_size,
        }
    }

    /// Fetch every page of `endpoint`, returning all records in server
    /// order. No deduplication — that is the collector's concern.
    pub async fn fetch_all(
        &self,
        client: &ApiClient,
        endpoint: &str,
        base_params: &[(String, String)],
        ttl: Duration,
    ) -> Result<Vec<Value>, FetchError> {
        match &self.mode {
            PageMode::Offset {
                start_param,
                limit_param,
                total_field,
            } => {
                self.drain_offset(
                    client,
                    endpoint,
                    base_params,
                    ttl,
                    start_param,
                    limit_param,
                    total_field,
                )
                .await
            }
            PageMode::Cursor {
                cursor_param,
                per_page_param,
                meta_field,
                next_cursor_field,
            } => {
                self.drain_cursor(
                    client,
                    endpoint,
                    base_params,
                    ttl,
                    cursor_param,
                    per_page_param,
                    meta_field,
                    next_cursor_field,
                )
                .await
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    async fn drain_offset(
        &self,
        client: &ApiClient,
        endpoint: &str,
        base_params: &[(String, String)],
        ttl: Duration,
        start_param: &str,
        limit_param: &str,
        total_field: &str,
    ) -> Result<Vec<Value>, FetchError> {
        let mut all = Vec::new();
        let mut start: u64 = 0;
        let mut page_no = 1;

        loop {
            let mut params = base_params.to_vec();
            params.push((start_param.to_string(), start.to_string()));
            params.push((limit_param.to_string(), self.page_size.to_string()));

            let page = client.get_json(endpoint, &params, ttl).await?;
            let records = page_records(&page, self.data_field);
            let total = page.get(total_field).and_then(Value::as_u64);

            debug!(
                endpoint,
                page = page_no,
                records = records.len(),
                total = total.unwrap_or(0),
                "Fetched offset page"
            );

            if records.is_empty() {
                break;
            }
            all.extend(records);
            start += u64::from(self.page_size);
            page_no += 1;

            if let Some(total) = total {
                if start >= total {
                    break;
                }
            }
        }

        Ok(all)
    }

    #[allow(clippy::too_many_arguments)]
    async fn drain_cursor(
        &self,
        client: &ApiClient,
        endpoint: &str,
        base_params: &[(String, String)],
        ttl: Duration,
        cursor_param: &str,
        per_page_param: &str,
        meta_field: &str,
        next_cursor_field: &str,
    ) -> Result<Vec<Value>, FetchError> {
        let mut all = Vec::new();
        let mut cursor: Option<String> = None;
        let mut page_no = 1;

        loop {
            let mut params = base_params.to_vec();
            params.push((per_page_param.to_string(), self.page_size.to_string()));
            if let Some(c) = &cursor {
                params.push((cursor_param.to_string(), c.clone()));
            }

            let page = client.get_json(endpoint, &params, ttl).await?;
            let records = page_records(&page, self.data_field);
            let next = page
                .get(meta_field)
                .and_then(|m| m.get(next_cursor_field))
                .and_then(cursor_string);

            debug!(
                endpoint,
                page = page_no,
                records = records.len(),
                next_cursor = next.as_deref().unwrap_or("-"),
                "Fetched cursor page"
            );

            let empty = records.is_empty();
            all.extend(records);

            match next {
                Some(c) if !empty => cursor = Some(c),
                _ => break,
            }
            page_no += 1;
        }

        Ok(all)
    }
}

fn page_records(page: &Value, data_field: &str) -> Vec<Value> {
    page.get(data_field)
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default()
}

/// Cursors arrive as strings or integers depending on the provider.
fn cursor_string(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::FileCache;
    use crate::client::ClientConfig;
    use serde_json::json;

    /// Client whose network is a dead end; every page must come from the
    /// pre-seeded cache or the drain fails.
    fn cache_only_client() -> ApiClient {
        let mut root = std::env::temp_dir();
        root.push(format!("statline_fetch_test_{}", uuid::Uuid::new_v4()));
        let cache = FileCache::new(root, true).unwrap();

        let mut cfg = ClientConfig::new("http://127.0.0.1:9", "test");
        cfg.min_delay = Duration::from_millis(1);
        cfg.max_attempts = 1;
        cfg.backoff_base = Duration::from_millis(1);
        cfg.timeout = Duration::from_millis(500);
        ApiClient::new(cfg, cache).unwrap()
    }

    fn offset_params(base: &[(String, String)], start: u64, limit: u32) -> Vec<(String, String)> {
        let mut p = base.to_vec();
        p.push(("start".to_string(), start.to_string()));
        p.push(("limit".to_string(), limit.to_string()));
        p
    }

    #[tokio::test]
    async fn test_offset_drain_preserves_order() {
        let client = cache_only_client();
        let base = vec![("season".to_string(), "20242025".to_string())];

        client.seed_cache(
            "skater/summary",
            &offset_params(&base, 0, 2),
            &json!({"data": [{"id": 1}, {"id": 2}], "total": 5}),
        );
        client.seed_cache(
            "skater/summary",
            &offset_params(&base, 2, 2),
            &json!({"data": [{"id": 3}, {"id": 4}], "total": 5}),
        );
        client.seed_cache(
            "skater/summary",
            &offset_params(&base, 4, 2),
            &json!({"data": [{"id": 5}], "total": 5}),
        );

        let records = Paginator::offset(2)
            .fetch_all(&client, "skater/summary", &base, Duration::from_secs(60))
            .await
            .unwrap();

        let ids: Vec<i64> = records.iter().map(|r| r["id"].as_i64().unwrap()).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
    }

    #[tokio::test]
    async fn test_offset_drain_stops_on_empty_page() {
        let client = cache_only_client();
        // No total reported: draining stops at the first empty page.
        client.seed_cache(
            "players",
            &offset_params(&[], 0, 2),
            &json!({"data": [{"id": 1}, {"id": 2}]}),
        );
        client.seed_cache("players", &offset_params(&[], 2, 2), &json!({"data": []}));

        let records = Paginator::offset(2)
            .fetch_all(&client, "players", &[], Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(records.len(), 2);
    }

    #[tokio::test]
    async fn test_cursor_drain_follows_next_cursor() {
        let client = cache_only_client();
        let base = vec![("season".to_string(), "2024".to_string())];

        let mut p1 = base.clone();
        p1.push(("per_page".to_string(), "2".to_string()));
        client.seed_cache(
            "season_stats",
            &p1,
            &json!({"data": [{"id": 10}, {"id": 11}], "meta": {"next_cursor": 42}}),
        );

        let mut p2 = base.clone();
        p2.push(("per_page".to_string(), "2".to_string()));
        p2.push(("cursor".to_string(), "42".to_string()));
        client.seed_cache(
            "season_stats",
            &p2,
            &json!({"data": [{"id": 12}], "meta": {"next_cursor": null}}),
        );

        let records = Paginator::cursor(2)
            .fetch_all(&client, "season_stats", &base, Duration::from_secs(60))
            .await
            .unwrap();

        let ids: Vec<i64> = records.iter().map(|r| r["id"].as_i64().unwrap()).collect();
        assert_eq!(ids, vec![10, 11, 12]);
    }

    #[tokio::test]
    async fn test_failed_page_fails_whole_drain() {
        let client = cache_only_client();
        // Only page one is cached; page two hits the dead network.
        client.seed_cache(
            "teams",
            &offset_params(&[], 0, 2),
            &json!({"data": [{"id": 1}, {"id": 2}], "total": 4}),
        );

        let err = Paginator::offset(2)
            .fetch_all(&client, "teams", &[], Duration::from_secs(60))
            .await
            .unwrap_err();
        assert!(err.is_transient());
    }
}
