//! Live Golf Data API client (RapidAPI).
//!
//! Host: `https://live-golf-data.p.rapidapi.com`. Auth is the standard
//! RapidAPI header pair (`x-rapidapi-host`, `x-rapidapi-key`). Two
//! endpoints matter here: `/schedule?year=` for the season calendar and
//! `/leaderboard?tournId=&year=` for final results.
//!
//! The payloads come out of a Mongo-backed service, so numeric fields
//! arrive in several shapes (plain numbers, numeric strings, or
//! `{"$numberInt": "..."}` wrappers). Fields with unstable shapes are kept
//! as raw [`Value`]s and coerced by the normalization layer.

use chrono::{Datelike, Utc};
use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

use super::{decode_records, TtlPolicy};
use crate::cache::FileCache;
use crate::client::{ApiClient, ClientConfig, FetchError};
use crate::types::loose_string;

const BASE_URL: &str = "https://live-golf-data.p.rapidapi.com";
const RAPIDAPI_HOST: &str = "live-golf-data.p.rapidapi.com";

// ---------------------------------------------------------------------------
// API response types
// ---------------------------------------------------------------------------

/// One tournament from the season schedule.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GolfScheduleEntry {
    #[serde(default)]
    pub tourn_id: String,
    #[serde(default)]
    pub name: String,
    /// Either `{"start": "...", "end": "..."}` or `{"weekNumber": ...}`
    /// variants show up; keep raw and pick dates out leniently.
    #[serde(default)]
    pub date: Value,
    #[serde(default)]
    pub format: String,
    #[serde(default)]
    pub purse: Value,
    #[serde(default)]
    pub winners_share: Value,
    #[serde(default)]
    pub fedex_cup_points: Value,
}

impl GolfScheduleEntry {
    /// "YYYY-MM-DD" start date, if present.
    pub fn start_date(&self) -> Option<String> {
        date_field(&self.date, "start")
    }

    /// "YYYY-MM-DD" end date, if present.
    pub fn end_date(&self) -> Option<String> {
        date_field(&self.date, "end")
    }
}

fn date_field(date: &Value, key: &str) -> Option<String> {
    let raw = date.get(key).and_then(loose_string)?;
    if raw.len() < 10 {
        return None;
    }
    Some(raw[..10].to_string())
}

/// One player's line from a tournament leaderboard.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GolfLeaderboardRow {
    #[serde(default)]
    pub player_id: Value,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    /// "1", "T5", "CUT", "-" ...
    #[serde(default)]
    pub position: String,
    /// "active", "complete", "cut", "wd", "dq" ...
    #[serde(default)]
    pub status: String,
    /// Score to par, e.g. "-18" or "E".
    #[serde(default)]
    pub total: Value,
    #[serde(default)]
    pub total_strokes_from_completed_rounds: Value,
    #[serde(default)]
    pub is_amateur: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LeaderboardPayload {
    #[serde(default)]
    leaderboard_rows: Vec<Value>,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Client for the Live Golf Data API.
pub struct GolfApi {
    client: ApiClient,
    ttl: TtlPolicy,
}

impl GolfApi {
    pub fn new(
        cache: FileCache,
        api_key: Secret<String>,
        min_delay: Duration,
        ttl: TtlPolicy,
    ) -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert("x-rapidapi-host", HeaderValue::from_static(RAPIDAPI_HOST));
        let mut key = HeaderValue::from_str(api_key.expose_secret())
            .map_err(|_| anyhow::anyhow!("RapidAPI key contains invalid header characters"))?;
        key.set_sensitive(true);
        headers.insert("x-rapidapi-key", key);

        let mut cfg = ClientConfig::new(BASE_URL, "golf");
        cfg.min_delay = min_delay;
        cfg.headers = headers;
        Ok(Self {
            client: ApiClient::new(cfg, cache)?,
            ttl,
        })
    }

    /// Season schedule for one year. The API has served both a bare list
    /// and wrapped objects; accept all of them.
    pub async fn schedule(&self, year: u32) -> Result<Vec<GolfScheduleEntry>, FetchError> {
        let params = vec![
            ("orgId".to_string(), "1".to_string()),
            ("year".to_string(), year.to_string()),
        ];
        let ttl = schedule_ttl(&self.ttl, year, Utc::now().year() as u32);
        let raw = self.client.get_json("schedule", &params, ttl).await?;
        let records = match raw {
            Value::Array(items) => items,
            Value::Object(mut map) => map
                .remove("schedule")
                .or_else(|| map.remove("tournaments"))
                .and_then(|v| v.as_array().cloned())
                .unwrap_or_default(),
            _ => Vec::new(),
        };
        Ok(decode_records(records, "golf schedule"))
    }

    /// Detail record for one tournament. Used to backfill dates when the
    /// schedule entry's date block is unusable.
    pub async fn tournament(
        &self,
        tourn_id: &str,
        year: u32,
    ) -> Result<GolfScheduleEntry, FetchError> {
        let params = vec![
            ("orgId".to_string(), "1".to_string()),
            ("tournId".to_string(), tourn_id.to_string()),
            ("year".to_string(), year.to_string()),
        ];
        let raw = self
            .client
            .get_json("tournament", &params, self.ttl.historical)
            .await?;
        serde_json::from_value(raw).map_err(|source| FetchError::Decode {
            endpoint: "tournament".to_string(),
            source,
        })
    }

    /// Final leaderboard for one tournament. Completed tournaments never
    /// change, so this gets the historical TTL.
    pub async fn leaderboard(
        &self,
        tourn_id: &str,
        year: u32,
    ) -> Result<Vec<GolfLeaderboardRow>, FetchError> {
        let params = vec![
            ("orgId".to_string(), "1".to_string()),
            ("tournId".to_string(), tourn_id.to_string()),
            ("year".to_string(), year.to_string()),
        ];
        let raw = self
            .client
            .get_json("leaderboard", &params, self.ttl.historical)
            .await?;
        let payload: LeaderboardPayload = serde_json::from_value(raw).unwrap_or_default();
        Ok(decode_records(payload.leaderboard_rows, "golf leaderboard"))
    }
}

/// Past seasons are final, so their schedules get the long TTL; the
/// current year's calendar can still change.
fn schedule_ttl(ttl: &TtlPolicy, year: u32, current_year: u32) -> Duration {
    if year < current_year {
        ttl.historical
    } else {
        ttl.default
    }
}

/// Keep only tournaments whose end date has passed — leaderboards for
/// events still in progress would load partial results.
pub fn completed_before_today(entries: &[GolfScheduleEntry]) -> Vec<&GolfScheduleEntry> {
    let today = Utc::now().format("%Y-%m-%d").to_string();
    entries
        .iter()
        .filter(|e| match e.end_date() {
            Some(end) => end.as_str() < today.as_str(),
            None => false,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
