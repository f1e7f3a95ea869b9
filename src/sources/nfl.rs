//! BallDontLie NFL API client.
//!
//! Base: `https://api.balldontlie.io/nfl/v1`, authenticated with a bare
//! API key in the `Authorization` header. Every list endpoint is
//! cursor-paginated: responses carry `{"data": [...], "meta":
//! {"next_cursor": ...}}` and pages are drained until the cursor runs out.

use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

use super::{decode_records, TtlPolicy};
use crate::cache::FileCache;
use crate::client::{ApiClient, ClientConfig, FetchError};
use crate::fetch::Paginator;

const BASE_URL: &str = "https://api.balldontlie.io/nfl/v1";

/// Cursor page size (API maximum).
const PAGE_SIZE: u32 = 100;

// ---------------------------------------------------------------------------
// API response types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct NflTeam {
    pub id: i64,
    #[serde(default)]
    pub conference: String,
    #[serde(default)]
    pub division: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub abbreviation: String,
}

/// One team's standings line for a season.
#[derive(Debug, Deserialize)]
pub struct NflStandingEntry {
    pub team: NflTeam,
    #[serde(default)]
    pub wins: i64,
    #[serde(default)]
    pub losses: i64,
    #[serde(default)]
    pub ties: i64,
    #[serde(default)]
    pub points_for: i64,
    #[serde(default)]
    pub points_against: i64,
    #[serde(default)]
    pub point_differential: i64,
    #[serde(default)]
    pub home_record: String,
    #[serde(default)]
    pub road_record: String,
    #[serde(default)]
    pub division_record: String,
    #[serde(default)]
    pub conference_record: String,
    #[serde(default)]
    pub win_streak: i64,
    #[serde(default)]
    pub playoff_seed: Option<i64>,
}

/// Player identity embedded in a season-stats record.
#[derive(Debug, Clone, Deserialize)]
pub struct NflStatPlayer {
    pub id: i64,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub position: String,
    #[serde(default)]
    pub position_abbreviation: String,
    /// Either an embedded team object or null for free agents.
    #[serde(default)]
    pub team: Value,
}

impl NflStatPlayer {
    pub fn team_id(&self) -> Option<i64> {
        self.team.get("id").and_then(Value::as_i64)
    }

    pub fn team_abbreviation(&self) -> Option<String> {
        self.team
            .get("abbreviation")
            .and_then(Value::as_str)
            .map(str::to_string)
    }
}

/// One player's aggregated season line. The API returns only the stat
/// groups the player actually accrued, so everything is optional.
#[derive(Debug, Deserialize)]
pub struct NflSeasonStat {
    pub player: NflStatPlayer,
    #[serde(default)]
    pub games_played: Option<i64>,

    // Passing
    #[serde(default)]
    pub passing_completions: Option<i64>,
    #[serde(default)]
    pub passing_attempts: Option<i64>,
    #[serde(default)]
    pub passing_yards: Option<i64>,
    #[serde(default)]
    pub passing_touchdowns: Option<i64>,
    #[serde(default)]
    pub passing_interceptions: Option<i64>,
    #[serde(default)]
    pub passing_yards_per_game: Option<f64>,
    #[serde(default)]
    pub qbr: Option<f64>,

    // Rushing
    #[serde(default)]
    pub rushing_attempts: Option<i64>,
    #[serde(default)]
    pub rushing_yards: Option<i64>,
    #[serde(default)]
    pub rushing_touchdowns: Option<i64>,
    #[serde(default)]
    pub yards_per_rush_attempt: Option<f64>,
    #[serde(default)]
    pub rushing_yards_per_game: Option<f64>,
    #[serde(default)]
    pub rushing_fumbles: Option<i64>,
    #[serde(default)]
    pub rushing_fumbles_lost: Option<i64>,
    #[serde(default)]
    pub rushing_first_downs: Option<i64>,

    // Receiving
    #[serde(default)]
    pub receptions: Option<i64>,
    #[serde(default)]
    pub receiving_targets: Option<i64>,
    #[serde(default)]
    pub receiving_yards: Option<i64>,
    #[serde(default)]
    pub receiving_touchdowns: Option<i64>,
    #[serde(default)]
    pub yards_per_reception: Option<f64>,
    #[serde(default)]
    pub receiving_yards_per_game: Option<f64>,
    #[serde(default)]
    pub receiving_fumbles: Option<i64>,
    #[serde(default)]
    pub receiving_first_downs: Option<i64>,

    // Defense
    #[serde(default)]
    pub total_tackles: Option<i64>,
    #[serde(default)]
    pub solo_tackles: Option<i64>,
    #[serde(default)]
    pub assist_tackles: Option<i64>,
    #[serde(default)]
    pub defensive_sacks: Option<f64>,
    #[serde(default)]
    pub defensive_sack_yards: Option<f64>,
    #[serde(default)]
    pub defensive_interceptions: Option<i64>,
    #[serde(default)]
    pub interception_touchdowns: Option<i64>,
    #[serde(default)]
    pub fumbles_forced: Option<i64>,
    #[serde(default)]
    pub fumbles_recovered: Option<i64>,
    #[serde(default)]
    pub fumbles_touchdowns: Option<i64>,

    // Kicking and punting
    #[serde(default)]
    pub field_goals_made: Option<i64>,
    #[serde(default)]
    pub field_goal_attempts: Option<i64>,
    #[serde(default)]
    pub field_goal_pct: Option<f64>,
    #[serde(default)]
    pub field_goals_made_1_19: Option<i64>,
    #[serde(default)]
    pub field_goals_made_20_29: Option<i64>,
    #[serde(default)]
    pub field_goals_made_30_39: Option<i64>,
    #[serde(default)]
    pub field_goals_made_40_49: Option<i64>,
    #[serde(default)]
    pub field_goals_made_50: Option<i64>,
    #[serde(default)]
    pub punts: Option<i64>,
    #[serde(default)]
    pub punt_yards: Option<i64>,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Client for the BallDontLie NFL API.
pub struct NflApi {
    client: ApiClient,
    ttl: TtlPolicy,
}

impl NflApi {
    pub fn new(
        cache: FileCache,
        api_key: Secret<String>,
        min_delay: Duration,
        ttl: TtlPolicy,
    ) -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        let mut key = HeaderValue::from_str(api_key.expose_secret())
            .map_err(|_| anyhow::anyhow!("BallDontLie key contains invalid header characters"))?;
        key.set_sensitive(true);
        headers.insert("Authorization", key);

        let mut cfg = ClientConfig::new(BASE_URL, "nfl");
        cfg.min_delay = min_delay;
        cfg.headers = headers;
        Ok(Self {
            client: ApiClient::new(cfg, cache)?,
            ttl,
        })
    }

    pub async fn teams(&self) -> Result<Vec<NflTeam>, FetchError> {
        let records = Paginator::cursor(PAGE_SIZE)
            .fetch_all(&self.client, "teams", &[], self.ttl.historical)
            .await?;
        Ok(decode_records(records, "nfl teams"))
    }

    pub async fn standings(&self, season: u32) -> Result<Vec<NflStandingEntry>, FetchError> {
        let params = vec![("season".to_string(), season.to_string())];
        let records = Paginator::cursor(PAGE_SIZE)
            .fetch_all(&self.client, "standings", &params, self.ttl.live)
            .await?;
        Ok(decode_records(records, "nfl standings"))
    }

    /// Season-aggregated player stats, regular season or playoffs.
    pub async fn season_stats(
        &self,
        season: u32,
        postseason: bool,
    ) -> Result<Vec<NflSeasonStat>, FetchError> {
        let params = vec![
            ("season".to_string(), season.to_string()),
            ("postseason".to_string(), postseason.to_string()),
        ];
        let records = Paginator::cursor(PAGE_SIZE)
            .fetch_all(&self.client, "season_stats", &params, self.ttl.default)
            .await?;
        Ok(decode_records(records, "nfl season stats"))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_standing_entry() {
        let raw = json!({
            "team": {
                "id": 14,
                "conference": "AFC",
                "division": "WEST",
                "location": "Kansas City",
                "name": "Chiefs",
                "full_name": "Kansas City Chiefs",
                "abbreviation": "KC"
            },
            "wins": 15,
            "losses": 2,
            "ties": 0,
            "points_for": 385,
            "points_against": 311,
            "point_differential": 74,
            "home_record": "8-1",
            "road_record": "7-1",
            "win_streak": 2,
            "playoff_seed": 1
        });
        let s: NflStandingEntry = serde_json::from_value(raw).unwrap();
        assert_eq!(s.team.abbreviation, "KC");
        assert_eq!(s.wins, 15);
        assert_eq!(s.playoff_seed, Some(1));
    }

    #[test]
    fn test_decode_season_stat_partial_groups() {
        // A kicker's record carries no passing or defense groups at all.
        let raw = json!({
            "player": {
                "id": 777,
                "first_name": "Harrison",
                "last_name": "Butker",
                "position": "Place Kicker",
                "position_abbreviation": "K",
                "team": {"id": 14, "abbreviation": "KC"}
            },
            "games_played": 17,
            "field_goals_made": 33,
            "field_goal_attempts": 38,
            "field_goal_pct": 86.8
        });
        let s: NflSeasonStat = serde_json::from_value(raw).unwrap();
        assert_eq!(s.player.team_id(), Some(14));
        assert_eq!(s.player.team_abbreviation().as_deref(), Some("KC"));
        assert_eq!(s.field_goals_made, Some(33));
        assert!(s.passing_yards.is_none());
        assert!(s.total_tackles.is_none());
    }

    #[test]
    fn test_free_agent_has_no_team() {
        let raw = json!({
            "player": {"id": 9, "first_name": "A", "last_name": "B", "team": null}
        });
        let s: NflSeasonStat = serde_json::from_value(raw).unwrap();
        assert_eq!(s.player.team_id(), None);
        assert_eq!(s.player.team_abbreviation(), None);
    }

    #[test]
    fn test_stat_requires_player() {
        assert!(serde_json::from_value::<NflSeasonStat>(json!({"games_played": 1})).is_err());
    }
}
