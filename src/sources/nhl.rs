//! NHL Stats API client.
//!
//! Two hosts make up one logical API:
//! - `https://api-web.nhle.com/v1` — standings, rosters, club schedules
//!   and per-player game logs.
//! - `https://api.nhle.com/stats/rest/en` — the legacy stats REST
//!   endpoint, still active, and the only place that returns every skater
//!   or goalie stat in a single record (offset-paginated, max 100/page).
//!
//! Auth: none. Both hosts share one rate limiter so the combined request
//! rate stays bounded.

use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

use super::{decode_records, TtlPolicy};
use crate::cache::FileCache;
use crate::client::{ApiClient, ClientConfig, FetchError, RateLimiter};
use crate::fetch::Paginator;

const WEB_BASE_URL: &str = "https://api-web.nhle.com/v1";
const STATS_BASE_URL: &str = "https://api.nhle.com/stats/rest/en";

/// Season to assume when the standings payload is empty.
const FALLBACK_SEASON: &str = "20242025";

/// Stats REST page size (API maximum).
const SUMMARY_PAGE_SIZE: u32 = 100;

// ---------------------------------------------------------------------------
// API response types (NHL JSON → Rust)
// ---------------------------------------------------------------------------

/// Localized name wrapper ({"default": "...", "fr": ...}).
#[derive(Debug, Default, Clone, Deserialize)]
pub struct Localized {
    #[serde(default)]
    pub default: String,
}

/// One club's line from `/standings/...`. The standings payload doubles as
/// the team directory — it carries full team info for every franchise.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NhlStanding {
    #[serde(default)]
    pub team_id: Option<i64>,
    #[serde(default)]
    pub season_id: Option<i64>,
    #[serde(default)]
    pub team_name: Localized,
    #[serde(default)]
    pub team_abbrev: Localized,
    #[serde(default)]
    pub conference_name: String,
    #[serde(default)]
    pub division_name: String,
    #[serde(default)]
    pub team_logo: String,
    #[serde(default)]
    pub wins: i64,
    #[serde(default)]
    pub losses: i64,
    #[serde(default)]
    pub ot_losses: i64,
    #[serde(default)]
    pub points: i64,
    #[serde(default)]
    pub games_played: i64,
    #[serde(default)]
    pub goal_for: i64,
    #[serde(default)]
    pub goal_against: i64,
    #[serde(default)]
    pub home_wins: i64,
    #[serde(default)]
    pub home_losses: i64,
    #[serde(default)]
    pub road_wins: i64,
    #[serde(default)]
    pub road_losses: i64,
    #[serde(default, rename = "l10Wins")]
    pub l10_wins: i64,
    #[serde(default, rename = "l10Losses")]
    pub l10_losses: i64,
    #[serde(default)]
    pub power_play_pct: Option<f64>,
    #[serde(default)]
    pub penalty_kill_pct: Option<f64>,
    #[serde(default)]
    pub streak_code: String,
}

/// Roster payload: players grouped by position.
#[derive(Debug, Default, Deserialize)]
pub struct NhlRoster {
    #[serde(default)]
    pub forwards: Vec<NhlRosterPlayer>,
    #[serde(default)]
    pub defensemen: Vec<NhlRosterPlayer>,
    #[serde(default)]
    pub goalies: Vec<NhlRosterPlayer>,
}

impl NhlRoster {
    /// All players across position groups, in payload order.
    pub fn all_players(&self) -> impl Iterator<Item = &NhlRosterPlayer> {
        self.forwards
            .iter()
            .chain(self.defensemen.iter())
            .chain(self.goalies.iter())
    }

    pub fn len(&self) -> usize {
        self.forwards.len() + self.defensemen.len() + self.goalies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NhlRosterPlayer {
    pub id: i64,
    #[serde(default)]
    pub first_name: Localized,
    #[serde(default)]
    pub last_name: Localized,
    #[serde(default)]
    pub sweater_number: Option<i64>,
    #[serde(default)]
    pub position_code: String,
    #[serde(default)]
    pub shoots_catches: String,
    #[serde(default)]
    pub height_in_inches: Option<i64>,
    #[serde(default)]
    pub weight_in_pounds: Option<i64>,
    #[serde(default)]
    pub birth_date: String,
    #[serde(default)]
    pub birth_country: String,
    #[serde(default)]
    pub headshot: String,
}

/// One skater record from the stats REST summary report.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NhlSkaterSummary {
    pub player_id: i64,
    #[serde(default)]
    pub skater_full_name: String,
    #[serde(default)]
    pub team_abbrevs: String,
    #[serde(default)]
    pub position_code: String,
    #[serde(default)]
    pub games_played: i64,
    #[serde(default)]
    pub goals: i64,
    #[serde(default)]
    pub assists: i64,
    #[serde(default)]
    pub points: i64,
    #[serde(default)]
    pub plus_minus: i64,
    #[serde(default)]
    pub penalty_minutes: i64,
    #[serde(default)]
    pub pp_goals: i64,
    #[serde(default)]
    pub sh_goals: i64,
    #[serde(default)]
    pub game_winning_goals: i64,
    #[serde(default)]
    pub shots: i64,
    #[serde(default)]
    pub hits: i64,
    #[serde(default)]
    pub blocked_shots: i64,
    #[serde(default)]
    pub time_on_ice_per_game: Option<f64>,
}

/// One goalie record from the stats REST summary report.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NhlGoalieSummary {
    pub player_id: i64,
    #[serde(default)]
    pub goalie_full_name: String,
    #[serde(default)]
    pub team_abbrevs: String,
    #[serde(default)]
    pub games_played: i64,
    #[serde(default)]
    pub games_started: i64,
    #[serde(default)]
    pub wins: i64,
    #[serde(default)]
    pub losses: i64,
    #[serde(default)]
    pub ot_losses: i64,
    #[serde(default)]
    pub save_pct: Option<f64>,
    #[serde(default)]
    pub goals_against_average: Option<f64>,
    #[serde(default)]
    pub shutouts: i64,
    #[serde(default)]
    pub saves: i64,
    #[serde(default)]
    pub shots_against: i64,
    #[serde(default)]
    pub goals_against: i64,
}

#[derive(Debug, Default, Deserialize)]
struct StandingsPayload {
    #[serde(default)]
    standings: Vec<serde_json::Value>,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Client for the NHL Stats API.
pub struct NhlApi {
    web: ApiClient,
    stats: ApiClient,
    ttl: TtlPolicy,
}

impl NhlApi {
    pub fn new(cache: FileCache, min_delay: Duration, ttl: TtlPolicy) -> anyhow::Result<Self> {
        let limiter = Arc::new(RateLimiter::new(min_delay));

        let mut web_cfg = ClientConfig::new(WEB_BASE_URL, "nhl");
        web_cfg.min_delay = min_delay;
        let web = ApiClient::with_shared_limiter(web_cfg, cache.clone(), Arc::clone(&limiter))?;

        let mut stats_cfg = ClientConfig::new(STATS_BASE_URL, "nhl_stats");
        stats_cfg.min_delay = min_delay;
        let stats = ApiClient::with_shared_limiter(stats_cfg, cache, limiter)?;

        Ok(Self { web, stats, ttl })
    }

    /// Fetch standings: the current snapshot (live TTL) or a historical
    /// date "YYYY-MM-DD" (long TTL).
    pub async fn standings(&self, date: Option<&str>) -> Result<Vec<NhlStanding>, FetchError> {
        let (endpoint, ttl) = match date {
            Some(d) => (format!("standings/{d}"), self.ttl.historical),
            None => ("standings/now".to_string(), self.ttl.live),
        };
        let raw = self.web.get_json(&endpoint, &[], ttl).await?;
        let payload: StandingsPayload = serde_json::from_value(raw).unwrap_or_default();
        Ok(decode_records(payload.standings, "nhl standings"))
    }

    /// Resolve the current season string (e.g. "20242025") from today's
    /// standings.
    pub async fn current_season(&self) -> Result<String, FetchError> {
        let standings = self.standings(None).await?;
        Ok(standings
            .first()
            .and_then(|s| s.season_id)
            .map(|id| id.to_string())
            .unwrap_or_else(|| FALLBACK_SEASON.to_string()))
    }

    /// Full roster for one team and season. The abbreviation comes from
    /// upstream data, so it is encoded before landing in the path.
    pub async fn roster(&self, team_abbrev: &str, season: &str) -> Result<NhlRoster, FetchError> {
        let endpoint = format!("roster/{}/{season}", urlencoding::encode(team_abbrev));
        let raw = self.web.get_json(&endpoint, &[], self.ttl.historical).await?;
        serde_json::from_value(raw).map_err(|source| FetchError::Decode {
            endpoint,
            source,
        })
    }

    /// One club's full season schedule, returned raw for snapshotting.
    pub async fn club_schedule(
        &self,
        team_abbrev: &str,
        season: &str,
    ) -> Result<serde_json::Value, FetchError> {
        let endpoint = format!(
            "club-schedule-season/{}/{season}",
            urlencoding::encode(team_abbrev)
        );
        self.web.get_json(&endpoint, &[], self.ttl.historical).await
    }

    /// One player's per-game log for a season, returned raw for
    /// snapshotting.
    pub async fn game_log(
        &self,
        player_id: i64,
        season: &str,
        game_type: u8,
    ) -> Result<serde_json::Value, FetchError> {
        let endpoint = format!("player/{player_id}/game-log/{season}/{game_type}");
        self.web.get_json(&endpoint, &[], self.ttl.historical).await
    }

    /// Every skater's season summary, drained across all pages.
    pub async fn skater_summary(
        &self,
        season: &str,
        game_type: u8,
    ) -> Result<Vec<NhlSkaterSummary>, FetchError> {
        let params = vec![
            (
                "cayenneExp".to_string(),
                format!("seasonId={season} and gameTypeId={game_type}"),
            ),
            (
                "sort".to_string(),
                r#"[{"property":"points","direction":"DESC"},{"property":"goals","direction":"DESC"}]"#
                    .to_string(),
            ),
        ];
        let records = Paginator::offset(SUMMARY_PAGE_SIZE)
            .fetch_all(&self.stats, "skater/summary", &params, self.ttl.historical)
            .await?;
        Ok(decode_records(records, "nhl skater summary"))
    }

    /// Every goalie's season summary, drained across all pages.
    pub async fn goalie_summary(
        &self,
        season: &str,
        game_type: u8,
    ) -> Result<Vec<NhlGoalieSummary>, FetchError> {
        let params = vec![
            (
                "cayenneExp".to_string(),
                format!("seasonId={season} and gameTypeId={game_type}"),
            ),
            (
                "sort".to_string(),
                r#"[{"property":"wins","direction":"DESC"}]"#.to_string(),
            ),
        ];
        let records = Paginator::offset(SUMMARY_PAGE_SIZE)
            .fetch_all(&self.stats, "goalie/summary", &params, self.ttl.historical)
            .await?;
        Ok(decode_records(records, "nhl goalie summary"))
    }
}

#[cfg(test)]
impl NhlApi {
    /// Both hosts pointed at a dead end: every response must come from the
    /// seeded cache, and unseeded endpoints fail fast.
    pub fn cache_only(cache: FileCache, ttl: TtlPolicy) -> Self {
        let limiter = Arc::new(RateLimiter::new(Duration::from_millis(1)));
        let mut web_cfg = ClientConfig::new("http://127.0.0.1:9", "nhl");
        web_cfg.min_delay = Duration::from_millis(1);
        web_cfg.max_attempts = 1;
        web_cfg.backoff_base = Duration::from_millis(1);
        web_cfg.timeout = Duration::from_millis(500);
        let mut stats_cfg = web_cfg.clone();
        stats_cfg.cache_prefix = "nhl_stats".into();

        let web =
            ApiClient::with_shared_limiter(web_cfg, cache.clone(), Arc::clone(&limiter)).unwrap();
        let stats = ApiClient::with_shared_limiter(stats_cfg, cache, limiter).unwrap();
        Self { web, stats, ttl }
    }

    pub fn seed_web(&self, endpoint: &str, value: &serde_json::Value) {
        self.web.seed_cache(endpoint, &[], value);
    }

    pub fn seed_stats(
        &self,
        endpoint: &str,
        params: &[(String, String)],
        value: &serde_json::Value,
    ) {
        self.stats.seed_cache(endpoint, params, value);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn test_api() -> NhlApi {
        let mut root = std::env::temp_dir();
        root.push(format!("statline_nhl_test_{}", uuid::Uuid::new_v4()));
        let cache = FileCache::new(root, true).unwrap();
        let ttl = TtlPolicy {
            default: Duration::from_secs(3600),
            live: Duration::from_secs(300),
            historical: Duration::from_secs(86400),
        };
        NhlApi::new(cache, Duration::from_millis(1), ttl).unwrap()
    }

    fn sample_standing() -> serde_json::Value {
        json!({
            "teamId": 22,
            "seasonId": 20242025,
            "teamName": {"default": "Edmonton Oilers"},
            "teamAbbrev": {"default": "EDM"},
            "conferenceName": "Western",
            "divisionName": "Pacific",
            "wins": 49,
            "losses": 27,
            "otLosses": 6,
            "points": 104,
            "gamesPlayed": 82,
            "goalFor": 285,
            "goalAgainst": 240,
            "l10Wins": 7,
            "l10Losses": 2,
            "streakCode": "W3"
        })
    }

    #[test]
    fn test_decode_standing() {
        let s: NhlStanding = serde_json::from_value(sample_standing()).unwrap();
        assert_eq!(s.team_id, Some(22));
        assert_eq!(s.team_abbrev.default, "EDM");
        assert_eq!(s.wins, 49);
        assert_eq!(s.l10_wins, 7);
        // Field absent from payload defaults rather than failing the record
        assert!(s.power_play_pct.is_none());
    }

    #[test]
    fn test_decode_roster() {
        let raw = json!({
            "forwards": [{
                "id": 8478402,
                "firstName": {"default": "Connor"},
                "lastName": {"default": "McDavid"},
                "sweaterNumber": 97,
                "positionCode": "C",
                "shootsCatches": "L",
                "heightInInches": 73,
                "weightInPounds": 194,
                "birthDate": "1997-01-13",
                "birthCountry": "CAN",
                "headshot": "https://example.com/hs.png"
            }],
            "defensemen": [],
            "goalies": [{"id": 8479973}]
        });
        let roster: NhlRoster = serde_json::from_value(raw).unwrap();
        assert_eq!(roster.len(), 2);
        let first = roster.all_players().next().unwrap();
        assert_eq!(first.first_name.default, "Connor");
        assert_eq!(first.sweater_number, Some(97));
        // Sparse goalie record still decodes with defaults
        assert_eq!(roster.goalies[0].position_code, "");
    }

    #[test]
    fn test_decode_skater_summary() {
        let raw = json!({
            "playerId": 8478402,
            "skaterFullName": "Connor McDavid",
            "teamAbbrevs": "EDM",
            "positionCode": "C",
            "gamesPlayed": 82,
            "goals": 64,
            "assists": 89,
            "points": 153,
            "plusMinus": 28,
            "penaltyMinutes": 36,
            "ppGoals": 21,
            "shGoals": 1,
            "gameWinningGoals": 9,
            "shots": 352,
            "hits": 60,
            "blockedShots": 31,
            "timeOnIcePerGame": 1339.5
        });
        let s: NhlSkaterSummary = serde_json::from_value(raw).unwrap();
        assert_eq!(s.player_id, 8478402);
        assert_eq!(s.points, 153);
        assert_eq!(s.time_on_ice_per_game, Some(1339.5));
    }

    #[test]
    fn test_skater_summary_requires_player_id() {
        let raw = json!({"skaterFullName": "Ghost Player"});
        assert!(serde_json::from_value::<NhlSkaterSummary>(raw).is_err());
    }

    #[tokio::test]
    async fn test_current_season_from_cached_standings() {
        let api = test_api();
        api.web.seed_cache(
            "standings/now",
            &[],
            &json!({"standings": [sample_standing()]}),
        );
        assert_eq!(api.current_season().await.unwrap(), "20242025");
    }

    #[tokio::test]
    async fn test_club_schedule_served_from_cache() {
        let api = test_api();
        api.web.seed_cache(
            "club-schedule-season/EDM/20242025",
            &[],
            &json!({"games": [{"id": 2024020001i64}]}),
        );
        let raw = api.club_schedule("EDM", "20242025").await.unwrap();
        assert_eq!(raw["games"][0]["id"], 2024020001i64);
    }

    #[tokio::test]
    async fn test_game_log_served_from_cache() {
        let api = test_api();
        api.web.seed_cache(
            "player/8478402/game-log/20242025/2",
            &[],
            &json!({"gameLog": [{"goals": 2}]}),
        );
        let raw = api.game_log(8478402, "20242025", 2).await.unwrap();
        assert_eq!(raw["gameLog"][0]["goals"], 2);
    }

    #[tokio::test]
    async fn test_standings_skips_undecodable_entries() {
        let api = test_api();
        api.web.seed_cache(
            "standings/now",
            &[],
            &json!({"standings": [sample_standing(), "garbage"]}),
        );
        let standings = api.standings(None).await.unwrap();
        assert_eq!(standings.len(), 1);
    }
}
