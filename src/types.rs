//! Canonical record shapes shared across the pipeline.
//!
//! Each collector maps its provider's JSON into these rows in exactly one
//! place, applying the defaulting and rounding rules there so the same raw
//! inputs always produce the same stored values. Rounding policy: 1 decimal
//! for percentages, 3 decimals for per-game rates, 2 decimals where the
//! upstream reports hundredths (GAA).

use serde::Serialize;
use serde_json::Value;

// ---------------------------------------------------------------------------
// Rounding policy
// ---------------------------------------------------------------------------

/// Round to 1 decimal (percentages).
pub fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

/// Round to 3 decimals (per-game rates).
pub fn round3(x: f64) -> f64 {
    (x * 1000.0).round() / 1000.0
}

/// Percentage of `num` over `den`, 1 decimal; 0.0 when the denominator is
/// zero rather than NaN.
pub fn pct(num: f64, den: f64) -> f64 {
    if den > 0.0 {
        round1(num / den * 100.0)
    } else {
        0.0
    }
}

/// Per-game rate, 3 decimals; 0.0 when no games were played.
pub fn per_game(total: f64, games: f64) -> f64 {
    if games > 0.0 {
        round3(total / games)
    } else {
        0.0
    }
}

// ---------------------------------------------------------------------------
// Loose JSON coercion
// ---------------------------------------------------------------------------

/// Coerce a JSON value into an integer, tolerating the shapes the upstream
/// APIs actually emit: plain numbers, numeric strings, and Mongo-export
/// wrappers like `{"$numberInt": "20000000"}`. Anything else is `None` and
/// the caller defaults it — one bad field never discards a row.
pub fn loose_i64(v: &Value) -> Option<i64> {
    match v {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        Value::Object(map) => map
            .iter()
            .find(|(k, _)| k.starts_with("$number"))
            .and_then(|(_, inner)| loose_i64(inner)),
        _ => None,
    }
}

/// Float variant of [`loose_i64`].
pub fn loose_f64(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Object(map) => map
            .iter()
            .find(|(k, _)| k.starts_with("$number"))
            .and_then(|(_, inner)| loose_f64(inner)),
        _ => None,
    }
}

/// Coerce a JSON value into a string: plain strings, numbers, and the
/// same Mongo-export wrappers [`loose_i64`] accepts. Identifier fields
/// (golf player ids) arrive in all three shapes.
pub fn loose_string(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Object(map) => map
            .iter()
            .find(|(k, _)| k.starts_with("$number"))
            .and_then(|(_, inner)| loose_string(inner)),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Golf finish position
// ---------------------------------------------------------------------------

/// How a golfer's tournament ended.
///
/// Upstream encodes this as a string that is sometimes a rank ("1"),
/// sometimes a tied rank ("T5"), and sometimes a sentinel ("CUT", "WD",
/// "DQ"). Carrying it as a tagged variant keeps downstream logic from ever
/// treating a sentinel as a numeric rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "rank", rename_all = "snake_case")]
pub enum Finish {
    /// Numeric finishing position; ties share the same rank.
    Ranked(u32),
    MissedCut,
    Withdrawn,
    Disqualified,
}

impl Finish {
    /// Parse a leaderboard position string plus its status field.
    ///
    /// The status takes precedence: an explicit CUT/WD/DQ always wins over
    /// whatever the position column says. "MDF" (made cut, did not finish)
    /// is counted as a missed cut for aggregate purposes.
    pub fn parse(position: &str, status: &str) -> Finish {
        match status.trim().to_ascii_uppercase().as_str() {
            "CUT" | "MDF" => return Finish::MissedCut,
            "WD" => return Finish::Withdrawn,
            "DQ" => return Finish::Disqualified,
            _ => {}
        }

        let pos = position.trim().to_ascii_uppercase();
        match pos.as_str() {
            "CUT" | "MDF" => return Finish::MissedCut,
            "WD" => return Finish::Withdrawn,
            "DQ" => return Finish::Disqualified,
            _ => {}
        }

        // Strip the tie marker: "T5" is rank 5.
        let numeric = pos.strip_prefix('T').unwrap_or(&pos);
        match numeric.parse::<u32>() {
            Ok(n) if n >= 1 => Finish::Ranked(n),
            _ => Finish::MissedCut,
        }
    }

    pub fn rank(&self) -> Option<u32> {
        match self {
            Finish::Ranked(n) => Some(*n),
            _ => None,
        }
    }

    /// Only a ranked finish counts as having made the cut.
    pub fn made_cut(&self) -> bool {
        matches!(self, Finish::Ranked(_))
    }

    pub fn is_win(&self) -> bool {
        self.rank() == Some(1)
    }

    pub fn is_top(&self, n: u32) -> bool {
        self.rank().map(|r| r <= n).unwrap_or(false)
    }
}

// ---------------------------------------------------------------------------
// NHL canonical rows
// ---------------------------------------------------------------------------

/// One NHL franchise with its current-season record.
#[derive(Debug, Clone, Serialize)]
pub struct TeamRow {
    pub id: Option<i64>,
    pub name: String,
    pub abbrev: String,
    pub conference: String,
    pub division: String,
    pub wins: i64,
    pub losses: i64,
    pub ot_losses: i64,
    pub points: i64,
    pub games_played: i64,
    pub goals_for: i64,
    pub goals_against: i64,
    pub pp_pct: f64,
    pub pk_pct: f64,
    pub streak: String,
    pub logo_url: String,
}

/// A rostered player's bio record.
#[derive(Debug, Clone, Serialize)]
pub struct PlayerRow {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub number: Option<i64>,
    pub position: String,
    pub team_abbrev: String,
    pub shoots_catches: String,
    pub height_inches: Option<i64>,
    pub weight_pounds: Option<i64>,
    pub birth_date: String,
    pub birth_country: String,
    pub headshot_url: String,
}

/// Per-skater season stats. Natural key: (player_id, season).
#[derive(Debug, Clone, Serialize)]
pub struct SkaterSeasonRow {
    pub player_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub team_abbrev: String,
    pub position: String,
    pub season: String,
    pub games_played: i64,
    pub goals: i64,
    pub assists: i64,
    pub points: i64,
    pub plus_minus: i64,
    pub penalty_minutes: i64,
    pub pp_goals: i64,
    pub sh_goals: i64,
    pub gw_goals: i64,
    pub shots: i64,
    pub hits: i64,
    pub blocked_shots: i64,
    pub toi_per_game: Option<f64>,
    // Derived at normalization time, fixed rounding policy.
    pub shooting_pct: f64,
    pub points_per_game: f64,
    pub goals_per_game: f64,
}

/// Per-goalie season stats. Natural key: (player_id, season).
#[derive(Debug, Clone, Serialize)]
pub struct GoalieSeasonRow {
    pub player_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub team_abbrev: String,
    pub season: String,
    pub games_played: i64,
    pub games_started: i64,
    pub wins: i64,
    pub losses: i64,
    pub ot_losses: i64,
    pub save_pct: Option<f64>,
    pub gaa: Option<f64>,
    pub shutouts: i64,
    pub saves: i64,
    pub shots_against: i64,
    pub goals_against: i64,
}

/// One team's standings line. Natural key: (season, team_abbrev).
#[derive(Debug, Clone, Serialize)]
pub struct StandingRow {
    pub season: String,
    pub team_abbrev: String,
    pub team_name: String,
    pub conference: String,
    pub division: String,
    pub wins: i64,
    pub losses: i64,
    pub ot_losses: i64,
    pub points: i64,
    pub games_played: i64,
    pub goals_for: i64,
    pub goals_against: i64,
    pub goal_diff: i64,
    pub home_wins: i64,
    pub home_losses: i64,
    pub away_wins: i64,
    pub away_losses: i64,
    pub l10_wins: i64,
    pub l10_losses: i64,
    pub pp_pct: f64,
    pub pk_pct: f64,
}

// ---------------------------------------------------------------------------
// Golf canonical rows
// ---------------------------------------------------------------------------

/// One PGA Tour event. Natural key: (tourn_id, year).
#[derive(Debug, Clone, Serialize)]
pub struct TournamentRow {
    pub tourn_id: String,
    pub year: i64,
    pub name: String,
    pub start_date: String,
    pub end_date: String,
    pub purse: Option<i64>,
    pub winners_share: Option<i64>,
    pub fedex_points: Option<i64>,
    pub format: String,
}

/// One player's result in one tournament.
/// Natural key: (tourn_id, year, player_id).
#[derive(Debug, Clone, Serialize)]
pub struct GolfResultRow {
    pub tourn_id: String,
    pub year: i64,
    pub tournament_name: String,
    pub player_id: String,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    /// Raw upstream position string, kept for inspection.
    pub position: String,
    pub finish: Finish,
    pub total_score: String,
    pub total_strokes: Option<i64>,
    pub is_amateur: bool,
}

impl GolfResultRow {
    pub fn made_cut(&self) -> bool {
        self.finish.made_cut()
    }
    pub fn win(&self) -> bool {
        self.finish.is_win()
    }
}

// ---------------------------------------------------------------------------
// NFL canonical rows
// ---------------------------------------------------------------------------

/// One NFL franchise.
#[derive(Debug, Clone, Serialize)]
pub struct NflTeamRow {
    pub id: i64,
    pub abbreviation: String,
    pub full_name: String,
    pub location: String,
    pub name: String,
    pub conference: String,
    pub division: String,
}

/// One team's standings line. Natural key: (season, team_id).
#[derive(Debug, Clone, Serialize)]
pub struct NflStandingRow {
    pub season: i64,
    pub team_id: i64,
    pub team_abbrev: String,
    pub team_name: String,
    pub conference: String,
    pub division: String,
    pub wins: Option<i64>,
    pub losses: Option<i64>,
    pub ties: Option<i64>,
    pub points_for: Option<i64>,
    pub points_against: Option<i64>,
    pub point_differential: Option<i64>,
    pub playoff_seed: Option<i64>,
    pub overall_record: String,
    pub home_record: String,
    pub road_record: String,
    pub division_record: String,
    pub conference_record: String,
    pub win_streak: Option<i64>,
}

/// One player's season stat line across all position groups.
/// Natural key: (season, postseason, player_id).
#[derive(Debug, Clone, Default, Serialize)]
pub struct NflPlayerStatRow {
    pub season: i64,
    pub postseason: bool,
    pub player_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub position: String,
    pub position_abbrev: String,
    pub team: String,
    pub games_played: Option<i64>,
    // Passing
    pub passing_completions: Option<i64>,
    pub passing_attempts: Option<i64>,
    pub passing_yards: Option<i64>,
    pub passing_touchdowns: Option<i64>,
    pub passing_interceptions: Option<i64>,
    pub passing_yards_per_game: Option<f64>,
    pub passing_completion_pct: Option<f64>,
    pub yards_per_pass_attempt: Option<f64>,
    pub qbr: Option<f64>,
    // Rushing
    pub rushing_attempts: Option<i64>,
    pub rushing_yards: Option<i64>,
    pub rushing_touchdowns: Option<i64>,
    pub rushing_yards_per_game: Option<f64>,
    pub yards_per_rush_attempt: Option<f64>,
    pub rushing_fumbles: Option<i64>,
    pub rushing_fumbles_lost: Option<i64>,
    pub rushing_first_downs: Option<i64>,
    // Receiving
    pub receptions: Option<i64>,
    pub receiving_targets: Option<i64>,
    pub receiving_yards: Option<i64>,
    pub receiving_touchdowns: Option<i64>,
    pub receiving_yards_per_game: Option<f64>,
    pub yards_per_reception: Option<f64>,
    pub receiving_fumbles: Option<i64>,
    pub receiving_first_downs: Option<i64>,
    // Defense
    pub total_tackles: Option<i64>,
    pub solo_tackles: Option<i64>,
    pub assist_tackles: Option<i64>,
    pub defensive_sacks: Option<f64>,
    pub defensive_sack_yards: Option<f64>,
    pub defensive_interceptions: Option<i64>,
    pub interception_touchdowns: Option<i64>,
    pub fumbles_forced: Option<i64>,
    pub fumbles_recovered: Option<i64>,
    pub fumbles_touchdowns: Option<i64>,
    // Kicking
    pub field_goal_attempts: Option<i64>,
    pub field_goals_made: Option<i64>,
    pub field_goal_pct: Option<f64>,
    pub field_goals_made_1_19: Option<i64>,
    pub field_goals_made_20_29: Option<i64>,
    pub field_goals_made_30_39: Option<i64>,
    pub field_goals_made_40_49: Option<i64>,
    pub field_goals_made_50: Option<i64>,
    pub punts: Option<i64>,
    pub punt_yards: Option<i64>,
}

/// Split a "First Last" display name into (first, rest).
pub fn split_full_name(full: &str) -> (String, String) {
    let mut parts = full.split_whitespace();
    let first = parts.next().unwrap_or("").to_string();
    let rest = parts.collect::<Vec<_>>().join(" ");
    (first, rest)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
