//! NFL tables and upserts.

use anyhow::{Context, Result};
use tracing::debug;

use super::Store;
use crate::types::{NflPlayerStatRow, NflStandingRow, NflTeamRow};

pub(super) const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS nfl_teams (
    id INTEGER PRIMARY KEY,
    abbreviation TEXT NOT NULL,
    full_name TEXT,
    location TEXT,
    name TEXT,
    conference TEXT,
    division TEXT
);

CREATE TABLE IF NOT EXISTS nfl_standings (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    season INTEGER NOT NULL,
    team_id INTEGER NOT NULL,
    team_abbrev TEXT,
    team_name TEXT,
    conference TEXT,
    division TEXT,
    wins INTEGER,
    losses INTEGER,
    ties INTEGER,
    points_for INTEGER,
    points_against INTEGER,
    point_differential INTEGER,
    playoff_seed INTEGER,
    overall_record TEXT,
    home_record TEXT,
    road_record TEXT,
    division_record TEXT,
    conference_record TEXT,
    win_streak INTEGER,
    UNIQUE (season, team_id)
);

CREATE TABLE IF NOT EXISTS nfl_player_stats (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    season INTEGER NOT NULL,
    postseason INTEGER NOT NULL DEFAULT 0,
    player_id INTEGER NOT NULL,
    first_name TEXT,
    last_name TEXT,
    full_name TEXT,
    position TEXT,
    position_abbrev TEXT,
    team TEXT,
    games_played INTEGER,
    passing_completions INTEGER,
    passing_attempts INTEGER,
    passing_yards INTEGER,
    passing_touchdowns INTEGER,
    passing_interceptions INTEGER,
    passing_yards_per_game REAL,
    passing_completion_pct REAL,
    yards_per_pass_attempt REAL,
    qbr REAL,
    rushing_attempts INTEGER,
    rushing_yards INTEGER,
    rushing_touchdowns INTEGER,
    rushing_yards_per_game REAL,
    yards_per_rush_attempt REAL,
    rushing_fumbles INTEGER,
    rushing_fumbles_lost INTEGER,
    rushing_first_downs INTEGER,
    receptions INTEGER,
    receiving_targets INTEGER,
    receiving_yards INTEGER,
    receiving_touchdowns INTEGER,
    receiving_yards_per_game REAL,
    yards_per_reception REAL,
    receiving_fumbles INTEGER,
    receiving_first_downs INTEGER,
    total_tackles INTEGER,
    solo_tackles INTEGER,
    assist_tackles INTEGER,
    defensive_sacks REAL,
    defensive_sack_yards REAL,
    defensive_interceptions INTEGER,
    interception_touchdowns INTEGER,
    fumbles_forced INTEGER,
    fumbles_recovered INTEGER,
    fumbles_touchdowns INTEGER,
    field_goal_attempts INTEGER,
    field_goals_made INTEGER,
    field_goal_pct REAL,
    field_goals_made_1_19 INTEGER,
    field_goals_made_20_29 INTEGER,
    field_goals_made_30_39 INTEGER,
    field_goals_made_40_49 INTEGER,
    field_goals_made_50 INTEGER,
    punts INTEGER,
    punt_yards INTEGER,
    UNIQUE (season, postseason, player_id)
);
"#;

impl Store {
    pub async fn upsert_nfl_teams(&self, rows: &[NflTeamRow]) -> Result<usize> {
        for row in rows {
            sqlx::query(
                "INSERT OR REPLACE INTO nfl_teams
                 (id, abbreviation, full_name, location, name, conference, division)
                 VALUES (?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(row.id)
            .bind(&row.abbreviation)
            .bind(&row.full_name)
            .bind(&row.location)
            .bind(&row.name)
            .bind(&row.conference)
            .bind(&row.division)
            .execute(&self.pool)
            .await
            .with_context(|| format!("Failed to upsert NFL team {}", row.abbreviation))?;
        }
        debug!(count = rows.len(), "NFL teams upserted");
        Ok(rows.len())
    }

    pub async fn upsert_nfl_standings(&self, rows: &[NflStandingRow]) -> Result<usize> {
        for row in rows {
            sqlx::query(
                "INSERT OR REPLACE INTO nfl_standings
                 (season, team_id, team_abbrev, team_name, conference, division,
                  wins, losses, ties, points_for, points_against, point_differential,
                  playoff_seed, overall_record, home_record, road_record,
                  division_record, conference_record, win_streak)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(row.season)
            .bind(row.team_id)
            .bind(&row.team_abbrev)
            .bind(&row.team_name)
            .bind(&row.conference)
            .bind(&row.division)
            .bind(row.wins)
            .bind(row.losses)
            .bind(row.ties)
            .bind(row.points_for)
            .bind(row.points_against)
            .bind(row.point_differential)
            .bind(row.playoff_seed)
            .bind(&row.overall_record)
            .bind(&row.home_record)
            .bind(&row.road_record)
            .bind(&row.division_record)
            .bind(&row.conference_record)
            .bind(row.win_streak)
            .execute(&self.pool)
            .await
            .with_context(|| {
                format!(
                    "Failed to upsert NFL standing {} {}",
                    row.season, row.team_id
                )
            })?;
        }
        debug!(count = rows.len(), "NFL standings upserted");
        Ok(rows.len())
    }

    pub async fn upsert_nfl_player_stats(&self, rows: &[NflPlayerStatRow]) -> Result<usize> {
        for row in rows {
            sqlx::query(
                "INSERT OR REPLACE INTO nfl_player_stats
                 (season, postseason, player_id, first_name, last_name, full_name,
                  position, position_abbrev, team, games_played,
                  passing_completions, passing_attempts, passing_yards,
                  passing_touchdowns, passing_interceptions, passing_yards_per_game,
                  passing_completion_pct, yards_per_pass_attempt, qbr,
                  rushing_attempts, rushing_yards, rushing_touchdowns,
                  rushing_yards_per_game, yards_per_rush_attempt, rushing_fumbles,
                  rushing_fumbles_lost, rushing_first_downs,
                  receptions, receiving_targets, receiving_yards,
                  receiving_touchdowns, receiving_yards_per_game,
                  yards_per_reception, receiving_fumbles, receiving_first_downs,
                  total_tackles, solo_tackles, assist_tackles, defensive_sacks,
                  defensive_sack_yards, defensive_interceptions,
                  interception_touchdowns, fumbles_forced, fumbles_recovered,
                  fumbles_touchdowns,
                  field_goal_attempts, field_goals_made, field_goal_pct,
                  field_goals_made_1_19, field_goals_made_20_29,
                  field_goals_made_30_39, field_goals_made_40_49,
                  field_goals_made_50, punts, punt_yards)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?,
                         ?, ?, ?, ?, ?, ?, ?, ?, ?,
                         ?, ?, ?, ?, ?, ?, ?, ?,
                         ?, ?, ?, ?, ?, ?, ?, ?,
                         ?, ?, ?, ?, ?, ?, ?, ?, ?, ?,
                         ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(row.season)
            .bind(row.postseason)
            .bind(row.player_id)
            .bind(&row.first_name)
            .bind(&row.last_name)
            .bind(&row.full_name)
            .bind(&row.position)
            .bind(&row.position_abbrev)
            .bind(&row.team)
            .bind(row.games_played)
            .bind(row.passing_completions)
            .bind(row.passing_attempts)
            .bind(row.passing_yards)
            .bind(row.passing_touchdowns)
            .bind(row.passing_interceptions)
            .bind(row.passing_yards_per_game)
            .bind(row.passing_completion_pct)
            .bind(row.yards_per_pass_attempt)
            .bind(row.qbr)
            .bind(row.rushing_attempts)
            .bind(row.rushing_yards)
            .bind(row.rushing_touchdowns)
            .bind(row.rushing_yards_per_game)
            .bind(row.yards_per_rush_attempt)
            .bind(row.rushing_fumbles)
            .bind(row.rushing_fumbles_lost)
            .bind(row.rushing_first_downs)
            .bind(row.receptions)
            .bind(row.receiving_targets)
            .bind(row.receiving_yards)
            .bind(row.receiving_touchdowns)
            .bind(row.receiving_yards_per_game)
            .bind(row.yards_per_reception)
            .bind(row.receiving_fumbles)
            .bind(row.receiving_first_downs)
            .bind(row.total_tackles)
            .bind(row.solo_tackles)
            .bind(row.assist_tackles)
            .bind(row.defensive_sacks)
            .bind(row.defensive_sack_yards)
            .bind(row.defensive_interceptions)
            .bind(row.interception_touchdowns)
            .bind(row.fumbles_forced)
            .bind(row.fumbles_recovered)
            .bind(row.fumbles_touchdowns)
            .bind(row.field_goal_attempts)
            .bind(row.field_goals_made)
            .bind(row.field_goal_pct)
            .bind(row.field_goals_made_1_19)
            .bind(row.field_goals_made_20_29)
            .bind(row.field_goals_made_30_39)
            .bind(row.field_goals_made_40_49)
            .bind(row.field_goals_made_50)
            .bind(row.punts)
            .bind(row.punt_yards)
            .execute(&self.pool)
            .await
            .with_context(|| {
                format!(
                    "Failed to upsert NFL stats for player {} season {}",
                    row.player_id, row.season
                )
            })?;
        }
        debug!(count = rows.len(), "NFL player stats upserted");
        Ok(rows.len())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn stat_row(player_id: i64, season: i64, postseason: bool) -> NflPlayerStatRow {
        NflPlayerStatRow {
            season,
            postseason,
            player_id,
            first_name: "Test".into(),
            last_name: "Player".into(),
            full_name: "Test Player".into(),
            position: "Quarterback".into(),
            position_abbrev: "QB".into(),
            team: "KC".into(),
            games_played: Some(17),
            passing_yards: Some(4_000),
            passing_touchdowns: Some(30),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_player_stats_upsert_is_idempotent() {
        let store = Store::open_in_memory().await.unwrap();
        let rows = vec![stat_row(1, 2024, false), stat_row(2, 2024, false)];
        store.upsert_nfl_player_stats(&rows).await.unwrap();
        store.upsert_nfl_player_stats(&rows).await.unwrap();
        assert_eq!(store.table_count("nfl_player_stats").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_regular_and_postseason_are_distinct_rows() {
        let store = Store::open_in_memory().await.unwrap();
        store
            .upsert_nfl_player_stats(&[stat_row(1, 2024, false), stat_row(1, 2024, true)])
            .await
            .unwrap();
        assert_eq!(store.table_count("nfl_player_stats").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_absent_stat_groups_store_null() {
        let store = Store::open_in_memory().await.unwrap();
        store
            .upsert_nfl_player_stats(&[stat_row(1, 2024, false)])
            .await
            .unwrap();

        let tackles: Option<i64> =
            sqlx::query_scalar("SELECT total_tackles FROM nfl_player_stats WHERE player_id = 1")
                .fetch_one(store.pool())
                .await
                .unwrap();
        assert_eq!(tackles, None);
    }

    #[tokio::test]
    async fn test_standings_replace_on_refetch() {
        let store = Store::open_in_memory().await.unwrap();
        let mut row = NflStandingRow {
            season: 2024,
            team_id: 14,
            team_abbrev: "KC".into(),
            team_name: "Kansas City Chiefs".into(),
            conference: "AFC".into(),
            division: "WEST".into(),
            wins: Some(10),
            losses: Some(2),
            ties: Some(0),
            points_for: Some(300),
            points_against: Some(250),
            point_differential: Some(50),
            playoff_seed: None,
            overall_record: "10-2".into(),
            home_record: "6-0".into(),
            road_record: "4-2".into(),
            division_record: "3-1".into(),
            conference_record: "7-2".into(),
            win_streak: Some(4),
        };
        store.upsert_nfl_standings(&[row.clone()]).await.unwrap();

        row.wins = Some(11);
        row.overall_record = "11-2".into();
        store.upsert_nfl_standings(&[row]).await.unwrap();

        assert_eq!(store.table_count("nfl_standings").await.unwrap(), 1);
        let wins: i64 = sqlx::query_scalar(
            "SELECT wins FROM nfl_standings WHERE season = 2024 AND team_id = 14",
        )
        .fetch_one(store.pool())
        .await
        .unwrap();
        assert_eq!(wins, 11);
    }
}
