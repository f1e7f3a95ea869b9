//! NHL tables and upserts.

use anyhow::{Context, Result};
use tracing::debug;

use super::Store;
use crate::types::{GoalieSeasonRow, PlayerRow, SkaterSeasonRow, StandingRow, TeamRow};

pub(super) const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS teams (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    abbrev TEXT NOT NULL,
    conference TEXT,
    division TEXT,
    wins INTEGER,
    losses INTEGER,
    ot_losses INTEGER,
    points INTEGER,
    games_played INTEGER,
    goals_for INTEGER,
    goals_against INTEGER,
    pp_pct REAL,
    pk_pct REAL,
    streak TEXT,
    logo_url TEXT
);

CREATE TABLE IF NOT EXISTS players (
    id INTEGER PRIMARY KEY,
    first_name TEXT,
    last_name TEXT,
    full_name TEXT,
    number INTEGER,
    position TEXT,
    team_abbrev TEXT,
    shoots_catches TEXT,
    height_inches INTEGER,
    weight_pounds INTEGER,
    birth_date TEXT,
    birth_country TEXT,
    headshot_url TEXT
);

CREATE TABLE IF NOT EXISTS skater_stats (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    player_id INTEGER NOT NULL,
    first_name TEXT,
    last_name TEXT,
    full_name TEXT,
    team_abbrev TEXT,
    position TEXT,
    season TEXT NOT NULL,
    games_played INTEGER,
    goals INTEGER,
    assists INTEGER,
    points INTEGER,
    plus_minus INTEGER,
    penalty_minutes INTEGER,
    pp_goals INTEGER,
    sh_goals INTEGER,
    gw_goals INTEGER,
    shots INTEGER,
    hits INTEGER,
    blocked_shots INTEGER,
    toi_per_game REAL,
    shooting_pct REAL,
    points_per_game REAL,
    goals_per_game REAL,
    UNIQUE (player_id, season)
);

CREATE TABLE IF NOT EXISTS goalie_stats (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    player_id INTEGER NOT NULL,
    first_name TEXT,
    last_name TEXT,
    full_name TEXT,
    team_abbrev TEXT,
    season TEXT NOT NULL,
    games_played INTEGER,
    games_started INTEGER,
    wins INTEGER,
    losses INTEGER,
    ot_losses INTEGER,
    save_pct REAL,
    gaa REAL,
    shutouts INTEGER,
    saves INTEGER,
    shots_against INTEGER,
    goals_against INTEGER,
    UNIQUE (player_id, season)
);

CREATE TABLE IF NOT EXISTS standings (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    season TEXT NOT NULL,
    team_abbrev TEXT NOT NULL,
    team_name TEXT,
    conference TEXT,
    division TEXT,
    wins INTEGER,
    losses INTEGER,
    ot_losses INTEGER,
    points INTEGER,
    games_played INTEGER,
    goals_for INTEGER,
    goals_against INTEGER,
    goal_diff INTEGER,
    home_wins INTEGER,
    home_losses INTEGER,
    away_wins INTEGER,
    away_losses INTEGER,
    l10_wins INTEGER,
    l10_losses INTEGER,
    pp_pct REAL,
    pk_pct REAL,
    UNIQUE (season, team_abbrev)
);
"#;

impl Store {
    pub async fn upsert_teams(&self, rows: &[TeamRow]) -> Result<usize> {
        for row in rows {
            sqlx::query(
                "INSERT OR REPLACE INTO teams
                 (id, name, abbrev, conference, division, wins, losses, ot_losses,
                  points, games_played, goals_for, goals_against, pp_pct, pk_pct,
                  streak, logo_url)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(row.id)
            .bind(&row.name)
            .bind(&row.abbrev)
            .bind(&row.conference)
            .bind(&row.division)
            .bind(row.wins)
            .bind(row.losses)
            .bind(row.ot_losses)
            .bind(row.points)
            .bind(row.games_played)
            .bind(row.goals_for)
            .bind(row.goals_against)
            .bind(row.pp_pct)
            .bind(row.pk_pct)
            .bind(&row.streak)
            .bind(&row.logo_url)
            .execute(&self.pool)
            .await
            .with_context(|| format!("Failed to upsert team {}", row.abbrev))?;
        }
        debug!(count = rows.len(), "Teams upserted");
        Ok(rows.len())
    }

    pub async fn upsert_players(&self, rows: &[PlayerRow]) -> Result<usize> {
        for row in rows {
            sqlx::query(
                "INSERT OR REPLACE INTO players
                 (id, first_name, last_name, full_name, number, position, team_abbrev,
                  shoots_catches, height_inches, weight_pounds, birth_date,
                  birth_country, headshot_url)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(row.id)
            .bind(&row.first_name)
            .bind(&row.last_name)
            .bind(&row.full_name)
            .bind(row.number)
            .bind(&row.position)
            .bind(&row.team_abbrev)
            .bind(&row.shoots_catches)
            .bind(row.height_inches)
            .bind(row.weight_pounds)
            .bind(&row.birth_date)
            .bind(&row.birth_country)
            .bind(&row.headshot_url)
            .execute(&self.pool)
            .await
            .with_context(|| format!("Failed to upsert player {}", row.id))?;
        }
        debug!(count = rows.len(), "Players upserted");
        Ok(rows.len())
    }

    pub async fn upsert_skater_stats(&self, rows: &[SkaterSeasonRow]) -> Result<usize> {
        for row in rows {
            sqlx::query(
                "INSERT OR REPLACE INTO skater_stats
                 (player_id, first_name, last_name, full_name, team_abbrev, position,
                  season, games_played, goals, assists, points, plus_minus,
                  penalty_minutes, pp_goals, sh_goals, gw_goals, shots, hits,
                  blocked_shots, toi_per_game, shooting_pct, points_per_game,
                  goals_per_game)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(row.player_id)
            .bind(&row.first_name)
            .bind(&row.last_name)
            .bind(&row.full_name)
            .bind(&row.team_abbrev)
            .bind(&row.position)
            .bind(&row.season)
            .bind(row.games_played)
            .bind(row.goals)
            .bind(row.assists)
            .bind(row.points)
            .bind(row.plus_minus)
            .bind(row.penalty_minutes)
            .bind(row.pp_goals)
            .bind(row.sh_goals)
            .bind(row.gw_goals)
            .bind(row.shots)
            .bind(row.hits)
            .bind(row.blocked_shots)
            .bind(row.toi_per_game)
            .bind(row.shooting_pct)
            .bind(row.points_per_game)
            .bind(row.goals_per_game)
            .execute(&self.pool)
            .await
            .with_context(|| {
                format!("Failed to upsert skater {} {}", row.player_id, row.season)
            })?;
        }
        debug!(count = rows.len(), "Skater stats upserted");
        Ok(rows.len())
    }

    pub async fn upsert_goalie_stats(&self, rows: &[GoalieSeasonRow]) -> Result<usize> {
        for row in rows {
            sqlx::query(
                "INSERT OR REPLACE INTO goalie_stats
                 (player_id, first_name, last_name, full_name, team_abbrev, season,
                  games_played, games_started, wins, losses, ot_losses, save_pct,
                  gaa, shutouts, saves, shots_against, goals_against)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(row.player_id)
            .bind(&row.first_name)
            .bind(&row.last_name)
            .bind(&row.full_name)
            .bind(&row.team_abbrev)
            .bind(&row.season)
            .bind(row.games_played)
            .bind(row.games_started)
            .bind(row.wins)
            .bind(row.losses)
            .bind(row.ot_losses)
            .bind(row.save_pct)
            .bind(row.gaa)
            .bind(row.shutouts)
            .bind(row.saves)
            .bind(row.shots_against)
            .bind(row.goals_against)
            .execute(&self.pool)
            .await
            .with_context(|| {
                format!("Failed to upsert goalie {} {}", row.player_id, row.season)
            })?;
        }
        debug!(count = rows.len(), "Goalie stats upserted");
        Ok(rows.len())
    }

    pub async fn upsert_standings(&self, rows: &[StandingRow]) -> Result<usize> {
        for row in rows {
            sqlx::query(
                "INSERT OR REPLACE INTO standings
                 (season, team_abbrev, team_name, conference, division, wins, losses,
                  ot_losses, points, games_played, goals_for, goals_against, goal_diff,
                  home_wins, home_losses, away_wins, away_losses, l10_wins, l10_losses,
                  pp_pct, pk_pct)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(&row.season)
            .bind(&row.team_abbrev)
            .bind(&row.team_name)
            .bind(&row.conference)
            .bind(&row.division)
            .bind(row.wins)
            .bind(row.losses)
            .bind(row.ot_losses)
            .bind(row.points)
            .bind(row.games_played)
            .bind(row.goals_for)
            .bind(row.goals_against)
            .bind(row.goal_diff)
            .bind(row.home_wins)
            .bind(row.home_losses)
            .bind(row.away_wins)
            .bind(row.away_losses)
            .bind(row.l10_wins)
            .bind(row.l10_losses)
            .bind(row.pp_pct)
            .bind(row.pk_pct)
            .execute(&self.pool)
            .await
            .with_context(|| {
                format!(
                    "Failed to upsert standing {} {}",
                    row.season, row.team_abbrev
                )
            })?;
        }
        debug!(count = rows.len(), "Standings upserted");
        Ok(rows.len())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn skater(player_id: i64, season: &str, goals: i64) -> SkaterSeasonRow {
        SkaterSeasonRow {
            player_id,
            first_name: "Test".into(),
            last_name: "Skater".into(),
            full_name: "Test Skater".into(),
            team_abbrev: "EDM".into(),
            position: "C".into(),
            season: season.into(),
            games_played: 82,
            goals,
            assists: 50,
            points: goals + 50,
            plus_minus: 10,
            penalty_minutes: 20,
            pp_goals: 5,
            sh_goals: 1,
            gw_goals: 4,
            shots: 250,
            hits: 40,
            blocked_shots: 30,
            toi_per_game: Some(1200.0),
            shooting_pct: 12.0,
            points_per_game: 1.0,
            goals_per_game: 0.5,
        }
    }

    #[tokio::test]
    async fn test_skater_upsert_is_idempotent() {
        let store = Store::open_in_memory().await.unwrap();
        let rows = vec![skater(1, "20242025", 30), skater(2, "20242025", 40)];

        store.upsert_skater_stats(&rows).await.unwrap();
        store.upsert_skater_stats(&rows).await.unwrap();

        assert_eq!(store.table_count("skater_stats").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_skater_upsert_replaces_on_natural_key() {
        let store = Store::open_in_memory().await.unwrap();
        store
            .upsert_skater_stats(&[skater(1, "20242025", 30)])
            .await
            .unwrap();
        store
            .upsert_skater_stats(&[skater(1, "20242025", 35)])
            .await
            .unwrap();

        assert_eq!(store.table_count("skater_stats").await.unwrap(), 1);
        let goals: i64 = sqlx::query_scalar(
            "SELECT goals FROM skater_stats WHERE player_id = 1 AND season = '20242025'",
        )
        .fetch_one(store.pool())
        .await
        .unwrap();
        assert_eq!(goals, 35);
    }

    #[tokio::test]
    async fn test_same_player_two_seasons_keeps_both() {
        let store = Store::open_in_memory().await.unwrap();
        store
            .upsert_skater_stats(&[skater(1, "20232024", 20), skater(1, "20242025", 30)])
            .await
            .unwrap();
        assert_eq!(store.table_count("skater_stats").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_standings_keyed_by_season_and_team() {
        let store = Store::open_in_memory().await.unwrap();
        let row = StandingRow {
            season: "20242025".into(),
            team_abbrev: "EDM".into(),
            team_name: "Edmonton Oilers".into(),
            conference: "Western".into(),
            division: "Pacific".into(),
            wins: 49,
            losses: 27,
            ot_losses: 6,
            points: 104,
            games_played: 82,
            goals_for: 285,
            goals_against: 240,
            goal_diff: 45,
            home_wins: 25,
            home_losses: 12,
            away_wins: 24,
            away_losses: 15,
            l10_wins: 7,
            l10_losses: 2,
            pp_pct: 25.9,
            pk_pct: 79.4,
        };
        let mut other_season = row.clone();
        other_season.season = "20232024".into();

        store.upsert_standings(&[row.clone()]).await.unwrap();
        store.upsert_standings(&[row, other_season]).await.unwrap();

        assert_eq!(store.table_count("standings").await.unwrap(), 2);
    }
}
