//! Golf tables, upserts and the per-season aggregate rebuild.

use anyhow::{Context, Result};
use sqlx::Row;
use tracing::{debug, info};

use super::Store;
use crate::types::{GolfResultRow, TournamentRow};

pub(super) const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS golf_tournaments (
    tourn_id TEXT NOT NULL,
    year INTEGER NOT NULL,
    name TEXT NOT NULL,
    start_date TEXT,
    end_date TEXT,
    purse INTEGER,
    winners_share INTEGER,
    fedex_points INTEGER,
    format TEXT,
    PRIMARY KEY (tourn_id, year)
);

CREATE TABLE IF NOT EXISTS golf_results (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    tourn_id TEXT NOT NULL,
    year INTEGER NOT NULL,
    tournament_name TEXT,
    player_id TEXT NOT NULL,
    first_name TEXT,
    last_name TEXT,
    full_name TEXT,
    position TEXT,
    finish_rank INTEGER,
    made_cut INTEGER NOT NULL DEFAULT 0,
    win INTEGER NOT NULL DEFAULT 0,
    total_score TEXT,
    total_strokes INTEGER,
    is_amateur INTEGER NOT NULL DEFAULT 0,
    UNIQUE (tourn_id, year, player_id)
);

CREATE TABLE IF NOT EXISTS golf_player_season_stats (
    player_id TEXT NOT NULL,
    year INTEGER NOT NULL,
    player_name TEXT,
    events INTEGER NOT NULL,
    cuts_made INTEGER NOT NULL,
    wins INTEGER NOT NULL,
    top_5 INTEGER NOT NULL,
    top_10 INTEGER NOT NULL,
    top_20 INTEGER NOT NULL,
    top_25 INTEGER NOT NULL,
    total_strokes INTEGER,
    avg_strokes REAL,
    best_finish INTEGER,
    worst_finish INTEGER,
    cut_pct REAL NOT NULL,
    win_pct REAL NOT NULL,
    PRIMARY KEY (player_id, year)
);
"#;

/// Per-player season aggregate, as rebuilt from golf_results.
#[derive(Debug, Clone, PartialEq)]
pub struct GolfSeasonStats {
    pub player_id: String,
    pub year: i64,
    pub player_name: String,
    pub events: i64,
    pub cuts_made: i64,
    pub wins: i64,
    pub top_5: i64,
    pub top_10: i64,
    pub top_20: i64,
    pub top_25: i64,
    pub total_strokes: Option<i64>,
    pub avg_strokes: Option<f64>,
    pub best_finish: Option<i64>,
    pub worst_finish: Option<i64>,
    pub cut_pct: f64,
    pub win_pct: f64,
}

impl Store {
    pub async fn upsert_tournaments(&self, rows: &[TournamentRow]) -> Result<usize> {
        for row in rows {
            sqlx::query(
                "INSERT OR REPLACE INTO golf_tournaments
                 (tourn_id, year, name, start_date, end_date, purse, winners_share,
                  fedex_points, format)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(&row.tourn_id)
            .bind(row.year)
            .bind(&row.name)
            .bind(&row.start_date)
            .bind(&row.end_date)
            .bind(row.purse)
            .bind(row.winners_share)
            .bind(row.fedex_points)
            .bind(&row.format)
            .execute(&self.pool)
            .await
            .with_context(|| {
                format!("Failed to upsert tournament {} {}", row.tourn_id, row.year)
            })?;
        }
        debug!(count = rows.len(), "Tournaments upserted");
        Ok(rows.len())
    }

    pub async fn upsert_golf_results(&self, rows: &[GolfResultRow]) -> Result<usize> {
        for row in rows {
            sqlx::query(
                "INSERT OR REPLACE INTO golf_results
                 (tourn_id, year, tournament_name, player_id, first_name, last_name,
                  full_name, position, finish_rank, made_cut, win, total_score,
                  total_strokes, is_amateur)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(&row.tourn_id)
            .bind(row.year)
            .bind(&row.tournament_name)
            .bind(&row.player_id)
            .bind(&row.first_name)
            .bind(&row.last_name)
            .bind(&row.full_name)
            .bind(&row.position)
            .bind(row.finish.rank().map(i64::from))
            .bind(row.made_cut())
            .bind(row.win())
            .bind(&row.total_score)
            .bind(row.total_strokes)
            .bind(row.is_amateur)
            .execute(&self.pool)
            .await
            .with_context(|| {
                format!(
                    "Failed to upsert result {} {} {}",
                    row.tourn_id, row.year, row.player_id
                )
            })?;
        }
        debug!(count = rows.len(), "Golf results upserted");
        Ok(rows.len())
    }

    /// Rebuild `golf_player_season_stats` wholesale from `golf_results`.
    ///
    /// Drop-and-recreate, in one transaction: results upserts keep the base
    /// table consistent, so a full rebuild is always correct and never
    /// accumulates drift from incremental updates.
    pub async fn rebuild_golf_season_stats(&self) -> Result<i64> {
        let mut tx = self.pool.begin().await.context("Failed to begin rebuild")?;

        sqlx::query("DELETE FROM golf_player_season_stats")
            .execute(&mut *tx)
            .await
            .context("Failed to clear season stats")?;

        // Average strokes only over made-cut events: missed cuts play two
        // rounds and would drag the mean meaninglessly low.
        sqlx::query(
            "INSERT INTO golf_player_season_stats
             (player_id, year, player_name, events, cuts_made, wins, top_5,
              top_10, top_20, top_25, total_strokes, avg_strokes, best_finish,
              worst_finish, cut_pct, win_pct)
             SELECT
                 player_id,
                 year,
                 MAX(full_name),
                 COUNT(*),
                 SUM(made_cut),
                 SUM(win),
                 SUM(CASE WHEN finish_rank IS NOT NULL AND finish_rank <= 5 THEN 1 ELSE 0 END),
                 SUM(CASE WHEN finish_rank IS NOT NULL AND finish_rank <= 10 THEN 1 ELSE 0 END),
                 SUM(CASE WHEN finish_rank IS NOT NULL AND finish_rank <= 20 THEN 1 ELSE 0 END),
                 SUM(CASE WHEN finish_rank IS NOT NULL AND finish_rank <= 25 THEN 1 ELSE 0 END),
                 SUM(total_strokes),
                 ROUND(AVG(CASE WHEN made_cut = 1 THEN total_strokes END), 1),
                 MIN(finish_rank),
                 MAX(finish_rank),
                 ROUND(100.0 * SUM(made_cut) / COUNT(*), 1),
                 ROUND(100.0 * SUM(win) / COUNT(*), 1)
             FROM golf_results
             GROUP BY player_id, year",
        )
        .execute(&mut *tx)
        .await
        .context("Failed to rebuild season stats")?;

        tx.commit().await.context("Failed to commit rebuild")?;

        let count = self.table_count("golf_player_season_stats").await?;
        info!(players = count, "Golf season stats rebuilt");
        Ok(count)
    }

    /// Fetch one player's season aggregate.
    pub async fn golf_season_stats(
        &self,
        player_id: &str,
        year: i64,
    ) -> Result<Option<GolfSeasonStats>> {
        let row = sqlx::query(
            "SELECT player_id, year, player_name, events, cuts_made, wins, top_5,
                    top_10, top_20, top_25, total_strokes, avg_strokes, best_finish,
                    worst_finish, cut_pct, win_pct
             FROM golf_player_season_stats
             WHERE player_id = ? AND year = ?",
        )
        .bind(player_id)
        .bind(year)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch golf season stats")?;

        Ok(row.map(|r| GolfSeasonStats {
            player_id: r.get("player_id"),
            year: r.get("year"),
            player_name: r.get("player_name"),
            events: r.get("events"),
            cuts_made: r.get("cuts_made"),
            wins: r.get("wins"),
            top_5: r.get("top_5"),
            top_10: r.get("top_10"),
            top_20: r.get("top_20"),
            top_25: r.get("top_25"),
            total_strokes: r.get("total_strokes"),
            avg_strokes: r.get("avg_strokes"),
            best_finish: r.get("best_finish"),
            worst_finish: r.get("worst_finish"),
            cut_pct: r.get("cut_pct"),
            win_pct: r.get("win_pct"),
        }))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
