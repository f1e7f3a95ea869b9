//! SQLite persistence layer.
//!
//! One database file holds every sport's tables. All writes are
//! idempotent upserts keyed on each table's natural key, so re-running a
//! collector against unchanged upstream data leaves the database
//! byte-for-byte identical. Derived aggregates are rebuilt wholesale from
//! base tables, never patched incrementally.

pub mod golf;
pub mod nfl;
pub mod nhl;

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;
use tracing::{info, warn};

/// Handle to the stats database. Cheap to clone; clones share the pool.
#[derive(Debug, Clone)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    /// Open (creating if missing) the database at `path` and ensure the
    /// schema exists. With `rebuild`, any existing database file is deleted
    /// first and every table starts empty.
    pub async fn open(path: &str, rebuild: bool) -> Result<Self> {
        if rebuild {
            Self::remove_database_files(path)?;
        }
        if let Some(parent) = Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create data dir {}", parent.display()))?;
            }
        }

        let opts = SqliteConnectOptions::from_str(&format!("sqlite://{path}"))
            .with_context(|| format!("Invalid database path: {path}"))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(opts)
            .await
            .with_context(|| format!("Failed to open database {path}"))?;

        let store = Self { pool };
        store.init_schema().await?;
        info!(path, rebuild, "Database ready");
        Ok(store)
    }

    /// In-memory database for tests.
    pub async fn open_in_memory() -> Result<Self> {
        // One connection only: each sqlite::memory: connection is its own
        // empty database.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .context("Failed to open in-memory database")?;
        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> Result<()> {
        for (name, schema) in [
            ("nhl", nhl::SCHEMA),
            ("golf", golf::SCHEMA),
            ("nfl", nfl::SCHEMA),
        ] {
            sqlx::raw_sql(schema)
                .execute(&self.pool)
                .await
                .with_context(|| format!("Failed to create {name} schema"))?;
        }
        Ok(())
    }

    fn remove_database_files(path: &str) -> Result<()> {
        // WAL mode leaves -wal/-shm siblings next to the main file.
        for suffix in ["", "-wal", "-shm"] {
            let p = format!("{path}{suffix}");
            if Path::new(&p).exists() {
                std::fs::remove_file(&p)
                    .with_context(|| format!("Failed to delete {p}"))?;
                warn!(path = %p, "Deleted existing database file");
            }
        }
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Row count for one of our own tables. `table` is always a
    /// compile-time constant, never user input.
    pub async fn table_count(&self, table: &str) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(&self.pool)
            .await
            .with_context(|| format!("Failed to count rows in {table}"))?;
        Ok(count)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_schema_creates_all_tables() {
        let store = Store::open_in_memory().await.unwrap();
        for table in [
            "teams",
            "players",
            "skater_stats",
            "goalie_stats",
            "standings",
            "golf_tournaments",
            "golf_results",
            "golf_player_season_stats",
            "nfl_teams",
            "nfl_standings",
            "nfl_player_stats",
        ] {
            assert_eq!(store.table_count(table).await.unwrap(), 0, "{table}");
        }
    }

    #[tokio::test]
    async fn test_open_rebuild_deletes_file() {
        let mut path = std::env::temp_dir();
        path.push(format!("statline_store_test_{}.db", uuid::Uuid::new_v4()));
        let path = path.to_string_lossy().to_string();

        {
            let store = Store::open(&path, false).await.unwrap();
            sqlx::query("INSERT INTO golf_tournaments (tourn_id, year, name, start_date, end_date, format) VALUES ('006', 2025, 'x', '', '', '')")
                .execute(store.pool())
                .await
                .unwrap();
            assert_eq!(store.table_count("golf_tournaments").await.unwrap(), 1);
        }

        let store = Store::open(&path, true).await.unwrap();
        assert_eq!(store.table_count("golf_tournaments").await.unwrap(), 0);

        for suffix in ["", "-wal", "-shm"] {
            let _ = std::fs::remove_file(format!("{path}{suffix}"));
        }
    }
}
