//! STATLINE — sports statistics collection pipeline.
//!
//! Entry point. Parses the CLI, loads configuration, initialises
//! structured logging, then runs the requested sport's collector:
//! fetch → normalize → snapshot → upsert, with aggregates rebuilt at the
//! end where the sport has them.

use anyhow::Result;
use chrono::{Datelike, Utc};
use clap::{Parser, Subcommand};
use secrecy::Secret;
use std::process::ExitCode;
use std::time::Duration;
use tracing::{error, info};
use uuid::Uuid;

use statline::cache::FileCache;
use statline::collect::{
    Collector, GolfCollector, GolfRunOptions, NflCollector, NflRunOptions, NhlCollector,
    NhlRunOptions,
};
use statline::config::AppConfig;
use statline::snapshot::SnapshotStore;
use statline::sources::golf::GolfApi;
use statline::sources::nfl::NflApi;
use statline::sources::nhl::NhlApi;
use statline::sources::TtlPolicy;
use statline::store::Store;

#[derive(Parser)]
#[command(name = "statline", version, about = "Collect sports statistics into SQLite")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, default_value = "config.toml", global = true)]
    config: String,

    /// Delete the database and start from an empty schema.
    #[arg(long, global = true)]
    rebuild: bool,

    /// Bypass the response cache and hit the APIs directly.
    #[arg(long, global = true)]
    no_cache: bool,

    #[command(subcommand)]
    sport: Sport,
}

#[derive(Subcommand)]
enum Sport {
    /// Collect NHL standings, rosters, schedules and player season stats.
    Nhl {
        /// Season like "20242025"; defaults to the current one.
        #[arg(long)]
        season: Option<String>,
        /// Skip the per-team roster crawl.
        #[arg(long)]
        skip_rosters: bool,
        /// Skip per-player game log snapshots.
        #[arg(long)]
        skip_game_logs: bool,
    },
    /// Collect the PGA Tour schedule, results and season aggregates.
    Golf {
        /// Tour year; defaults to the current calendar year.
        #[arg(long)]
        year: Option<u32>,
        /// Load leaderboards for at most this many completed tournaments.
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Collect NFL teams, standings and player season stats.
    Nfl {
        /// Season year; defaults to the most recent completed season.
        #[arg(long)]
        season: Option<u32>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenv::dotenv();
    let cli = Cli::parse();
    init_logging();

    match run(cli).await {
        Ok(total) if total > 0 => ExitCode::SUCCESS,
        Ok(_) => {
            error!("Run finished but nothing was collected");
            ExitCode::FAILURE
        }
        Err(e) => {
            error!(error = format!("{e:#}"), "Run failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<usize> {
    let cfg = AppConfig::load_or_default(&cli.config)?;
    let run_id = Uuid::new_v4();

    let store = Store::open(&cfg.storage.db_path, cli.rebuild).await?;
    let snapshots = SnapshotStore::new(&cfg.storage.raw_dir);
    let cache = FileCache::new(&cfg.cache.root, !cli.no_cache)?;
    let ttl = TtlPolicy::from_config(&cfg.cache);

    let collector: Box<dyn Collector> = match &cli.sport {
        Sport::Nhl {
            season,
            skip_rosters,
            skip_game_logs,
        } => {
            let api = NhlApi::new(cache, Duration::from_millis(cfg.nhl.delay_ms), ttl)?;
            Box::new(NhlCollector::new(
                api,
                store,
                snapshots,
                NhlRunOptions {
                    season: season.clone(),
                    skip_rosters: *skip_rosters,
                    skip_game_logs: *skip_game_logs,
                },
            ))
        }
        Sport::Golf { year, limit } => {
            let key = Secret::new(AppConfig::resolve_env(&cfg.golf.api_key_env)?);
            let api = GolfApi::new(cache, key, Duration::from_millis(cfg.golf.delay_ms), ttl)?;
            Box::new(GolfCollector::new(
                api,
                store,
                snapshots,
                GolfRunOptions {
                    year: year.unwrap_or_else(|| Utc::now().year() as u32),
                    limit: *limit,
                },
            ))
        }
        Sport::Nfl { season } => {
            let key = Secret::new(AppConfig::resolve_env(&cfg.nfl.api_key_env)?);
            let api = NflApi::new(cache, key, Duration::from_millis(cfg.nfl.delay_ms), ttl)?;
            Box::new(NflCollector::new(
                api,
                store,
                snapshots,
                NflRunOptions {
                    season: season.unwrap_or_else(default_nfl_season),
                },
            ))
        }
    };

    info!(
        %run_id,
        sport = collector.name(),
        rebuild = cli.rebuild,
        cache = !cli.no_cache,
        "Collection starting"
    );

    let report = collector.run().await?;
    report.log_summary(collector.name());
    Ok(report.total())
}

/// An NFL season is labeled by its starting year; before September the
/// most recent season with data is last year's.
fn default_nfl_season() -> u32 {
    let now = Utc::now();
    let year = now.year() as u32;
    if now.month() >= 9 {
        year
    } else {
        year - 1
    }
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("statline=info"));

    let json_logging = std::env::var("STATLINE_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt().with_env_filter(env_filter).with_target(true).init();
    }
}
