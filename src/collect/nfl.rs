//! NFL collection pipeline: team directory, season standings, and
//! per-player season stat lines (regular season and playoffs).

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::{info, warn};

use super::{Collector, RunReport};
use crate::snapshot::SnapshotStore;
use crate::sources::nfl::{NflApi, NflSeasonStat, NflStandingEntry, NflTeam};
use crate::store::Store;
use crate::types::{NflPlayerStatRow, NflStandingRow, NflTeamRow};

#[derive(Debug, Clone)]
pub struct NflRunOptions {
    pub season: u32,
}

pub struct NflCollector {
    api: NflApi,
    store: Store,
    snapshots: SnapshotStore,
    opts: NflRunOptions,
}

impl NflCollector {
    pub fn new(api: NflApi, store: Store, snapshots: SnapshotStore, opts: NflRunOptions) -> Self {
        Self {
            api,
            store,
            snapshots,
            opts,
        }
    }
}

#[async_trait]
impl Collector for NflCollector {
    fn name(&self) -> &'static str {
        "nfl"
    }

    async fn run(&self) -> Result<RunReport> {
        let mut report = RunReport::default();
        let season = self.opts.season;

        let teams = self.api.teams().await.context("NFL teams fetch failed")?;
        info!(count = teams.len(), "NFL teams fetched");
        let team_rows: Vec<NflTeamRow> = teams.iter().map(team_row).collect();
        self.snapshots.write("nfl/teams.json", &team_rows)?;
        report.record("teams", self.store.upsert_nfl_teams(&team_rows).await?);

        match self.api.standings(season).await {
            Ok(entries) => {
                let rows: Vec<NflStandingRow> = entries
                    .iter()
                    .map(|e| standing_row(e, i64::from(season)))
                    .collect();
                self.snapshots
                    .write(&format!("nfl/standings_{season}.json"), &rows)?;
                report.record("standings", self.store.upsert_nfl_standings(&rows).await?);
            }
            Err(e) => {
                warn!(season, error = %e, "NFL standings fetch failed, skipping");
                report.skip("standings");
            }
        }

        for postseason in [false, true] {
            let label = if postseason {
                "player_stats_postseason"
            } else {
                "player_stats"
            };
            match self.api.season_stats(season, postseason).await {
                Ok(stats) => {
                    let rows: Vec<NflPlayerStatRow> = stats
                        .iter()
                        .map(|s| stat_row(s, i64::from(season), postseason))
                        .collect();
                    self.snapshots
                        .write(&format!("nfl/{label}_{season}.json"), &rows)?;
                    report.record(label, self.store.upsert_nfl_player_stats(&rows).await?);
                }
                Err(e) => {
                    warn!(season, postseason, error = %e, "NFL season stats fetch failed, skipping");
                    report.skip(label);
                }
            }
        }

        Ok(report)
    }
}

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

fn team_row(t: &NflTeam) -> NflTeamRow {
    NflTeamRow {
        id: t.id,
        abbreviation: t.abbreviation.clone(),
        full_name: t.full_name.clone(),
        location: t.location.clone(),
        name: t.name.clone(),
        conference: t.conference.clone(),
        division: t.division.clone(),
    }
}

fn standing_row(e: &NflStandingEntry, season: i64) -> NflStandingRow {
    NflStandingRow {
        season,
        team_id: e.team.id,
        team_abbrev: e.team.abbreviation.clone(),
        team_name: e.team.full_name.clone(),
        conference: e.team.conference.clone(),
        division: e.team.division.clone(),
        wins: Some(e.wins),
        losses: Some(e.losses),
        ties: Some(e.ties),
        points_for: Some(e.points_for),
        points_against: Some(e.points_against),
        point_differential: Some(e.point_differential),
        playoff_seed: e.playoff_seed,
        overall_record: format_record(e.wins, e.losses, e.ties),
        home_record: e.home_record.clone(),
        road_record: e.road_record.clone(),
        division_record: e.division_record.clone(),
        conference_record: e.conference_record.clone(),
        win_streak: Some(e.win_streak),
    }
}

/// "W-L" or "W-L-T" when ties are in play.
fn format_record(wins: i64, losses: i64, ties: i64) -> String {
    if ties > 0 {
        format!("{wins}-{losses}-{ties}")
    } else {
        format!("{wins}-{losses}")
    }
}

fn stat_row(s: &NflSeasonStat, season: i64, postseason: bool) -> NflPlayerStatRow {
    let p = &s.player;
    let full_name = format!("{} {}", p.first_name, p.last_name)
        .trim()
        .to_string();
    NflPlayerStatRow {
        season,
        postseason,
        player_id: p.id,
        first_name: p.first_name.clone(),
        last_name: p.last_name.clone(),
        full_name,
        position: p.position.clone(),
        position_abbrev: p.position_abbreviation.clone(),
        team: p.team_abbreviation().unwrap_or_default(),
        games_played: s.games_played,
        passing_completions: s.passing_completions,
        passing_attempts: s.passing_attempts,
        passing_yards: s.passing_yards,
        passing_touchdowns: s.passing_touchdowns,
        passing_interceptions: s.passing_interceptions,
        passing_yards_per_game: s.passing_yards_per_game,
        passing_completion_pct: completion_pct(s),
        yards_per_pass_attempt: yards_per_attempt(s),
        qbr: s.qbr,
        rushing_attempts: s.rushing_attempts,
        rushing_yards: s.rushing_yards,
        rushing_touchdowns: s.rushing_touchdowns,
        rushing_yards_per_game: s.rushing_yards_per_game,
        yards_per_rush_attempt: s.yards_per_rush_attempt,
        rushing_fumbles: s.rushing_fumbles,
        rushing_fumbles_lost: s.rushing_fumbles_lost,
        rushing_first_downs: s.rushing_first_downs,
        receptions: s.receptions,
        receiving_targets: s.receiving_targets,
        receiving_yards: s.receiving_yards,
        receiving_touchdowns: s.receiving_touchdowns,
        receiving_yards_per_game: s.receiving_yards_per_game,
        yards_per_reception: s.yards_per_reception,
        receiving_fumbles: s.receiving_fumbles,
        receiving_first_downs: s.receiving_first_downs,
        total_tackles: s.total_tackles,
        solo_tackles: s.solo_tackles,
        assist_tackles: s.assist_tackles,
        defensive_sacks: s.defensive_sacks,
        defensive_sack_yards: s.defensive_sack_yards,
        defensive_interceptions: s.defensive_interceptions,
        interception_touchdowns: s.interception_touchdowns,
        fumbles_forced: s.fumbles_forced,
        fumbles_recovered: s.fumbles_recovered,
        fumbles_touchdowns: s.fumbles_touchdowns,
        field_goal_attempts: s.field_goal_attempts,
        field_goals_made: s.field_goals_made,
        field_goal_pct: s.field_goal_pct,
        field_goals_made_1_19: s.field_goals_made_1_19,
        field_goals_made_20_29: s.field_goals_made_20_29,
        field_goals_made_30_39: s.field_goals_made_30_39,
        field_goals_made_40_49: s.field_goals_made_40_49,
        field_goals_made_50: s.field_goals_made_50,
        punts: s.punts,
        punt_yards: s.punt_yards,
    }
}

/// Derived passing rates, only when the player actually attempted passes.
fn completion_pct(s: &NflSeasonStat) -> Option<f64> {
    match (s.passing_completions, s.passing_attempts) {
        (Some(c), Some(a)) if a > 0 => Some(crate::types::pct(c as f64, a as f64)),
        _ => None,
    }
}

fn yards_per_attempt(s: &NflSeasonStat) -> Option<f64> {
    match (s.passing_yards, s.passing_attempts) {
        (Some(y), Some(a)) if a > 0 => Some(crate::types::round3(y as f64 / a as f64)),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
