//! NHL collection pipeline: standings (which double as the team
//! directory), club schedules, team rosters, per-player game logs, and
//! league-wide skater/goalie season summaries. Schedules and game logs
//! are snapshot-only; everything else also lands in the database.

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::{info, warn};

use super::{Collector, RunReport};
use crate::snapshot::SnapshotStore;
use crate::sources::nhl::{
    NhlApi, NhlGoalieSummary, NhlRosterPlayer, NhlSkaterSummary, NhlStanding,
};
use crate::store::Store;
use crate::types::{
    pct, per_game, split_full_name, GoalieSeasonRow, PlayerRow, SkaterSeasonRow, StandingRow,
    TeamRow,
};

/// Regular season in the stats REST gameTypeId vocabulary.
const GAME_TYPE_REGULAR: u8 = 2;

#[derive(Debug, Default, Clone)]
pub struct NhlRunOptions {
    /// Season like "20242025"; defaults to whatever the standings report.
    pub season: Option<String>,
    /// Skip the per-team roster crawl (32 extra requests).
    pub skip_rosters: bool,
    /// Skip per-player game logs (one request per rostered player).
    pub skip_game_logs: bool,
}

pub struct NhlCollector {
    api: NhlApi,
    store: Store,
    snapshots: SnapshotStore,
    opts: NhlRunOptions,
}

impl NhlCollector {
    pub fn new(api: NhlApi, store: Store, snapshots: SnapshotStore, opts: NhlRunOptions) -> Self {
        Self {
            api,
            store,
            snapshots,
            opts,
        }
    }
}

#[async_trait]
impl Collector for NhlCollector {
    fn name(&self) -> &'static str {
        "nhl"
    }

    async fn run(&self) -> Result<RunReport> {
        let mut report = RunReport::default();

        // Everything downstream needs the standings: they carry the team
        // directory and the season id. No standings, no run.
        let standings = self
            .api
            .standings(None)
            .await
            .context("NHL standings fetch failed")?;
        let season = match &self.opts.season {
            Some(s) => s.clone(),
            None => standings
                .first()
                .and_then(|s| s.season_id)
                .map(|id| id.to_string())
                .unwrap_or_default(),
        };
        info!(season, teams = standings.len(), "NHL standings fetched");

        let teams: Vec<TeamRow> = standings.iter().map(team_row).collect();
        let standing_rows: Vec<StandingRow> =
            standings.iter().map(|s| standing_row(s, &season)).collect();

        self.snapshots.write("nhl/teams.json", &teams)?;
        self.snapshots
            .write(&format!("nhl/standings_{season}.json"), &standing_rows)?;
        report.record("teams", self.store.upsert_teams(&teams).await?);
        report.record(
            "standings",
            self.store.upsert_standings(&standing_rows).await?,
        );

        // Season schedules are raw snapshots; nothing downstream loads
        // them, so any failure just skips the team.
        let mut schedules = 0;
        for team in &teams {
            match self.api.club_schedule(&team.abbrev, &season).await {
                Ok(raw) => {
                    self.snapshots.write(
                        &format!("nhl/schedules/schedule_{}_{season}.json", team.abbrev),
                        &raw,
                    )?;
                    schedules += 1;
                }
                Err(e) => {
                    warn!(team = %team.abbrev, error = %e, "Schedule fetch failed, skipping team");
                    report.skip(format!("schedule {}", team.abbrev));
                }
            }
        }
        report.record("schedules", schedules);

        if !self.opts.skip_rosters {
            let mut players: Vec<PlayerRow> = Vec::new();
            for team in &teams {
                match self.api.roster(&team.abbrev, &season).await {
                    Ok(roster) => {
                        players.extend(
                            roster.all_players().map(|p| player_row(p, &team.abbrev)),
                        );
                    }
                    Err(e) => {
                        warn!(team = %team.abbrev, error = %e, "Roster fetch failed, skipping team");
                        report.skip(format!("roster {}", team.abbrev));
                    }
                }
            }
            self.snapshots
                .write(&format!("nhl/players_{season}.json"), &players)?;
            report.record("players", self.store.upsert_players(&players).await?);

            // Game logs, one request per rostered player, snapshot only.
            if !self.opts.skip_game_logs {
                let mut game_logs = 0;
                for player in &players {
                    match self.api.game_log(player.id, &season, GAME_TYPE_REGULAR).await {
                        Ok(raw) => {
                            self.snapshots.write(
                                &format!("nhl/game_logs/{}_{season}.json", player.id),
                                &raw,
                            )?;
                            game_logs += 1;
                        }
                        Err(e) => {
                            warn!(player = player.id, error = %e, "Game log fetch failed, skipping player");
                            report.skip(format!("game_log {}", player.id));
                        }
                    }
                }
                report.record("game_logs", game_logs);
            }
        }

        match self.api.skater_summary(&season, GAME_TYPE_REGULAR).await {
            Ok(summaries) => {
                let rows: Vec<SkaterSeasonRow> =
                    summaries.iter().map(|s| skater_row(s, &season)).collect();
                self.snapshots
                    .write(&format!("nhl/skater_stats_{season}.json"), &rows)?;
                report.record("skater_stats", self.store.upsert_skater_stats(&rows).await?);
            }
            Err(e) => {
                warn!(error = %e, "Skater summary fetch failed, skipping");
                report.skip("skater_stats");
            }
        }

        match self.api.goalie_summary(&season, GAME_TYPE_REGULAR).await {
            Ok(summaries) => {
                let rows: Vec<GoalieSeasonRow> =
                    summaries.iter().map(|g| goalie_row(g, &season)).collect();
                self.snapshots
                    .write(&format!("nhl/goalie_stats_{season}.json"), &rows)?;
                report.record("goalie_stats", self.store.upsert_goalie_stats(&rows).await?);
            }
            Err(e) => {
                warn!(error = %e, "Goalie summary fetch failed, skipping");
                report.skip("goalie_stats");
            }
        }

        Ok(report)
    }
}

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

fn team_row(s: &NhlStanding) -> TeamRow {
    TeamRow {
        id: s.team_id,
        name: s.team_name.default.clone(),
        abbrev: s.team_abbrev.default.clone(),
        conference: s.conference_name.clone(),
        division: s.division_name.clone(),
        wins: s.wins,
        losses: s.losses,
        ot_losses: s.ot_losses,
        points: s.points,
        games_played: s.games_played,
        goals_for: s.goal_for,
        goals_against: s.goal_against,
        pp_pct: fraction_as_pct(s.power_play_pct),
        pk_pct: fraction_as_pct(s.penalty_kill_pct),
        streak: s.streak_code.clone(),
        logo_url: s.team_logo.clone(),
    }
}

fn standing_row(s: &NhlStanding, season: &str) -> StandingRow {
    StandingRow {
        season: season.to_string(),
        team_abbrev: s.team_abbrev.default.clone(),
        team_name: s.team_name.default.clone(),
        conference: s.conference_name.clone(),
        division: s.division_name.clone(),
        wins: s.wins,
        losses: s.losses,
        ot_losses: s.ot_losses,
        points: s.points,
        games_played: s.games_played,
        goals_for: s.goal_for,
        goals_against: s.goal_against,
        goal_diff: s.goal_for - s.goal_against,
        home_wins: s.home_wins,
        home_losses: s.home_losses,
        away_wins: s.road_wins,
        away_losses: s.road_losses,
        l10_wins: s.l10_wins,
        l10_losses: s.l10_losses,
        pp_pct: fraction_as_pct(s.power_play_pct),
        pk_pct: fraction_as_pct(s.penalty_kill_pct),
    }
}

/// The standings endpoint reports special-teams rates as fractions
/// (0.259); store percentages (25.9).
fn fraction_as_pct(v: Option<f64>) -> f64 {
    crate::types::round1(v.unwrap_or(0.0) * 100.0)
}

fn player_row(p: &NhlRosterPlayer, team_abbrev: &str) -> PlayerRow {
    let first = p.first_name.default.clone();
    let last = p.last_name.default.clone();
    PlayerRow {
        id: p.id,
        full_name: format!("{first} {last}").trim().to_string(),
        first_name: first,
        last_name: last,
        number: p.sweater_number,
        position: p.position_code.clone(),
        team_abbrev: team_abbrev.to_string(),
        shoots_catches: p.shoots_catches.clone(),
        height_inches: p.height_in_inches,
        weight_pounds: p.weight_in_pounds,
        birth_date: p.birth_date.clone(),
        birth_country: p.birth_country.clone(),
        headshot_url: p.headshot.clone(),
    }
}

fn skater_row(s: &NhlSkaterSummary, season: &str) -> SkaterSeasonRow {
    let (first_name, last_name) = split_full_name(&s.skater_full_name);
    SkaterSeasonRow {
        player_id: s.player_id,
        first_name,
        last_name,
        full_name: s.skater_full_name.clone(),
        team_abbrev: s.team_abbrevs.clone(),
        position: s.position_code.clone(),
        season: season.to_string(),
        games_played: s.games_played,
        goals: s.goals,
        assists: s.assists,
        points: s.points,
        plus_minus: s.plus_minus,
        penalty_minutes: s.penalty_minutes,
        pp_goals: s.pp_goals,
        sh_goals: s.sh_goals,
        gw_goals: s.game_winning_goals,
        shots: s.shots,
        hits: s.hits,
        blocked_shots: s.blocked_shots,
        toi_per_game: s.time_on_ice_per_game,
        shooting_pct: pct(s.goals as f64, s.shots as f64),
        points_per_game: per_game(s.points as f64, s.games_played as f64),
        goals_per_game: per_game(s.goals as f64, s.games_played as f64),
    }
}

fn goalie_row(g: &NhlGoalieSummary, season: &str) -> GoalieSeasonRow {
    let (first_name, last_name) = split_full_name(&g.goalie_full_name);
    GoalieSeasonRow {
        player_id: g.player_id,
        first_name,
        last_name,
        full_name: g.goalie_full_name.clone(),
        team_abbrev: g.team_abbrevs.clone(),
        season: season.to_string(),
        games_played: g.games_played,
        games_started: g.games_started,
        wins: g.wins,
        losses: g.losses,
        ot_losses: g.ot_losses,
        save_pct: g.save_pct,
        gaa: g.goals_against_average,
        shutouts: g.shutouts,
        saves: g.saves,
        shots_against: g.shots_against,
        goals_against: g.goals_against,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
