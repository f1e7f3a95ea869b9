//! PGA Tour collection pipeline: season schedule, final leaderboards for
//! completed tournaments, then a wholesale rebuild of per-player season
//! aggregates.

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::{info, warn};

use super::{Collector, RunReport};
use crate::snapshot::SnapshotStore;
use crate::sources::golf::{completed_before_today, GolfApi, GolfLeaderboardRow, GolfScheduleEntry};
use crate::store::Store;
use crate::types::{loose_i64, loose_string, Finish, GolfResultRow, TournamentRow};

#[derive(Debug, Clone)]
pub struct GolfRunOptions {
    pub year: u32,
    /// Cap on how many completed tournaments to pull leaderboards for;
    /// useful against RapidAPI request quotas.
    pub limit: Option<usize>,
}

pub struct GolfCollector {
    api: GolfApi,
    store: Store,
    snapshots: SnapshotStore,
    opts: GolfRunOptions,
}

impl GolfCollector {
    pub fn new(api: GolfApi, store: Store, snapshots: SnapshotStore, opts: GolfRunOptions) -> Self {
        Self {
            api,
            store,
            snapshots,
            opts,
        }
    }
}

#[async_trait]
impl Collector for GolfCollector {
    fn name(&self) -> &'static str {
        "golf"
    }

    async fn run(&self) -> Result<RunReport> {
        let mut report = RunReport::default();
        let year = self.opts.year;

        let mut schedule = self
            .api
            .schedule(year)
            .await
            .with_context(|| format!("Golf schedule fetch failed for {year}"))?;
        info!(year, tournaments = schedule.len(), "Golf schedule fetched");

        // Some schedule entries ship an unusable date block; the detail
        // endpoint usually has it. Without an end date a tournament can
        // never pass the completed filter.
        for entry in schedule.iter_mut() {
            if entry.end_date().is_some() || entry.tourn_id.is_empty() {
                continue;
            }
            match self.api.tournament(&entry.tourn_id, year).await {
                Ok(detail) if detail.end_date().is_some() => entry.date = detail.date,
                Ok(_) => {}
                Err(e) => {
                    warn!(tourn_id = %entry.tourn_id, error = %e, "Tournament detail fetch failed");
                }
            }
        }

        let tournaments: Vec<TournamentRow> = schedule
            .iter()
            .filter(|e| !e.tourn_id.is_empty())
            .map(|e| tournament_row(e, year))
            .collect();
        self.snapshots
            .write(&format!("golf/schedule_{year}.json"), &tournaments)?;
        report.record(
            "tournaments",
            self.store.upsert_tournaments(&tournaments).await?,
        );

        let mut completed = completed_before_today(&schedule);
        if let Some(limit) = self.opts.limit {
            completed.truncate(limit);
        }
        info!(count = completed.len(), "Completed tournaments to load");

        let mut results_total = 0usize;
        for entry in completed {
            let tourn_id = entry.tourn_id.as_str();
            if tourn_id.is_empty() {
                continue;
            }
            let rows = match self.api.leaderboard(tourn_id, year).await {
                Ok(raw) => raw,
                Err(e) => {
                    warn!(tourn_id, error = %e, "Leaderboard fetch failed, skipping tournament");
                    report.skip(format!("leaderboard {tourn_id}"));
                    continue;
                }
            };

            let results: Vec<GolfResultRow> = rows
                .iter()
                .filter_map(|r| result_row(r, entry, year))
                .collect();
            if results.len() < rows.len() {
                warn!(
                    tourn_id,
                    dropped = rows.len() - results.len(),
                    "Leaderboard rows without a player id dropped"
                );
            }

            self.snapshots.write(
                &format!("golf/results/leaderboard_{tourn_id}_{year}.json"),
                &results,
            )?;
            results_total += self.store.upsert_golf_results(&results).await?;
        }
        report.record("results", results_total);

        let players = self.store.rebuild_golf_season_stats().await?;
        report.record("season_stats", players as usize);

        Ok(report)
    }
}

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

fn tournament_row(e: &GolfScheduleEntry, year: u32) -> TournamentRow {
    TournamentRow {
        tourn_id: e.tourn_id.clone(),
        year: i64::from(year),
        name: e.name.clone(),
        start_date: e.start_date().unwrap_or_default(),
        end_date: e.end_date().unwrap_or_default(),
        purse: loose_i64(&e.purse),
        winners_share: loose_i64(&e.winners_share),
        fedex_points: loose_i64(&e.fedex_cup_points),
        format: e.format.clone(),
    }
}

/// `None` when the row carries no player id; everything else defaults.
fn result_row(r: &GolfLeaderboardRow, entry: &GolfScheduleEntry, year: u32) -> Option<GolfResultRow> {
    let player_id = loose_string(&r.player_id)?;
    let full_name = format!("{} {}", r.first_name, r.last_name)
        .trim()
        .to_string();
    Some(GolfResultRow {
        tourn_id: entry.tourn_id.clone(),
        year: i64::from(year),
        tournament_name: entry.name.clone(),
        player_id,
        first_name: r.first_name.clone(),
        last_name: r.last_name.clone(),
        full_name,
        position: r.position.clone(),
        finish: Finish::parse(&r.position, &r.status),
        total_score: loose_string(&r.total).unwrap_or_default(),
        total_strokes: loose_i64(&r.total_strokes_from_completed_rounds),
        is_amateur: r.is_amateur,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entry() -> GolfScheduleEntry {
        serde_json::from_value(json!({
            "tournId": "006",
            "name": "The Masters",
            "date": {"start": "2025-04-10T00:00:00Z", "end": "2025-04-13T00:00:00Z"},
            "format": "stroke",
            "purse": {"$numberInt": "20000000"},
            "winnersShare": "3600000",
            "fedexCupPoints": 750
        }))
        .unwrap()
    }

    #[test]
    fn test_tournament_row_coerces_money_fields() {
        let row = tournament_row(&entry(), 2025);
        assert_eq!(row.purse, Some(20_000_000));
        assert_eq!(row.winners_share, Some(3_600_000));
        assert_eq!(row.fedex_points, Some(750));
        assert_eq!(row.start_date, "2025-04-10");
        assert_eq!(row.end_date, "2025-04-13");
    }

    #[test]
    fn test_result_row_parses_finish() {
        let raw: GolfLeaderboardRow = serde_json::from_value(json!({
            "playerId": {"$numberInt": "46046"},
            "firstName": "Scottie",
            "lastName": "Scheffler",
            "position": "T2",
            "status": "complete",
            "total": "-16",
            "totalStrokesFromCompletedRounds": "272"
        }))
        .unwrap();

        let row = result_row(&raw, &entry(), 2025).unwrap();
        assert_eq!(row.player_id, "46046");
        assert_eq!(row.full_name, "Scottie Scheffler");
        assert_eq!(row.finish, Finish::Ranked(2));
        assert!(row.made_cut());
        assert!(!row.win());
        assert_eq!(row.total_strokes, Some(272));
    }

    #[test]
    fn test_result_row_without_player_id_is_dropped() {
        let raw: GolfLeaderboardRow = serde_json::from_value(json!({
            "firstName": "Ghost",
            "lastName": "Entry",
            "position": "CUT"
        }))
        .unwrap();
        assert!(result_row(&raw, &entry(), 2025).is_none());
    }

    #[test]
    fn test_result_row_status_beats_position() {
        let raw: GolfLeaderboardRow = serde_json::from_value(json!({
            "playerId": 7,
            "position": "T40",
            "status": "wd"
        }))
        .unwrap();
        let row = result_row(&raw, &entry(), 2025).unwrap();
        assert_eq!(row.finish, Finish::Withdrawn);
        assert!(!row.made_cut());
    }
}
