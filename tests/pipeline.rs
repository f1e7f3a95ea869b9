//! End-to-end storage pipeline tests: repeated collection runs against the
//! same database must converge instead of duplicating, and derived
//! aggregates must always be reproducible from the base tables.

use statline::store::Store;
use statline::types::{Finish, GolfResultRow, SkaterSeasonRow, TournamentRow};

fn golf_result(tourn_id: &str, year: i64, player_id: &str, finish: Finish) -> GolfResultRow {
    GolfResultRow {
        tourn_id: tourn_id.into(),
        year,
        tournament_name: format!("Event {tourn_id}"),
        player_id: player_id.into(),
        first_name: "Rory".into(),
        last_name: "McIlroy".into(),
        full_name: "Rory McIlroy".into(),
        position: match finish.rank() {
            Some(r) => format!("T{r}"),
            None => "CUT".into(),
        },
        finish,
        total_score: "-12".into(),
        total_strokes: finish.made_cut().then_some(272),
        is_amateur: false,
    }
}

fn tournament(tourn_id: &str, year: i64) -> TournamentRow {
    TournamentRow {
        tourn_id: tourn_id.into(),
        year,
        name: format!("Event {tourn_id}"),
        start_date: "2025-04-10".into(),
        end_date: "2025-04-13".into(),
        purse: Some(20_000_000),
        winners_share: Some(3_600_000),
        fedex_points: Some(750),
        format: "stroke".into(),
    }
}

fn skater(player_id: i64, season: &str) -> SkaterSeasonRow {
    SkaterSeasonRow {
        player_id,
        first_name: "Connor".into(),
        last_name: "McDavid".into(),
        full_name: "Connor McDavid".into(),
        team_abbrev: "EDM".into(),
        position: "C".into(),
        season: season.into(),
        games_played: 82,
        goals: 40,
        assists: 80,
        points: 120,
        plus_minus: 20,
        penalty_minutes: 30,
        pp_goals: 10,
        sh_goals: 2,
        gw_goals: 6,
        shots: 300,
        hits: 50,
        blocked_shots: 40,
        toi_per_game: Some(1320.0),
        shooting_pct: 13.3,
        points_per_game: 1.463,
        goals_per_game: 0.488,
    }
}

#[tokio::test]
async fn second_run_with_same_data_changes_nothing() {
    let store = Store::open_in_memory().await.unwrap();
    let tournaments = vec![tournament("001", 2025)];
    let results = vec![
        golf_result("001", 2025, "100", Finish::Ranked(3)),
        golf_result("001", 2025, "200", Finish::MissedCut),
    ];
    let skaters = vec![skater(1, "20242025")];

    for _ in 0..2 {
        store.upsert_tournaments(&tournaments).await.unwrap();
        store.upsert_golf_results(&results).await.unwrap();
        store.upsert_skater_stats(&skaters).await.unwrap();
        store.rebuild_golf_season_stats().await.unwrap();
    }

    assert_eq!(store.table_count("golf_tournaments").await.unwrap(), 1);
    assert_eq!(store.table_count("golf_results").await.unwrap(), 2);
    assert_eq!(store.table_count("skater_stats").await.unwrap(), 1);
    assert_eq!(
        store.table_count("golf_player_season_stats").await.unwrap(),
        2
    );
}

#[tokio::test]
async fn aggregates_accumulate_across_runs() {
    let store = Store::open_in_memory().await.unwrap();

    // First run: one completed tournament.
    store
        .upsert_golf_results(&[golf_result("001", 2025, "100", Finish::Ranked(3))])
        .await
        .unwrap();
    store.rebuild_golf_season_stats().await.unwrap();

    let stats = store.golf_season_stats("100", 2025).await.unwrap().unwrap();
    assert_eq!(stats.events, 1);
    assert_eq!(stats.wins, 0);

    // Second run, a week later: two more tournaments have completed.
    store
        .upsert_golf_results(&[
            golf_result("001", 2025, "100", Finish::Ranked(3)),
            golf_result("002", 2025, "100", Finish::Ranked(1)),
            golf_result("003", 2025, "100", Finish::Ranked(24)),
        ])
        .await
        .unwrap();
    store.rebuild_golf_season_stats().await.unwrap();

    let stats = store.golf_season_stats("100", 2025).await.unwrap().unwrap();
    assert_eq!(stats.events, 3);
    assert_eq!(stats.cuts_made, 3);
    assert_eq!(stats.wins, 1);
    assert_eq!(stats.top_5, 2);
    assert_eq!(stats.top_10, 2);
    assert_eq!(stats.top_20, 2);
    assert_eq!(stats.top_25, 3);
    assert_eq!(stats.best_finish, Some(1));
    assert_eq!(stats.worst_finish, Some(24));
    assert_eq!(stats.cut_pct, 100.0);
    assert_eq!(stats.win_pct, 33.3);
}

#[tokio::test]
async fn rebuild_twice_is_identical() {
    let store = Store::open_in_memory().await.unwrap();
    store
        .upsert_golf_results(&[
            golf_result("001", 2025, "100", Finish::Ranked(5)),
            golf_result("002", 2025, "100", Finish::MissedCut),
            golf_result("001", 2025, "200", Finish::Withdrawn),
        ])
        .await
        .unwrap();

    store.rebuild_golf_season_stats().await.unwrap();
    let a = store.golf_season_stats("100", 2025).await.unwrap();
    let b = store.golf_season_stats("200", 2025).await.unwrap();

    store.rebuild_golf_season_stats().await.unwrap();
    assert_eq!(store.golf_season_stats("100", 2025).await.unwrap(), a);
    assert_eq!(store.golf_season_stats("200", 2025).await.unwrap(), b);
}

#[tokio::test]
async fn same_player_across_years_kept_separate() {
    let store = Store::open_in_memory().await.unwrap();
    store
        .upsert_golf_results(&[
            golf_result("001", 2024, "100", Finish::Ranked(1)),
            golf_result("001", 2025, "100", Finish::MissedCut),
        ])
        .await
        .unwrap();
    store.rebuild_golf_season_stats().await.unwrap();

    let y2024 = store.golf_season_stats("100", 2024).await.unwrap().unwrap();
    let y2025 = store.golf_season_stats("100", 2025).await.unwrap().unwrap();
    assert_eq!(y2024.wins, 1);
    assert_eq!(y2025.wins, 0);
    assert_eq!(y2025.cuts_made, 0);
}

#[tokio::test]
async fn skipped_resource_leaves_no_trace() {
    // A run that failed to fetch skater stats stores standings only; the
    // skater table must stay empty rather than hold stale placeholders.
    let store = Store::open_in_memory().await.unwrap();
    store
        .upsert_tournaments(&[tournament("001", 2025)])
        .await
        .unwrap();

    assert_eq!(store.table_count("golf_tournaments").await.unwrap(), 1);
    assert_eq!(store.table_count("skater_stats").await.unwrap(), 0);
    assert_eq!(store.table_count("golf_results").await.unwrap(), 0);
}
