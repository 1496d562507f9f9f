use std::path::{Path, PathBuf};

use crickstat::pipeline::{StageOutcome, run_pipeline};
use crickstat::player_stats::{PlayerAllTimeRecord, PlayerScopeStats};
use crickstat::repository::{EntityKind, Scope, StatsRepository};
use crickstat::roster::Roster;
use crickstat::store;
use crickstat::team_stats::{HeadToHeadRecord, VenueRecord};

fn fixture_path(name: &str) -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    path
}

/// Ingest the CSV fixtures into a fresh sqlite store under `dir`.
fn fixture_db(dir: &Path) -> rusqlite::Connection {
    let db_path = dir.join("crickstat.sqlite");
    let mut conn = store::open_db(&db_path).expect("open db");
    store::ingest_csv(
        &mut conn,
        db_path,
        &fixture_path("matches.csv"),
        &fixture_path("deliveries.csv"),
    )
    .expect("ingest fixtures");
    conn
}

fn fixture_roster() -> Roster {
    Roster::load(&fixture_path("squads")).expect("load squads")
}

#[test]
fn full_run_produces_every_record_family() {
    let dir = tempfile::tempdir().expect("tempdir");
    let conn = fixture_db(dir.path());
    let roster = fixture_roster();
    let repo = StatsRepository::new(dir.path().join("stats"));

    let report = run_pipeline(&conn, &roster, &repo).expect("pipeline");
    assert_eq!(report.matches, 4);
    assert_eq!(report.tracked_players, 4);
    assert_eq!(report.failed_stages(), 0);
    for stage in &report.stages {
        assert_eq!(stage.outcome, StageOutcome::Succeeded, "{:?}", stage.stage);
    }

    // Venue aggregate: one batting-first win, one chase.
    let venue = repo
        .get::<VenueRecord>(EntityKind::Venue, "Garden Park", Scope::AllTime, None)
        .expect("get venue")
        .expect("venue record");
    let summary = &venue.stats.summary;
    assert_eq!(summary.total_matches, 2);
    assert_eq!(summary.batting_first_wins, 1);
    assert_eq!(summary.batting_second_wins, 1);
    assert_eq!(summary.win_percentage_batting_first, Some(50.0));
    assert_eq!(summary.avg_first_innings_runs, Some(8.0));
    assert_eq!(summary.avg_second_innings_runs, Some(7.5));
    assert_eq!(summary.avg_second_innings_wickets, Some(0.5));

    // Head-to-head, including the washed-out fixture.
    let h2h = repo
        .get::<HeadToHeadRecord>(
            EntityKind::Team,
            "Punjab Kings",
            Scope::VsTeam,
            Some("Gujarat Titans"),
        )
        .expect("get h2h")
        .expect("h2h record");
    assert_eq!(h2h.stats.matches_played, 4);
    assert_eq!(h2h.stats.wins, 2);
    assert_eq!(h2h.stats.losses, 1);
    assert_eq!(h2h.stats.no_results, 1);

    // Player all-time stats are computed on delivery-log names.
    let rao = repo
        .get::<PlayerAllTimeRecord>(EntityKind::Player, "A Rao", Scope::AllTime, None)
        .expect("get player")
        .expect("player record");
    assert_eq!(rao.stats.display_name, "Arjun Rao");
    let batting = rao.stats.batting.expect("batting block");
    assert_eq!(batting.balls, 9);
    assert_eq!(batting.runs, 18);
    assert_eq!(batting.strike_rate, Some(200.0));
    assert_eq!(batting.dismissals, 1);
    assert_eq!(batting.average, Some(18.0));
    assert_eq!(batting.highest, 10);
    assert!(rao.stats.bowling.is_none());
    let form = rao.stats.recent_form.expect("recent form");
    assert_eq!(form.matches, vec![1, 2, 3]);

    let sharma = repo
        .get::<PlayerAllTimeRecord>(EntityKind::Player, "D Sharma", Scope::AllTime, None)
        .expect("get player")
        .expect("player record");
    let bowling = sharma.stats.bowling.expect("bowling block");
    assert_eq!(bowling.balls, 11);
    assert_eq!(bowling.runs, 19);
    assert_eq!(bowling.wickets, 2);
    assert_eq!(bowling.best_bowling, "1/5");

    // vs-player scope pairs tracked opponents only.
    let rao_vs_joshi = repo
        .get::<PlayerScopeStats>(EntityKind::Player, "A Rao", Scope::VsPlayer, Some("M Joshi"))
        .expect("get vs player")
        .expect("vs player record");
    assert_eq!(rao_vs_joshi.stats.batting.expect("batting").balls, 8);
}

#[test]
fn own_team_never_appears_as_a_vs_team_key() {
    let dir = tempfile::tempdir().expect("tempdir");
    let conn = fixture_db(dir.path());
    let roster = fixture_roster();
    let repo = StatsRepository::new(dir.path().join("stats"));

    run_pipeline(&conn, &roster, &repo).expect("pipeline");

    let own = repo
        .get::<PlayerScopeStats>(
            EntityKind::Player,
            "A Rao",
            Scope::VsTeam,
            Some("Punjab Kings"),
        )
        .expect("get vs own team");
    assert!(own.is_none());

    let opposition = repo
        .get::<PlayerScopeStats>(
            EntityKind::Player,
            "A Rao",
            Scope::VsTeam,
            Some("Gujarat Titans"),
        )
        .expect("get vs opposition")
        .expect("vs opposition record");
    assert_eq!(opposition.stats.batting.expect("batting").balls, 9);
}

#[test]
fn reruns_are_idempotent_and_leave_no_temp_files() {
    let dir = tempfile::tempdir().expect("tempdir");
    let conn = fixture_db(dir.path());
    let roster = fixture_roster();
    let repo = StatsRepository::new(dir.path().join("stats"));

    run_pipeline(&conn, &roster, &repo).expect("first run");
    let first: serde_json::Value = repo
        .get::<serde_json::Value>(EntityKind::Player, "A Rao", Scope::AllTime, None)
        .expect("get")
        .expect("record")
        .stats;
    let first_venue: serde_json::Value = repo
        .get::<serde_json::Value>(EntityKind::Venue, "Garden Park", Scope::AllTime, None)
        .expect("get")
        .expect("record")
        .stats;

    run_pipeline(&conn, &roster, &repo).expect("second run");
    let second: serde_json::Value = repo
        .get::<serde_json::Value>(EntityKind::Player, "A Rao", Scope::AllTime, None)
        .expect("get")
        .expect("record")
        .stats;
    let second_venue: serde_json::Value = repo
        .get::<serde_json::Value>(EntityKind::Venue, "Garden Park", Scope::AllTime, None)
        .expect("get")
        .expect("record")
        .stats;

    assert_eq!(first, second);
    assert_eq!(first_venue, second_venue);

    let mut tmp_files = Vec::new();
    collect_tmp_files(repo.root(), &mut tmp_files);
    assert!(tmp_files.is_empty(), "leftover temp files: {tmp_files:?}");
}

#[test]
fn missing_key_reads_as_none() {
    let dir = tempfile::tempdir().expect("tempdir");
    let repo = StatsRepository::new(dir.path().join("stats"));
    let got = repo
        .get::<serde_json::Value>(EntityKind::Player, "Nobody", Scope::AllTime, None)
        .expect("get");
    assert!(got.is_none());
}

#[test]
fn empty_store_is_fatal() {
    let dir = tempfile::tempdir().expect("tempdir");
    let conn = store::open_db(&dir.path().join("empty.sqlite")).expect("open db");
    let roster = fixture_roster();
    let repo = StatsRepository::new(dir.path().join("stats"));

    let err = run_pipeline(&conn, &roster, &repo).expect_err("no matches must be fatal");
    assert!(err.to_string().contains("no matches"));
}

#[test]
fn empty_roster_is_fatal() {
    let dir = tempfile::tempdir().expect("tempdir");
    let conn = fixture_db(dir.path());
    let roster = Roster::from_players(Vec::new());
    let repo = StatsRepository::new(dir.path().join("stats"));

    let err = run_pipeline(&conn, &roster, &repo).expect_err("no players must be fatal");
    assert!(err.to_string().contains("no tracked players"));
}

fn collect_tmp_files(dir: &Path, out: &mut Vec<PathBuf>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.filter_map(|e| e.ok()) {
        let path = entry.path();
        if path.is_dir() {
            collect_tmp_files(&path, out);
        } else if path.extension().is_some_and(|ext| ext == "tmp") {
            out.push(path);
        }
    }
}
