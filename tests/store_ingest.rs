use std::path::PathBuf;

use crickstat::store;

fn fixture_path(name: &str) -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    path
}

#[test]
fn ingest_round_trips_matches_and_deliveries() {
    let dir = tempfile::tempdir().expect("tempdir");
    let db_path = dir.path().join("store.sqlite");
    let mut conn = store::open_db(&db_path).expect("open db");

    let summary = store::ingest_csv(
        &mut conn,
        db_path,
        &fixture_path("matches.csv"),
        &fixture_path("deliveries.csv"),
    )
    .expect("ingest");
    assert_eq!(summary.matches_upserted, 4);
    assert_eq!(summary.deliveries_upserted, 23);
    assert_eq!(summary.rows_skipped, 0);

    let matches = store::load_matches(&conn).expect("load matches");
    assert_eq!(matches.len(), 4);
    assert_eq!(matches[0].match_id, 1);
    assert_eq!(matches[0].venue, "Garden Park");
    assert_eq!(matches[0].winner.as_deref(), Some("Punjab Kings"));
    assert_eq!(matches[0].result_margin, Some(4.0));

    // "NA" markers decode as absent values.
    let washout = &matches[3];
    assert_eq!(washout.winner, None);
    assert_eq!(washout.city, None);
    assert_eq!(washout.result_margin, None);

    let deliveries = store::load_deliveries(&conn, 1).expect("load deliveries");
    assert_eq!(deliveries.len(), 11);
    let wicket = &deliveries[3];
    assert!(wicket.is_wicket);
    assert_eq!(wicket.player_dismissed.as_deref(), Some("A Rao"));
    assert_eq!(wicket.dismissal_kind.as_deref(), Some("caught"));
    let wide = &deliveries[10];
    assert_eq!(wide.extras_type.as_deref(), Some("wides"));
    assert_eq!(wide.batsman_runs, 0);
    assert_eq!(wide.total_runs, 1);

    assert!(
        store::load_deliveries(&conn, 4)
            .expect("load empty match")
            .is_empty()
    );
}

#[test]
fn reingest_upserts_instead_of_duplicating() {
    let dir = tempfile::tempdir().expect("tempdir");
    let db_path = dir.path().join("store.sqlite");
    let mut conn = store::open_db(&db_path).expect("open db");

    for _ in 0..2 {
        store::ingest_csv(
            &mut conn,
            db_path.clone(),
            &fixture_path("matches.csv"),
            &fixture_path("deliveries.csv"),
        )
        .expect("ingest");
    }

    assert_eq!(store::load_matches(&conn).expect("matches").len(), 4);
    assert_eq!(store::load_deliveries(&conn, 1).expect("deliveries").len(), 11);
}
