use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{Connection, params};
use serde::Deserialize;
use tracing::{info, warn};

use crate::records::{Delivery, Match};

pub fn open_db(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).ok();
    }
    let conn =
        Connection::open(path).with_context(|| format!("open sqlite db {}", path.display()))?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        PRAGMA journal_mode = WAL;
        CREATE TABLE IF NOT EXISTS matches (
            match_id INTEGER PRIMARY KEY,
            season TEXT NOT NULL,
            city TEXT NULL,
            date TEXT NOT NULL,
            venue TEXT NOT NULL,
            team1 TEXT NOT NULL,
            team2 TEXT NOT NULL,
            toss_winner TEXT NOT NULL,
            toss_decision TEXT NOT NULL,
            winner TEXT NULL,
            result TEXT NOT NULL,
            result_margin REAL NULL,
            updated_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_matches_venue ON matches(venue);
        CREATE INDEX IF NOT EXISTS idx_matches_season ON matches(season);

        CREATE TABLE IF NOT EXISTS deliveries (
            match_id INTEGER NOT NULL,
            inning INTEGER NOT NULL,
            over INTEGER NOT NULL,
            ball INTEGER NOT NULL,
            batting_team TEXT NOT NULL,
            bowling_team TEXT NOT NULL,
            batter TEXT NOT NULL,
            bowler TEXT NOT NULL,
            non_striker TEXT NOT NULL,
            batsman_runs INTEGER NOT NULL,
            extra_runs INTEGER NOT NULL,
            total_runs INTEGER NOT NULL,
            extras_type TEXT NULL,
            is_wicket INTEGER NOT NULL,
            player_dismissed TEXT NULL,
            dismissal_kind TEXT NULL,
            fielder TEXT NULL,
            PRIMARY KEY (match_id, inning, over, ball)
        );
        CREATE INDEX IF NOT EXISTS idx_deliveries_batter ON deliveries(batter);
        CREATE INDEX IF NOT EXISTS idx_deliveries_bowler ON deliveries(bowler);

        CREATE TABLE IF NOT EXISTS ingest_runs (
            run_id INTEGER PRIMARY KEY AUTOINCREMENT,
            started_at TEXT NOT NULL,
            finished_at TEXT NULL,
            matches_upserted INTEGER NOT NULL,
            deliveries_upserted INTEGER NOT NULL,
            rows_skipped INTEGER NOT NULL,
            errors_json TEXT NOT NULL
        );
        "#,
    )
    .context("create sqlite schema")?;
    Ok(())
}

#[derive(Debug, Clone)]
pub struct IngestSummary {
    pub db_path: PathBuf,
    pub matches_upserted: usize,
    pub deliveries_upserted: usize,
    pub rows_skipped: usize,
    pub errors: Vec<String>,
}

/// Ingest the flat matches.csv + deliveries.csv pair into sqlite. Re-running
/// over the same files is a no-op upsert, keyed by match id and ball position.
pub fn ingest_csv(
    conn: &mut Connection,
    db_path: PathBuf,
    matches_csv: &Path,
    deliveries_csv: &Path,
) -> Result<IngestSummary> {
    let started_at = Utc::now().to_rfc3339();
    conn.execute(
        "INSERT INTO ingest_runs(started_at, finished_at, matches_upserted, deliveries_upserted, rows_skipped, errors_json)
         VALUES (?1, NULL, 0, 0, 0, '[]')",
        params![started_at],
    )
    .context("insert ingest run")?;
    let run_id = conn.last_insert_rowid();

    let mut matches_upserted = 0usize;
    let mut deliveries_upserted = 0usize;
    let mut rows_skipped = 0usize;
    let mut errors: Vec<String> = Vec::new();

    let (matches, match_errors) = read_matches_csv(matches_csv)?;
    rows_skipped += match_errors.len();
    errors.extend(match_errors);

    let tx = conn.transaction().context("begin match ingest")?;
    for m in &matches {
        upsert_match(&tx, m)?;
        matches_upserted += 1;
    }
    tx.commit().context("commit match ingest")?;
    info!(count = matches_upserted, "matches ingested");

    let (deliveries, delivery_errors) = read_deliveries_csv(deliveries_csv)?;
    rows_skipped += delivery_errors.len();
    errors.extend(delivery_errors);

    let tx = conn.transaction().context("begin delivery ingest")?;
    for d in &deliveries {
        upsert_delivery(&tx, d)?;
        deliveries_upserted += 1;
    }
    tx.commit().context("commit delivery ingest")?;
    info!(count = deliveries_upserted, "deliveries ingested");

    let finished_at = Utc::now().to_rfc3339();
    let errors_json = serde_json::to_string(&errors).unwrap_or_else(|_| "[]".to_string());
    conn.execute(
        "UPDATE ingest_runs
         SET finished_at = ?1, matches_upserted = ?2, deliveries_upserted = ?3, rows_skipped = ?4, errors_json = ?5
         WHERE run_id = ?6",
        params![
            finished_at,
            matches_upserted as i64,
            deliveries_upserted as i64,
            rows_skipped as i64,
            errors_json,
            run_id
        ],
    )
    .context("update ingest run")?;

    Ok(IngestSummary {
        db_path,
        matches_upserted,
        deliveries_upserted,
        rows_skipped,
        errors,
    })
}

pub fn load_matches(conn: &Connection) -> Result<Vec<Match>> {
    let mut stmt = conn
        .prepare(
            r#"
            SELECT
                match_id, season, city, date, venue,
                team1, team2, toss_winner, toss_decision,
                winner, result, result_margin
            FROM matches
            ORDER BY match_id ASC
            "#,
        )
        .context("prepare load matches query")?;

    let rows = stmt
        .query_map([], |row| {
            Ok(Match {
                match_id: row.get::<_, u64>(0)?,
                season: row.get(1)?,
                city: row.get(2)?,
                date: row.get(3)?,
                venue: row.get(4)?,
                team1: row.get(5)?,
                team2: row.get(6)?,
                toss_winner: row.get(7)?,
                toss_decision: row.get(8)?,
                winner: row.get(9)?,
                result: row.get(10)?,
                result_margin: row.get(11)?,
            })
        })
        .context("query load matches")?;

    let mut out = Vec::new();
    for row in rows {
        out.push(row.context("decode match row")?);
    }
    Ok(out)
}

pub fn load_deliveries(conn: &Connection, match_id: u64) -> Result<Vec<Delivery>> {
    let mut stmt = conn
        .prepare(
            r#"
            SELECT
                match_id, inning, over, ball,
                batting_team, bowling_team, batter, bowler, non_striker,
                batsman_runs, extra_runs, total_runs, extras_type,
                is_wicket, player_dismissed, dismissal_kind, fielder
            FROM deliveries
            WHERE match_id = ?1
            ORDER BY inning ASC, over ASC, ball ASC
            "#,
        )
        .context("prepare load deliveries query")?;

    let rows = stmt
        .query_map(params![match_id as i64], |row| {
            Ok(Delivery {
                match_id: row.get::<_, u64>(0)?,
                inning: row.get::<_, u8>(1)?,
                over: row.get::<_, u16>(2)?,
                ball: row.get::<_, u16>(3)?,
                batting_team: row.get(4)?,
                bowling_team: row.get(5)?,
                batter: row.get(6)?,
                bowler: row.get(7)?,
                non_striker: row.get(8)?,
                batsman_runs: row.get::<_, u32>(9)?,
                extra_runs: row.get::<_, u32>(10)?,
                total_runs: row.get::<_, u32>(11)?,
                extras_type: row.get(12)?,
                is_wicket: row.get::<_, i64>(13)? != 0,
                player_dismissed: row.get(14)?,
                dismissal_kind: row.get(15)?,
                fielder: row.get(16)?,
            })
        })
        .context("query load deliveries")?;

    let mut out = Vec::new();
    for row in rows {
        out.push(row.context("decode delivery row")?);
    }
    Ok(out)
}

fn upsert_match(tx: &rusqlite::Transaction<'_>, m: &Match) -> Result<()> {
    tx.execute(
        r#"
        INSERT INTO matches (
            match_id, season, city, date, venue,
            team1, team2, toss_winner, toss_decision,
            winner, result, result_margin, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
        ON CONFLICT(match_id) DO UPDATE SET
            season = excluded.season,
            city = excluded.city,
            date = excluded.date,
            venue = excluded.venue,
            team1 = excluded.team1,
            team2 = excluded.team2,
            toss_winner = excluded.toss_winner,
            toss_decision = excluded.toss_decision,
            winner = excluded.winner,
            result = excluded.result,
            result_margin = excluded.result_margin,
            updated_at = excluded.updated_at
        "#,
        params![
            m.match_id as i64,
            m.season,
            m.city,
            m.date,
            m.venue,
            m.team1,
            m.team2,
            m.toss_winner,
            m.toss_decision,
            m.winner,
            m.result,
            m.result_margin,
            Utc::now().to_rfc3339(),
        ],
    )
    .context("upsert match")?;
    Ok(())
}

fn upsert_delivery(tx: &rusqlite::Transaction<'_>, d: &Delivery) -> Result<()> {
    tx.execute(
        r#"
        INSERT INTO deliveries (
            match_id, inning, over, ball,
            batting_team, bowling_team, batter, bowler, non_striker,
            batsman_runs, extra_runs, total_runs, extras_type,
            is_wicket, player_dismissed, dismissal_kind, fielder
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)
        ON CONFLICT(match_id, inning, over, ball) DO UPDATE SET
            batting_team = excluded.batting_team,
            bowling_team = excluded.bowling_team,
            batter = excluded.batter,
            bowler = excluded.bowler,
            non_striker = excluded.non_striker,
            batsman_runs = excluded.batsman_runs,
            extra_runs = excluded.extra_runs,
            total_runs = excluded.total_runs,
            extras_type = excluded.extras_type,
            is_wicket = excluded.is_wicket,
            player_dismissed = excluded.player_dismissed,
            dismissal_kind = excluded.dismissal_kind,
            fielder = excluded.fielder
        "#,
        params![
            d.match_id as i64,
            d.inning as i64,
            d.over as i64,
            d.ball as i64,
            d.batting_team,
            d.bowling_team,
            d.batter,
            d.bowler,
            d.non_striker,
            d.batsman_runs as i64,
            d.extra_runs as i64,
            d.total_runs as i64,
            d.extras_type,
            bool_to_i64(d.is_wicket),
            d.player_dismissed,
            d.dismissal_kind,
            d.fielder,
        ],
    )
    .context("upsert delivery")?;
    Ok(())
}

#[derive(Debug, Deserialize)]
struct MatchRow {
    #[serde(alias = "match_id")]
    id: u64,
    season: String,
    city: Option<String>,
    date: String,
    venue: String,
    team1: String,
    team2: String,
    toss_winner: String,
    toss_decision: String,
    winner: Option<String>,
    result: String,
    result_margin: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DeliveryRow {
    match_id: u64,
    inning: u8,
    over: u16,
    ball: u16,
    batting_team: String,
    bowling_team: String,
    batter: String,
    bowler: String,
    non_striker: String,
    batsman_runs: u32,
    extra_runs: u32,
    total_runs: u32,
    extras_type: Option<String>,
    is_wicket: u8,
    player_dismissed: Option<String>,
    dismissal_kind: Option<String>,
    fielder: Option<String>,
}

fn read_matches_csv(path: &Path) -> Result<(Vec<Match>, Vec<String>)> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("open matches csv {}", path.display()))?;

    let mut out = Vec::new();
    let mut errors = Vec::new();
    for (idx, record) in reader.deserialize::<MatchRow>().enumerate() {
        match record {
            Ok(row) => out.push(match_from_row(row)),
            Err(err) => {
                warn!(row = idx + 1, %err, "skipping malformed match row");
                errors.push(format!("matches row {}: {err}", idx + 1));
            }
        }
    }
    Ok((out, errors))
}

fn read_deliveries_csv(path: &Path) -> Result<(Vec<Delivery>, Vec<String>)> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("open deliveries csv {}", path.display()))?;

    let mut out = Vec::new();
    let mut errors = Vec::new();
    for (idx, record) in reader.deserialize::<DeliveryRow>().enumerate() {
        match record {
            Ok(row) => out.push(delivery_from_row(row)),
            Err(err) => {
                warn!(row = idx + 1, %err, "skipping malformed delivery row");
                errors.push(format!("deliveries row {}: {err}", idx + 1));
            }
        }
    }
    Ok((out, errors))
}

fn match_from_row(row: MatchRow) -> Match {
    Match {
        match_id: row.id,
        season: row.season,
        city: na_to_none(row.city),
        date: row.date,
        venue: row.venue,
        team1: row.team1,
        team2: row.team2,
        toss_winner: row.toss_winner,
        toss_decision: row.toss_decision,
        winner: na_to_none(row.winner),
        result: row.result,
        result_margin: na_to_none(row.result_margin).and_then(|s| s.parse::<f64>().ok()),
    }
}

fn delivery_from_row(row: DeliveryRow) -> Delivery {
    Delivery {
        match_id: row.match_id,
        inning: row.inning,
        over: row.over,
        ball: row.ball,
        batting_team: row.batting_team,
        bowling_team: row.bowling_team,
        batter: row.batter,
        bowler: row.bowler,
        non_striker: row.non_striker,
        batsman_runs: row.batsman_runs,
        extra_runs: row.extra_runs,
        total_runs: row.total_runs,
        extras_type: na_to_none(row.extras_type),
        is_wicket: row.is_wicket != 0,
        player_dismissed: na_to_none(row.player_dismissed),
        dismissal_kind: na_to_none(row.dismissal_kind),
        fielder: na_to_none(row.fielder),
    }
}

// The public dataset writes "NA" for absent values.
fn na_to_none(value: Option<String>) -> Option<String> {
    match value {
        Some(s) if s.trim().is_empty() || s.trim() == "NA" => None,
        other => other,
    }
}

fn bool_to_i64(v: bool) -> i64 {
    if v { 1 } else { 0 }
}
