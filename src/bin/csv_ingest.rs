use std::path::PathBuf;

use anyhow::Result;

use crickstat::config::Config;
use crickstat::store;

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    init_tracing();

    let mut config = Config::from_env();
    if let Some(path) = parse_path_arg("--db") {
        config.db_path = path;
    }
    if let Some(path) = parse_path_arg("--matches") {
        config.matches_csv = path;
    }
    if let Some(path) = parse_path_arg("--deliveries") {
        config.deliveries_csv = path;
    }

    let mut conn = store::open_db(&config.db_path)?;
    let summary = store::ingest_csv(
        &mut conn,
        config.db_path.clone(),
        &config.matches_csv,
        &config.deliveries_csv,
    )?;

    println!("CSV ingest complete");
    println!("DB: {}", summary.db_path.display());
    println!("Matches upserted: {}", summary.matches_upserted);
    println!("Deliveries upserted: {}", summary.deliveries_upserted);
    if summary.rows_skipped > 0 {
        println!("Rows skipped: {}", summary.rows_skipped);
        for err in summary.errors.iter().take(6) {
            println!(" - {err}");
        }
    }

    Ok(())
}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn parse_path_arg(flag: &str) -> Option<PathBuf> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let prefix = format!("{flag}=");
    for (idx, arg) in args.iter().enumerate() {
        if let Some(path) = arg.strip_prefix(&prefix) {
            let trimmed = path.trim();
            if !trimmed.is_empty() {
                return Some(PathBuf::from(trimmed));
            }
        }
        if arg == flag {
            let Some(next) = args.get(idx + 1) else {
                continue;
            };
            if !next.trim().is_empty() {
                return Some(PathBuf::from(next));
            }
        }
    }
    None
}
