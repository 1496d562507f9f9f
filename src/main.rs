use std::path::PathBuf;

use anyhow::Result;

use crickstat::config::Config;
use crickstat::pipeline;
use crickstat::repository::StatsRepository;
use crickstat::roster::Roster;
use crickstat::store;

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    init_tracing();

    let mut config = Config::from_env();
    if let Some(path) = parse_path_arg("--db") {
        config.db_path = path;
    }
    if let Some(path) = parse_path_arg("--squads") {
        config.squads_dir = path;
    }
    if let Some(path) = parse_path_arg("--out") {
        config.stats_dir = path;
    }

    if config.threads > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(config.threads)
            .build_global()
            .ok();
    }

    let conn = store::open_db(&config.db_path)?;
    let roster = Roster::load(&config.squads_dir)?;
    let repo = StatsRepository::new(&config.stats_dir);

    let report = pipeline::run_pipeline(&conn, &roster, &repo)?;

    println!("Precompute pipeline complete");
    println!("Store: {}", config.db_path.display());
    println!("Stats: {}", config.stats_dir.display());
    println!(
        "Matches: {}  Tracked players: {}",
        report.matches, report.tracked_players
    );
    for stage in &report.stages {
        println!(
            "stage {}: {} records={}",
            stage.stage.name(),
            stage.outcome.label(),
            stage.records
        );
        if !stage.errors.is_empty() {
            println!("  errors: {}", stage.errors.len());
            for err in stage.errors.iter().take(6) {
                println!("   - {err}");
            }
        }
    }
    if report.failed_stages() > 0 {
        println!(
            "{} stage(s) failed; re-run after fixing the inputs above",
            report.failed_stages()
        );
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
