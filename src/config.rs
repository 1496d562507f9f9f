use std::path::PathBuf;

/// Filesystem layout and runtime knobs, resolved from environment
/// variables with local-directory defaults. Binaries may override
/// individual paths from their command line.
#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite match/delivery store.
    pub db_path: PathBuf,
    /// Directory of per-team squad CSVs.
    pub squads_dir: PathBuf,
    /// Root of the persisted stats repository.
    pub stats_dir: PathBuf,
    /// Raw CSV inputs for ingest.
    pub matches_csv: PathBuf,
    pub deliveries_csv: PathBuf,
    /// Worker threads for the grouping/calculation pool. 0 = rayon default.
    pub threads: usize,
}

impl Config {
    pub fn from_env() -> Self {
        let data_dir = env_path("CRICKSTAT_DATA_DIR").unwrap_or_else(|| PathBuf::from("data"));
        Self {
            db_path: env_path("CRICKSTAT_DB")
                .unwrap_or_else(|| data_dir.join("crickstat.sqlite")),
            squads_dir: env_path("CRICKSTAT_SQUADS_DIR")
                .unwrap_or_else(|| data_dir.join("squads")),
            stats_dir: env_path("CRICKSTAT_OUT_DIR")
                .unwrap_or_else(|| PathBuf::from("processed_stats")),
            matches_csv: env_path("CRICKSTAT_MATCHES_CSV")
                .unwrap_or_else(|| data_dir.join("matches.csv")),
            deliveries_csv: env_path("CRICKSTAT_DELIVERIES_CSV")
                .unwrap_or_else(|| data_dir.join("deliveries.csv")),
            threads: std::env::var("CRICKSTAT_THREADS")
                .ok()
                .and_then(|v| v.parse::<usize>().ok())
                .unwrap_or(0),
        }
    }
}

fn env_path(key: &str) -> Option<PathBuf> {
    let value = std::env::var(key).ok()?;
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(PathBuf::from(trimmed))
}
