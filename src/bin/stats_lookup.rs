use anyhow::{Result, anyhow};

use crickstat::config::Config;
use crickstat::repository::{EntityKind, Scope, StatsRepository};

/// Read-side probe for the stats repository, the same interface the query
/// layer consumes: `stats_lookup <kind> <entity> <scope> [scope_key]`.
fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let (positional, out_dir): (Vec<&String>, _) = {
        let mut out = None;
        let mut positional = Vec::new();
        for arg in &args {
            if let Some(path) = arg.strip_prefix("--out=") {
                out = Some(path.trim().to_string());
            } else {
                positional.push(arg);
            }
        }
        (positional, out)
    };

    let [kind, entity, scope, rest @ ..] = positional.as_slice() else {
        return Err(anyhow!(
            "usage: stats_lookup <player|team|venue> <entity> <all_time|at_venue|vs_team|vs_player> [scope_key] [--out=DIR]"
        ));
    };
    let scope_key = rest.first().map(|s| s.as_str());

    let kind = parse_kind(kind)?;
    let scope = parse_scope(scope)?;

    let config = Config::from_env();
    let root = out_dir.unwrap_or_else(|| config.stats_dir.display().to_string());
    let repo = StatsRepository::new(root);

    match repo.get::<serde_json::Value>(kind, entity, scope, scope_key)? {
        Some(record) => println!("{}", serde_json::to_string_pretty(&record)?),
        None => println!("no record for that key"),
    }
    Ok(())
}

fn parse_kind(raw: &str) -> Result<EntityKind> {
    match raw {
        "player" => Ok(EntityKind::Player),
        "team" => Ok(EntityKind::Team),
        "venue" => Ok(EntityKind::Venue),
        other => Err(anyhow!("unknown entity kind '{other}'")),
    }
}

fn parse_scope(raw: &str) -> Result<Scope> {
    match raw {
        "all_time" => Ok(Scope::AllTime),
        "at_venue" => Ok(Scope::AtVenue),
        "vs_team" => Ok(Scope::VsTeam),
        "vs_player" => Ok(Scope::VsPlayer),
        other => Err(anyhow!("unknown scope '{other}'")),
    }
}
