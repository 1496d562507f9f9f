use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Franchise renames over the dataset's history. Keys are the historical
/// names as they appear in older seasons' match and delivery rows.
static TEAM_ALIASES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("Delhi Daredevils", "Delhi Capitals"),
        ("Kings XI Punjab", "Punjab Kings"),
        ("Royal Challengers Bangalore", "Royal Challengers Bengaluru"),
        ("Rising Pune Supergiant", "Rising Pune Supergiants"),
    ])
});

pub fn standardize_team_name(raw: &str) -> &str {
    let trimmed = raw.trim();
    TEAM_ALIASES.get(trimmed).copied().unwrap_or(trimmed)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerRole {
    Batsman,
    Bowler,
    AllRounder,
    WicketKeeper,
}

impl PlayerRole {
    fn from_text(raw: &str) -> Option<Self> {
        let s = raw.to_lowercase();
        if s.contains("keeper") {
            return Some(PlayerRole::WicketKeeper);
        }
        if s.contains("allrounder") || s.contains("all-rounder") || s.contains("all rounder") {
            return Some(PlayerRole::AllRounder);
        }
        if s.contains("bowler") {
            return Some(PlayerRole::Bowler);
        }
        if s.contains("bat") {
            return Some(PlayerRole::Batsman);
        }
        None
    }
}

/// One tracked player. Statistics are always matched on `delivery_name`,
/// the name the ball-by-ball feed uses, never on `display_name`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub display_name: String,
    pub delivery_name: String,
    pub team: String,
    pub role: PlayerRole,
    pub batting_style: Option<String>,
    pub bowling_style: Option<String>,
    pub overseas: bool,
}

#[derive(Debug, Deserialize)]
struct SquadRow {
    #[serde(rename = "Player Name")]
    player_name: String,
    #[serde(rename = "Delivery Name")]
    delivery_name: String,
    #[serde(rename = "Role")]
    role: String,
    #[serde(rename = "Batting Style")]
    batting_style: Option<String>,
    #[serde(rename = "Bowling Style")]
    bowling_style: Option<String>,
    #[serde(rename = "Team")]
    team: String,
    #[serde(rename = "Is Overseas")]
    is_overseas: Option<String>,
}

/// The current set of tracked players across all squad files, with a
/// delivery-name to team index for the grouping pass.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    players: Vec<Player>,
    team_by_delivery_name: HashMap<String, String>,
}

impl Roster {
    /// Load every `*.csv` squad file under `squads_dir` (one file per team).
    pub fn load(squads_dir: &Path) -> Result<Roster> {
        let entries = std::fs::read_dir(squads_dir)
            .with_context(|| format!("read squads dir {}", squads_dir.display()))?;

        let mut csv_paths: Vec<_> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.extension().is_some_and(|ext| ext == "csv"))
            .collect();
        csv_paths.sort();

        if csv_paths.is_empty() {
            return Err(anyhow!(
                "no squad csv files under {}",
                squads_dir.display()
            ));
        }

        let mut roster = Roster::default();
        for path in &csv_paths {
            roster
                .load_squad_file(path)
                .with_context(|| format!("load squad file {}", path.display()))?;
        }
        info!(
            players = roster.players.len(),
            files = csv_paths.len(),
            "roster loaded"
        );
        Ok(roster)
    }

    pub fn from_players(players: Vec<Player>) -> Roster {
        let mut roster = Roster::default();
        for player in players {
            roster.push_player(player);
        }
        roster
    }

    fn load_squad_file(&mut self, path: &Path) -> Result<()> {
        let mut reader = csv::Reader::from_path(path)?;
        for record in reader.deserialize::<SquadRow>() {
            let row = record?;
            let role = PlayerRole::from_text(&row.role).unwrap_or_else(|| {
                warn!(player = %row.player_name, role = %row.role, "unrecognized role, treating as all-rounder");
                PlayerRole::AllRounder
            });
            self.push_player(Player {
                display_name: row.player_name,
                delivery_name: row.delivery_name,
                team: standardize_team_name(&row.team).to_string(),
                role,
                batting_style: row.batting_style.filter(|s| !s.trim().is_empty()),
                bowling_style: row.bowling_style.filter(|s| !s.trim().is_empty()),
                overseas: row
                    .is_overseas
                    .as_deref()
                    .is_some_and(|s| s.eq_ignore_ascii_case("yes")),
            });
        }
        Ok(())
    }

    fn push_player(&mut self, player: Player) {
        if let Some(existing) = self.team_by_delivery_name.get(&player.delivery_name) {
            if existing != &player.team {
                warn!(
                    player = %player.delivery_name,
                    kept = %existing,
                    dropped = %player.team,
                    "duplicate squad entry for delivery name, keeping first"
                );
            }
            return;
        }
        self.team_by_delivery_name
            .insert(player.delivery_name.clone(), player.team.clone());
        self.players.push(player);
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn is_tracked(&self, delivery_name: &str) -> bool {
        self.team_by_delivery_name.contains_key(delivery_name)
    }

    /// Team of a tracked player, by delivery-log name.
    pub fn team_of(&self, delivery_name: &str) -> Option<&str> {
        self.team_by_delivery_name
            .get(delivery_name)
            .map(|s| s.as_str())
    }

    /// Distinct team names across the roster, sorted.
    pub fn teams(&self) -> Vec<String> {
        let mut teams: Vec<String> = self
            .players
            .iter()
            .map(|p| p.team.clone())
            .collect::<std::collections::HashSet<_>>()
            .into_iter()
            .collect();
        teams.sort();
        teams
    }
}
