use serde::{Deserialize, Serialize};

/// One fixture. `winner` is absent for no-result matches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Match {
    pub match_id: u64,
    pub season: String,
    pub city: Option<String>,
    pub date: String,
    pub venue: String,
    pub team1: String,
    pub team2: String,
    pub toss_winner: String,
    pub toss_decision: String,
    pub winner: Option<String>,
    pub result: String,
    pub result_margin: Option<f64>,
}

impl Match {
    pub fn involves(&self, team: &str) -> bool {
        self.team1 == team || self.team2 == team
    }

    pub fn other_team(&self, team: &str) -> Option<&str> {
        if self.team1 == team {
            Some(&self.team2)
        } else if self.team2 == team {
            Some(&self.team1)
        } else {
            None
        }
    }

    /// Side batting first as implied by the toss. Used as a fallback when a
    /// match has no delivery data to read the innings-1 batting team from.
    pub fn batting_first_from_toss(&self) -> Option<&str> {
        match self.toss_decision.as_str() {
            "bat" => Some(&self.toss_winner),
            "field" => self.other_team(&self.toss_winner),
            _ => None,
        }
    }
}

/// One bowled ball with its outcome. Immutable once recorded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Delivery {
    pub match_id: u64,
    pub inning: u8,
    pub over: u16,
    pub ball: u16,
    pub batting_team: String,
    pub bowling_team: String,
    pub batter: String,
    pub bowler: String,
    pub non_striker: String,
    pub batsman_runs: u32,
    pub extra_runs: u32,
    pub total_runs: u32,
    pub extras_type: Option<String>,
    pub is_wicket: bool,
    pub player_dismissed: Option<String>,
    pub dismissal_kind: Option<String>,
    pub fielder: Option<String>,
}

/// A match paired with its full delivery sequence, the unit the grouping
/// pass and the team summaries consume.
#[derive(Debug, Clone)]
pub struct MatchData {
    pub info: Match,
    pub deliveries: Vec<Delivery>,
}

impl MatchData {
    /// Innings-1 batting team when deliveries exist, toss-derived otherwise.
    pub fn batting_first(&self) -> Option<&str> {
        self.deliveries
            .iter()
            .find(|d| d.inning == 1)
            .map(|d| d.batting_team.as_str())
            .or_else(|| self.info.batting_first_from_toss())
    }
}
