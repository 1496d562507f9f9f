use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::records::Delivery;

/// Derived ratios are `None` when their denominator is zero and are omitted
/// from the serialized record, so "no data" never reads as a zero value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattingStats {
    pub matches: u32,
    pub runs: u64,
    pub balls: u64,
    pub fours: u32,
    pub sixes: u32,
    pub dots: u32,
    pub dismissals: u32,
    pub highest: u32,
    pub fifties: u32,
    pub hundreds: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strike_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BowlingStats {
    pub matches: u32,
    pub balls: u64,
    pub runs: u64,
    pub wickets: u32,
    /// Zero-run deliveries divided by six. An approximation inherited from
    /// the source data pipeline, not true consecutive-over maiden detection.
    pub maidens: f64,
    /// "wickets/runs" of the best single-match figure: most wickets, ties
    /// broken by fewest runs conceded. "0/0" when no qualifying match.
    pub best_bowling: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overs: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub economy: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strike_rate: Option<f64>,
}

/// Batting and bowling stats for one (player, scope, scope key) bucket. A
/// side is absent entirely when the player never acted in that role here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerScopeStats {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batting: Option<BattingStats>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bowling: Option<BowlingStats>,
}

impl PlayerScopeStats {
    pub fn is_empty(&self) -> bool {
        self.batting.is_none() && self.bowling.is_none()
    }
}

/// The all-time payload carries identity alongside the stats so the record
/// is readable on its own, plus the recent-form supplement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerAllTimeRecord {
    pub player: String,
    pub display_name: String,
    pub team: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batting: Option<BattingStats>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bowling: Option<BowlingStats>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recent_form: Option<RecentForm>,
}

/// Stats restricted to the player's most recent matches (highest match ids,
/// which track chronology in the source dataset).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentForm {
    pub matches: Vec<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batting: Option<BattingStats>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bowling: Option<BowlingStats>,
}

pub fn scope_stats(deliveries: &[Delivery], player: &str) -> PlayerScopeStats {
    PlayerScopeStats {
        batting: batting_stats(deliveries, player),
        bowling: bowling_stats(deliveries, player),
    }
}

pub fn batting_stats(deliveries: &[Delivery], player: &str) -> Option<BattingStats> {
    let batting: Vec<&Delivery> = deliveries.iter().filter(|d| d.batter == player).collect();
    if batting.is_empty() {
        return None;
    }

    let mut match_scores: HashMap<u64, u64> = HashMap::new();
    let mut runs = 0u64;
    let mut fours = 0u32;
    let mut sixes = 0u32;
    let mut dots = 0u32;
    let mut dismissals = 0u32;

    for d in &batting {
        runs += u64::from(d.batsman_runs);
        *match_scores.entry(d.match_id).or_default() += u64::from(d.batsman_runs);
        match d.batsman_runs {
            0 => dots += 1,
            4 => fours += 1,
            6 => sixes += 1,
            _ => {}
        }
        if d.player_dismissed.as_deref() == Some(player) {
            dismissals += 1;
        }
    }

    let balls = batting.len() as u64;
    let highest = match_scores.values().copied().max().unwrap_or(0) as u32;
    let fifties = match_scores
        .values()
        .filter(|&&s| (50..100).contains(&s))
        .count() as u32;
    let hundreds = match_scores.values().filter(|&&s| s >= 100).count() as u32;

    Some(BattingStats {
        matches: match_scores.len() as u32,
        runs,
        balls,
        fours,
        sixes,
        dots,
        dismissals,
        highest,
        fifties,
        hundreds,
        strike_rate: (balls > 0).then(|| (runs as f64 * 100.0) / balls as f64),
        average: (dismissals > 0).then(|| runs as f64 / f64::from(dismissals)),
    })
}

pub fn bowling_stats(deliveries: &[Delivery], player: &str) -> Option<BowlingStats> {
    let bowling: Vec<&Delivery> = deliveries.iter().filter(|d| d.bowler == player).collect();
    if bowling.is_empty() {
        return None;
    }

    let mut match_figures: HashMap<u64, (u32, u64)> = HashMap::new();
    let mut runs = 0u64;
    let mut wickets = 0u32;
    let mut zero_run_balls = 0u64;

    for d in &bowling {
        runs += u64::from(d.total_runs);
        let figure = match_figures.entry(d.match_id).or_default();
        figure.1 += u64::from(d.total_runs);
        if d.is_wicket {
            wickets += 1;
            figure.0 += 1;
        }
        if d.total_runs == 0 {
            zero_run_balls += 1;
        }
    }

    let balls = bowling.len() as u64;
    let overs = (balls > 0).then(|| balls as f64 / 6.0);

    Some(BowlingStats {
        matches: match_figures.len() as u32,
        balls,
        runs,
        wickets,
        maidens: zero_run_balls as f64 / 6.0,
        best_bowling: best_bowling_figure(&match_figures),
        overs,
        economy: overs.map(|o| runs as f64 / o),
        average: (wickets > 0).then(|| runs as f64 / f64::from(wickets)),
        strike_rate: (wickets > 0).then(|| balls as f64 / f64::from(wickets)),
    })
}

fn best_bowling_figure(match_figures: &HashMap<u64, (u32, u64)>) -> String {
    let best = match_figures
        .values()
        .copied()
        .max_by(|a, b| a.0.cmp(&b.0).then(b.1.cmp(&a.1)));
    match best {
        Some((wickets, runs)) => format!("{wickets}/{runs}"),
        None => "0/0".to_string(),
    }
}

/// Batting/bowling stats over the player's last `window` matches.
pub fn recent_form(deliveries: &[Delivery], player: &str, window: usize) -> Option<RecentForm> {
    let mut match_ids: Vec<u64> = deliveries
        .iter()
        .filter(|d| d.batter == player || d.bowler == player)
        .map(|d| d.match_id)
        .collect();
    match_ids.sort_unstable();
    match_ids.dedup();
    if match_ids.is_empty() {
        return None;
    }

    let keep = match_ids.split_off(match_ids.len().saturating_sub(window));
    let recent: Vec<Delivery> = deliveries
        .iter()
        .filter(|d| keep.binary_search(&d.match_id).is_ok())
        .cloned()
        .collect();

    Some(RecentForm {
        matches: keep,
        batting: batting_stats(&recent, player),
        bowling: bowling_stats(&recent, player),
    })
}

#[cfg(test)]
mod tests {
    use super::best_bowling_figure;
    use std::collections::HashMap;

    #[test]
    fn best_bowling_prefers_wickets_then_fewest_runs() {
        let figures = HashMap::from([(1, (3, 20)), (2, (3, 15)), (3, (2, 5))]);
        assert_eq!(best_bowling_figure(&figures), "3/15");
    }

    #[test]
    fn best_bowling_sentinel_when_empty() {
        assert_eq!(best_bowling_figure(&HashMap::new()), "0/0");
    }
}
