use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::records::{Delivery, MatchData};
use crate::roster::standardize_team_name;

/// Match-level summary shared by the venue, team-at-venue, and head-to-head
/// keyings. One implementation; callers pick the match subset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchupSummary {
    pub total_matches: u32,
    pub batting_first_wins: u32,
    pub batting_second_wins: u32,
    pub no_results: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub win_percentage_batting_first: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_first_innings_runs: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_first_innings_wickets: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_second_innings_runs: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_second_innings_wickets: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamBattingTotals {
    pub matches: u32,
    pub runs: u64,
    pub wickets_lost: u32,
    pub fours: u32,
    pub sixes: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runs_per_match: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamBowlingTotals {
    pub matches: u32,
    pub runs_conceded: u64,
    pub wickets_taken: u32,
    /// Zero-run deliveries divided by six, as for player bowling stats.
    pub maidens: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runs_per_match: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VenueRecord {
    pub venue: String,
    pub summary: MatchupSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamVenueRecord {
    pub team: String,
    pub venue: String,
    pub summary: MatchupSummary,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batting: Option<TeamBattingTotals>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bowling: Option<TeamBowlingTotals>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeadToHeadRecord {
    pub team: String,
    pub opponent: String,
    pub matches_played: u32,
    pub wins: u32,
    pub losses: u32,
    pub no_results: u32,
    pub summary: MatchupSummary,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batting: Option<TeamBattingTotals>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bowling: Option<TeamBowlingTotals>,
}

pub fn matchup_summary(matches: &[&MatchData]) -> MatchupSummary {
    let mut batting_first_wins = 0u32;
    let mut batting_second_wins = 0u32;
    let mut no_results = 0u32;

    // (runs, wickets, matches with delivery data) per innings.
    let mut first = (0u64, 0u32, 0u32);
    let mut second = (0u64, 0u32, 0u32);

    for m in matches {
        match (&m.info.winner, m.batting_first()) {
            (None, _) => no_results += 1,
            (Some(winner), Some(batting_first)) => {
                if standardize_team_name(winner) == standardize_team_name(batting_first) {
                    batting_first_wins += 1;
                } else {
                    batting_second_wins += 1;
                }
            }
            // Winner known but neither deliveries nor toss resolve who
            // batted first: the win stays out of the split.
            (Some(_), None) => {}
        }

        for (inning, acc) in [(1u8, &mut first), (2u8, &mut second)] {
            let mut seen = false;
            for d in m.deliveries.iter().filter(|d| d.inning == inning) {
                acc.0 += u64::from(d.total_runs);
                if d.is_wicket {
                    acc.1 += 1;
                }
                seen = true;
            }
            if seen {
                acc.2 += 1;
            }
        }
    }

    let total_matches = matches.len() as u32;
    MatchupSummary {
        total_matches,
        batting_first_wins,
        batting_second_wins,
        no_results,
        win_percentage_batting_first: (total_matches > 0)
            .then(|| round2(f64::from(batting_first_wins) / f64::from(total_matches) * 100.0)),
        avg_first_innings_runs: innings_avg(first.0 as f64, first.2),
        avg_first_innings_wickets: innings_avg(f64::from(first.1), first.2),
        avg_second_innings_runs: innings_avg(second.0 as f64, second.2),
        avg_second_innings_wickets: innings_avg(f64::from(second.1), second.2),
    }
}

pub fn team_batting_totals(matches: &[&MatchData], team: &str) -> Option<TeamBattingTotals> {
    let mut match_ids = HashSet::new();
    let mut runs = 0u64;
    let mut wickets_lost = 0u32;
    let mut fours = 0u32;
    let mut sixes = 0u32;

    for d in team_deliveries(matches, team, |d| &d.batting_team) {
        match_ids.insert(d.match_id);
        runs += u64::from(d.total_runs);
        if d.is_wicket {
            wickets_lost += 1;
        }
        match d.batsman_runs {
            4 => fours += 1,
            6 => sixes += 1,
            _ => {}
        }
    }

    if match_ids.is_empty() {
        return None;
    }
    let matches_played = match_ids.len() as u32;
    Some(TeamBattingTotals {
        matches: matches_played,
        runs,
        wickets_lost,
        fours,
        sixes,
        runs_per_match: Some(runs as f64 / f64::from(matches_played)),
        average: (wickets_lost > 0).then(|| runs as f64 / f64::from(wickets_lost)),
    })
}

pub fn team_bowling_totals(matches: &[&MatchData], team: &str) -> Option<TeamBowlingTotals> {
    let mut match_ids = HashSet::new();
    let mut runs_conceded = 0u64;
    let mut wickets_taken = 0u32;
    let mut zero_run_balls = 0u64;

    for d in team_deliveries(matches, team, |d| &d.bowling_team) {
        match_ids.insert(d.match_id);
        runs_conceded += u64::from(d.total_runs);
        if d.is_wicket {
            wickets_taken += 1;
        }
        if d.total_runs == 0 {
            zero_run_balls += 1;
        }
    }

    if match_ids.is_empty() {
        return None;
    }
    let matches_played = match_ids.len() as u32;
    Some(TeamBowlingTotals {
        matches: matches_played,
        runs_conceded,
        wickets_taken,
        maidens: zero_run_balls as f64 / 6.0,
        runs_per_match: Some(runs_conceded as f64 / f64::from(matches_played)),
        average: (wickets_taken > 0).then(|| runs_conceded as f64 / f64::from(wickets_taken)),
    })
}

pub fn venue_record(venue: &str, matches: &[&MatchData]) -> VenueRecord {
    VenueRecord {
        venue: venue.to_string(),
        summary: matchup_summary(matches),
    }
}

/// `matches` must already be filtered to the team's fixtures at the venue.
pub fn team_venue_record(team: &str, venue: &str, matches: &[&MatchData]) -> TeamVenueRecord {
    TeamVenueRecord {
        team: team.to_string(),
        venue: venue.to_string(),
        summary: matchup_summary(matches),
        batting: team_batting_totals(matches, team),
        bowling: team_bowling_totals(matches, team),
    }
}

/// `matches` must already be filtered to fixtures between the two teams.
pub fn head_to_head_record(team: &str, opponent: &str, matches: &[&MatchData]) -> HeadToHeadRecord {
    let mut wins = 0u32;
    let mut losses = 0u32;
    let mut no_results = 0u32;
    for m in matches {
        match m.info.winner.as_deref().map(standardize_team_name) {
            Some(w) if w == team => wins += 1,
            Some(w) if w == opponent => losses += 1,
            Some(_) => {}
            None => no_results += 1,
        }
    }

    HeadToHeadRecord {
        team: team.to_string(),
        opponent: opponent.to_string(),
        matches_played: matches.len() as u32,
        wins,
        losses,
        no_results,
        summary: matchup_summary(matches),
        batting: team_batting_totals(matches, team),
        bowling: team_bowling_totals(matches, team),
    }
}

fn team_deliveries<'a>(
    matches: &'a [&'a MatchData],
    team: &'a str,
    side: impl Fn(&Delivery) -> &String + 'a,
) -> impl Iterator<Item = &'a Delivery> + 'a {
    matches
        .iter()
        .flat_map(|m| m.deliveries.iter())
        .filter(move |d| standardize_team_name(side(d)) == team)
}

fn innings_avg(sum: f64, matches: u32) -> Option<f64> {
    (matches > 0).then(|| round2(sum / f64::from(matches)))
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
