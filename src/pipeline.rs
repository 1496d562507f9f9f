use std::collections::BTreeSet;

use anyhow::{Context, Result, anyhow};
use chrono::Utc;
use rayon::prelude::*;
use rusqlite::Connection;
use tracing::{error, info, warn};

use crate::grouping::{GroupingTables, build_grouping};
use crate::player_stats::{self, PlayerAllTimeRecord};
use crate::records::MatchData;
use crate::repository::{EntityKind, Scope, StatsRepository};
use crate::roster::{Player, Roster, standardize_team_name};
use crate::store;
use crate::team_stats;

pub const RECENT_FORM_WINDOW: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageId {
    LoadSources,
    VenueStats,
    TeamAtVenueStats,
    TeamHeadToHead,
    PlayerAnalysis,
}

impl StageId {
    pub fn name(self) -> &'static str {
        match self {
            StageId::LoadSources => "load_sources",
            StageId::VenueStats => "venue_stats",
            StageId::TeamAtVenueStats => "team_at_venue_stats",
            StageId::TeamHeadToHead => "team_head_to_head",
            StageId::PlayerAnalysis => "player_analysis",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageOutcome {
    Succeeded,
    Skipped,
    Failed,
}

impl StageOutcome {
    pub fn label(self) -> &'static str {
        match self {
            StageOutcome::Succeeded => "ok",
            StageOutcome::Skipped => "skipped",
            StageOutcome::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone)]
pub struct StageReport {
    pub stage: StageId,
    pub outcome: StageOutcome,
    /// Records written (or sources loaded, for the load stage).
    pub records: usize,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub started_at: String,
    pub finished_at: String,
    pub matches: usize,
    pub tracked_players: usize,
    pub stages: Vec<StageReport>,
}

impl PipelineReport {
    pub fn failed_stages(&self) -> usize {
        self.stages
            .iter()
            .filter(|s| s.outcome == StageOutcome::Failed)
            .count()
    }
}

/// Run the full precompute pipeline: load sources, then venue, team, and
/// player statistics, persisting every record through the repository.
///
/// Only an empty store or an empty roster is fatal. Every later stage
/// records its own outcome; a failure there is logged and the remaining
/// stages still run, so a partially backfilled dataset produces partial
/// output instead of none.
pub fn run_pipeline(
    conn: &Connection,
    roster: &Roster,
    repo: &StatsRepository,
) -> Result<PipelineReport> {
    let started_at = Utc::now().to_rfc3339();

    let (match_data, load_report) = load_sources(conn, roster)?;
    info!(
        matches = match_data.len(),
        players = roster.players().len(),
        "sources loaded"
    );

    let mut stages = vec![load_report];
    stages.push(guard(StageId::VenueStats, venue_stats(&match_data, repo)));
    stages.push(guard(
        StageId::TeamAtVenueStats,
        team_at_venue_stats(&match_data, roster, repo),
    ));
    stages.push(guard(
        StageId::TeamHeadToHead,
        team_head_to_head(&match_data, roster, repo),
    ));
    stages.push(guard(
        StageId::PlayerAnalysis,
        player_analysis(&match_data, roster, repo),
    ));

    Ok(PipelineReport {
        started_at,
        finished_at: Utc::now().to_rfc3339(),
        matches: match_data.len(),
        tracked_players: roster.players().len(),
        stages,
    })
}

/// Collapse an unexpected stage error into a failed outcome instead of
/// aborting the run.
fn guard(stage: StageId, result: Result<StageReport>) -> StageReport {
    match result {
        Ok(report) => {
            info!(
                stage = stage.name(),
                outcome = report.outcome.label(),
                records = report.records,
                errors = report.errors.len(),
                "stage finished"
            );
            report
        }
        Err(err) => {
            error!(stage = stage.name(), %err, "stage failed");
            StageReport {
                stage,
                outcome: StageOutcome::Failed,
                records: 0,
                errors: vec![format!("{err:#}")],
            }
        }
    }
}

fn load_sources(conn: &Connection, roster: &Roster) -> Result<(Vec<MatchData>, StageReport)> {
    let matches = store::load_matches(conn).context("load matches from store")?;
    if matches.is_empty() {
        return Err(anyhow!("no matches in the store, nothing to compute"));
    }
    if roster.is_empty() {
        return Err(anyhow!("no tracked players, nothing to compute"));
    }

    let mut errors = Vec::new();
    let mut match_data = Vec::with_capacity(matches.len());
    for m in matches {
        let deliveries = match store::load_deliveries(conn, m.match_id) {
            Ok(deliveries) => {
                if deliveries.is_empty() {
                    warn!(match_id = m.match_id, "match has no delivery data");
                }
                deliveries
            }
            Err(err) => {
                warn!(match_id = m.match_id, %err, "delivery load failed, match kept with metadata only");
                errors.push(format!("match {}: {err:#}", m.match_id));
                Vec::new()
            }
        };
        match_data.push(MatchData { info: m, deliveries });
    }

    let records = match_data.len();
    Ok((
        match_data,
        StageReport {
            stage: StageId::LoadSources,
            outcome: StageOutcome::Succeeded,
            records,
            errors,
        },
    ))
}

fn venue_stats(match_data: &[MatchData], repo: &StatsRepository) -> Result<StageReport> {
    let venues: BTreeSet<&str> = match_data.iter().map(|m| m.info.venue.as_str()).collect();

    let mut records = 0usize;
    let mut errors = Vec::new();
    for venue in venues {
        let at_venue: Vec<&MatchData> = match_data
            .iter()
            .filter(|m| m.info.venue == venue)
            .collect();
        let record = team_stats::venue_record(venue, &at_venue);
        match repo.put(EntityKind::Venue, venue, Scope::AllTime, None, &record) {
            Ok(()) => records += 1,
            Err(err) => errors.push(format!("venue {venue}: {err:#}")),
        }
    }

    Ok(stage_report(StageId::VenueStats, records, errors))
}

fn team_at_venue_stats(
    match_data: &[MatchData],
    roster: &Roster,
    repo: &StatsRepository,
) -> Result<StageReport> {
    let mut records = 0usize;
    let mut errors = Vec::new();

    for team in roster.teams() {
        let team_matches: Vec<&MatchData> = match_data
            .iter()
            .filter(|m| involves_team(m, &team))
            .collect();
        if team_matches.is_empty() {
            warn!(%team, "no fixtures for team, at-venue stats skipped");
            continue;
        }

        let venues: BTreeSet<&str> = team_matches.iter().map(|m| m.info.venue.as_str()).collect();
        for venue in venues {
            let here: Vec<&MatchData> = team_matches
                .iter()
                .copied()
                .filter(|m| m.info.venue == venue)
                .collect();
            let record = team_stats::team_venue_record(&team, venue, &here);
            match repo.put(EntityKind::Team, &team, Scope::AtVenue, Some(venue), &record) {
                Ok(()) => records += 1,
                Err(err) => errors.push(format!("team {team} at {venue}: {err:#}")),
            }
        }
    }

    Ok(stage_report(StageId::TeamAtVenueStats, records, errors))
}

fn team_head_to_head(
    match_data: &[MatchData],
    roster: &Roster,
    repo: &StatsRepository,
) -> Result<StageReport> {
    let teams = roster.teams();

    let mut records = 0usize;
    let mut errors = Vec::new();
    for team in &teams {
        for opponent in &teams {
            if team == opponent {
                continue;
            }
            let between: Vec<&MatchData> = match_data
                .iter()
                .filter(|m| involves_team(m, team) && involves_team(m, opponent))
                .collect();
            if between.is_empty() {
                continue;
            }
            let record = team_stats::head_to_head_record(team, opponent, &between);
            match repo.put(EntityKind::Team, team, Scope::VsTeam, Some(opponent), &record) {
                Ok(()) => records += 1,
                Err(err) => errors.push(format!("{team} vs {opponent}: {err:#}")),
            }
        }
    }

    Ok(stage_report(StageId::TeamHeadToHead, records, errors))
}

fn player_analysis(
    match_data: &[MatchData],
    roster: &Roster,
    repo: &StatsRepository,
) -> Result<StageReport> {
    let grouping = build_grouping(match_data, roster);
    info!(
        players_with_deliveries = grouping.tracked_player_count(),
        "grouping pass complete"
    );

    // Each player's records depend only on that player's buckets, so the
    // calculation and the distinct-key writes fan out across the pool.
    let per_player: Vec<(usize, Vec<String>)> = roster
        .players()
        .par_iter()
        .map(|player| write_player_records(player, &grouping, repo))
        .collect();

    let mut records = 0usize;
    let mut errors = Vec::new();
    for (written, player_errors) in per_player {
        records += written;
        errors.extend(player_errors);
    }

    Ok(stage_report(StageId::PlayerAnalysis, records, errors))
}

fn write_player_records(
    player: &Player,
    grouping: &GroupingTables,
    repo: &StatsRepository,
) -> (usize, Vec<String>) {
    let name = player.delivery_name.as_str();
    let mut records = 0usize;
    let mut errors = Vec::new();

    let Some(all_time) = grouping.all_time.get(name) else {
        // Tracked player with no deliveries anywhere: nothing to persist.
        return (0, errors);
    };

    let record = PlayerAllTimeRecord {
        player: name.to_string(),
        display_name: player.display_name.clone(),
        team: player.team.clone(),
        batting: player_stats::batting_stats(all_time, name),
        bowling: player_stats::bowling_stats(all_time, name),
        recent_form: player_stats::recent_form(all_time, name, RECENT_FORM_WINDOW),
    };
    put_player(repo, name, Scope::AllTime, None, &record, &mut records, &mut errors);

    if let Some(by_venue) = grouping.at_venue.get(name) {
        for (venue, deliveries) in by_venue {
            let stats = player_stats::scope_stats(deliveries, name);
            put_player(repo, name, Scope::AtVenue, Some(venue), &stats, &mut records, &mut errors);
        }
    }
    if let Some(by_team) = grouping.vs_team.get(name) {
        for (team, deliveries) in by_team {
            let stats = player_stats::scope_stats(deliveries, name);
            put_player(repo, name, Scope::VsTeam, Some(team), &stats, &mut records, &mut errors);
        }
    }
    if let Some(by_player) = grouping.vs_player.get(name) {
        for (opponent, deliveries) in by_player {
            let stats = player_stats::scope_stats(deliveries, name);
            put_player(repo, name, Scope::VsPlayer, Some(opponent), &stats, &mut records, &mut errors);
        }
    }

    (records, errors)
}

fn put_player<T: serde::Serialize>(
    repo: &StatsRepository,
    name: &str,
    scope: Scope,
    scope_key: Option<&str>,
    stats: &T,
    records: &mut usize,
    errors: &mut Vec<String>,
) {
    match repo.put(EntityKind::Player, name, scope, scope_key, stats) {
        Ok(()) => *records += 1,
        Err(err) => errors.push(format!(
            "player {name} {} {}: {err:#}",
            scope.as_str(),
            scope_key.unwrap_or("-")
        )),
    }
}

fn involves_team(m: &MatchData, team: &str) -> bool {
    standardize_team_name(&m.info.team1) == team || standardize_team_name(&m.info.team2) == team
}

fn stage_report(stage: StageId, records: usize, errors: Vec<String>) -> StageReport {
    let outcome = if records == 0 && !errors.is_empty() {
        StageOutcome::Failed
    } else if records == 0 {
        StageOutcome::Skipped
    } else {
        StageOutcome::Succeeded
    };
    StageReport {
        stage,
        outcome,
        records,
        errors,
    }
}
