use std::collections::HashMap;

use rayon::prelude::*;
use tracing::warn;

use crate::records::{Delivery, MatchData};
use crate::roster::{Roster, standardize_team_name};

pub type Buckets = HashMap<String, Vec<Delivery>>;
pub type KeyedBuckets = HashMap<String, HashMap<String, Vec<Delivery>>>;

/// The four grouping dimensions, each mapping a tracked player (by delivery
/// name) to the deliveries relevant under that scope. Built once per run and
/// owned exclusively by the engine; calculators only ever see borrowed
/// slices.
#[derive(Debug, Default)]
pub struct GroupingTables {
    pub all_time: Buckets,
    pub at_venue: KeyedBuckets,
    pub vs_team: KeyedBuckets,
    pub vs_player: KeyedBuckets,
}

// Shard size for the parallel pass. Bucket contents are merged by
// concatenation, so shard boundaries never change any computed statistic.
const SHARD_MATCHES: usize = 32;

/// Single pass over every delivery of every match, routing each ball into
/// the batter-side and bowler-side buckets independently. Sharded by match
/// across rayon workers; shards build private tables that are merged by
/// map-union with list-append.
pub fn build_grouping(matches: &[MatchData], roster: &Roster) -> GroupingTables {
    matches
        .par_chunks(SHARD_MATCHES)
        .map(|shard| group_shard(shard, roster))
        .reduce(GroupingTables::default, GroupingTables::merged)
}

fn group_shard(matches: &[MatchData], roster: &Roster) -> GroupingTables {
    let mut tables = GroupingTables::default();
    for m in matches {
        let venue = m.info.venue.as_str();
        for d in &m.deliveries {
            if d.match_id != m.info.match_id {
                warn!(
                    expected = m.info.match_id,
                    found = d.match_id,
                    "delivery references a different match, excluded from grouping"
                );
                continue;
            }
            // Batter side: opponent team is the bowling side, opposing
            // player is the bowler.
            tables.route(roster, &d.batter, &d.bowling_team, &d.bowler, venue, d);
            // Bowler side, symmetrically.
            tables.route(roster, &d.bowler, &d.batting_team, &d.batter, venue, d);
        }
    }
    tables
}

impl GroupingTables {
    fn route(
        &mut self,
        roster: &Roster,
        player: &str,
        opponent_team: &str,
        opponent_player: &str,
        venue: &str,
        delivery: &Delivery,
    ) {
        if !roster.is_tracked(player) {
            return;
        }

        self.all_time
            .entry(player.to_string())
            .or_default()
            .push(delivery.clone());

        self.at_venue
            .entry(player.to_string())
            .or_default()
            .entry(venue.to_string())
            .or_default()
            .push(delivery.clone());

        // The opponent dimensions need the player's own team; when it cannot
        // be resolved the delivery is excluded from both, never the run.
        let Some(own_team) = roster.team_of(player) else {
            return;
        };

        let opponent_team = standardize_team_name(opponent_team);
        if opponent_team != own_team {
            self.vs_team
                .entry(player.to_string())
                .or_default()
                .entry(opponent_team.to_string())
                .or_default()
                .push(delivery.clone());
        }

        if roster.is_tracked(opponent_player) {
            self.vs_player
                .entry(player.to_string())
                .or_default()
                .entry(opponent_player.to_string())
                .or_default()
                .push(delivery.clone());
        }
    }

    fn merged(mut self, other: GroupingTables) -> GroupingTables {
        merge_buckets(&mut self.all_time, other.all_time);
        merge_keyed(&mut self.at_venue, other.at_venue);
        merge_keyed(&mut self.vs_team, other.vs_team);
        merge_keyed(&mut self.vs_player, other.vs_player);
        self
    }

    pub fn tracked_player_count(&self) -> usize {
        self.all_time.len()
    }
}

fn merge_buckets(into: &mut Buckets, from: Buckets) {
    for (player, mut deliveries) in from {
        into.entry(player).or_default().append(&mut deliveries);
    }
}

fn merge_keyed(into: &mut KeyedBuckets, from: KeyedBuckets) {
    for (player, inner) in from {
        let slot = into.entry(player).or_default();
        for (key, mut deliveries) in inner {
            slot.entry(key).or_default().append(&mut deliveries);
        }
    }
}
