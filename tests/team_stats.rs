use crickstat::records::{Delivery, Match, MatchData};
use crickstat::team_stats::{
    head_to_head_record, matchup_summary, team_batting_totals, team_venue_record, venue_record,
};

fn fixture(
    match_id: u64,
    venue: &str,
    team1: &str,
    team2: &str,
    toss_winner: &str,
    toss_decision: &str,
    winner: Option<&str>,
) -> Match {
    Match {
        match_id,
        season: "2024".to_string(),
        city: None,
        date: "2024-04-01".to_string(),
        venue: venue.to_string(),
        team1: team1.to_string(),
        team2: team2.to_string(),
        toss_winner: toss_winner.to_string(),
        toss_decision: toss_decision.to_string(),
        winner: winner.map(|w| w.to_string()),
        result: if winner.is_some() { "runs" } else { "no result" }.to_string(),
        result_margin: winner.map(|_| 10.0),
    }
}

/// An innings of `sixes` legal balls all hit for six, so the innings total
/// is 6 * sixes.
fn innings(match_id: u64, inning: u8, batting: &str, bowling: &str, sixes: u16) -> Vec<Delivery> {
    (1..=sixes)
        .map(|ball| Delivery {
            match_id,
            inning,
            over: ball / 6,
            ball: ball % 6 + 1,
            batting_team: batting.to_string(),
            bowling_team: bowling.to_string(),
            batter: "A Rao".to_string(),
            bowler: "M Joshi".to_string(),
            non_striker: "S Iyer".to_string(),
            batsman_runs: 6,
            extra_runs: 0,
            total_runs: 6,
            extras_type: None,
            is_wicket: false,
            player_dismissed: None,
            dismissal_kind: None,
            fielder: None,
        })
        .collect()
}

#[test]
fn venue_split_counts_batting_first_and_second_wins() {
    // Match A: X bats first, scores 180, and defends it.
    let mut a_deliveries = innings(1, 1, "Team X", "Team Y", 30);
    a_deliveries.extend(innings(1, 2, "Team Y", "Team X", 20));
    let a = MatchData {
        info: fixture(1, "V", "Team X", "Team Y", "Team X", "bat", Some("Team X")),
        deliveries: a_deliveries,
    };

    // Match B: Y bats first with 150 and the chasing side wins.
    let mut b_deliveries = innings(2, 1, "Team Y", "Team X", 25);
    b_deliveries.extend(innings(2, 2, "Team X", "Team Y", 26));
    let b = MatchData {
        info: fixture(2, "V", "Team Y", "Team X", "Team Y", "bat", Some("Team X")),
        deliveries: b_deliveries,
    };

    let record = venue_record("V", &[&a, &b]);
    assert_eq!(record.venue, "V");
    let summary = record.summary;
    assert_eq!(summary.total_matches, 2);
    assert_eq!(summary.batting_first_wins, 1);
    assert_eq!(summary.batting_second_wins, 1);
    assert_eq!(summary.win_percentage_batting_first, Some(50.0));
    assert_eq!(summary.avg_first_innings_runs, Some(165.0));
    assert_eq!(summary.avg_second_innings_runs, Some(138.0));
    assert_eq!(summary.avg_first_innings_wickets, Some(0.0));
}

#[test]
fn no_result_matches_stay_out_of_the_win_split() {
    let played = MatchData {
        info: fixture(1, "V", "Team X", "Team Y", "Team X", "bat", Some("Team X")),
        deliveries: innings(1, 1, "Team X", "Team Y", 10),
    };
    let washed_out = MatchData {
        info: fixture(2, "V", "Team X", "Team Y", "Team Y", "field", None),
        deliveries: Vec::new(),
    };

    let summary = matchup_summary(&[&played, &washed_out]);
    assert_eq!(summary.total_matches, 2);
    assert_eq!(summary.batting_first_wins, 1);
    assert_eq!(summary.batting_second_wins, 0);
    assert_eq!(summary.no_results, 1);
    assert_eq!(summary.win_percentage_batting_first, Some(50.0));
    // Only the played match contributes innings data.
    assert_eq!(summary.avg_first_innings_runs, Some(60.0));
    assert_eq!(summary.avg_second_innings_runs, None);
}

#[test]
fn toss_resolves_batting_first_when_deliveries_are_missing() {
    // Toss won by Y electing to field, so X batted first and won.
    let m = MatchData {
        info: fixture(1, "V", "Team X", "Team Y", "Team Y", "field", Some("Team X")),
        deliveries: Vec::new(),
    };

    let summary = matchup_summary(&[&m]);
    assert_eq!(summary.batting_first_wins, 1);
    assert_eq!(summary.batting_second_wins, 0);
}

#[test]
fn head_to_head_counts_wins_per_side() {
    let mk = |id, winner| MatchData {
        info: fixture(id, "V", "Team X", "Team Y", "Team X", "bat", Some(winner)),
        deliveries: Vec::new(),
    };
    let matches = [mk(1, "Team X"), mk(2, "Team Y"), mk(3, "Team X")];
    let refs: Vec<&MatchData> = matches.iter().collect();

    let record = head_to_head_record("Team X", "Team Y", &refs);
    assert_eq!(record.matches_played, 3);
    assert_eq!(record.wins, 2);
    assert_eq!(record.losses, 1);
    assert_eq!(record.no_results, 0);

    let mirrored = head_to_head_record("Team Y", "Team X", &refs);
    assert_eq!(mirrored.wins, 1);
    assert_eq!(mirrored.losses, 2);
}

#[test]
fn head_to_head_standardizes_historical_names() {
    let m = MatchData {
        info: fixture(
            1,
            "V",
            "Kings XI Punjab",
            "Gujarat Titans",
            "Kings XI Punjab",
            "bat",
            Some("Kings XI Punjab"),
        ),
        deliveries: Vec::new(),
    };

    let record = head_to_head_record("Punjab Kings", "Gujarat Titans", &[&m]);
    assert_eq!(record.wins, 1);
    assert_eq!(record.losses, 0);
}

#[test]
fn team_totals_split_batting_and_bowling_sides() {
    let mut deliveries = innings(1, 1, "Team X", "Team Y", 12);
    deliveries.extend(innings(1, 2, "Team Y", "Team X", 7));
    // One wicket while X batted.
    deliveries[3].is_wicket = true;
    deliveries[3].player_dismissed = Some("A Rao".to_string());
    let m = MatchData {
        info: fixture(1, "V", "Team X", "Team Y", "Team X", "bat", Some("Team X")),
        deliveries,
    };

    let batting = team_batting_totals(&[&m], "Team X").expect("batting totals");
    assert_eq!(batting.matches, 1);
    assert_eq!(batting.runs, 72);
    assert_eq!(batting.wickets_lost, 1);
    assert_eq!(batting.sixes, 12);
    assert_eq!(batting.average, Some(72.0));
    assert_eq!(batting.runs_per_match, Some(72.0));

    let record = team_venue_record("Team X", "V", &[&m]);
    let bowling = record.bowling.expect("bowling totals");
    assert_eq!(bowling.runs_conceded, 42);
    assert_eq!(bowling.wickets_taken, 0);
    assert_eq!(bowling.average, None);

    assert!(team_batting_totals(&[&m], "Team Z").is_none());
}
