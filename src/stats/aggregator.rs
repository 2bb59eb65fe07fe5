use crate::types::{MatchRecord, PlayerStats};

/// Build the career snapshot from the full match set. Pure: the same set of
/// records gives the same snapshot whatever order they arrive in.
pub fn aggregate(records: &[MatchRecord]) -> PlayerStats {
    let mut stats = PlayerStats {
        total_matches: records.len() as u64,
        ..PlayerStats::default()
    };
    let mut innings_with_runs = 0u64;

    for record in records {
        let m = &record.data;
        stats.total_runs += u64::from(m.runs_scored);
        stats.total_balls_faced += u64::from(m.balls_faced);
        stats.total_wickets += u64::from(m.wickets_taken);
        stats.total_runs_conceded += u64::from(m.runs_conceded);
        stats.total_catches += u64::from(m.catches);
        if m.runs_scored > 0 {
            innings_with_runs += 1;
        }
    }

    // Scorebook overs are summed as plain decimals (3.4 + 3.4 = 6.8, not 7.2).
    // Economy rate is defined against this same total. The total itself is
    // not rounded.
    let mut overs: Vec<f64> = records.iter().map(|r| r.data.overs_bowled).collect();
    overs.sort_by(f64::total_cmp);
    stats.total_overs_bowled = overs.iter().sum();

    stats.batting_average = round2(ratio(stats.total_runs as f64, innings_with_runs as f64));
    stats.strike_rate = round2(ratio(stats.total_runs as f64, stats.total_balls_faced as f64) * 100.0);
    stats.bowling_average = round2(ratio(stats.total_runs_conceded as f64, stats.total_wickets as f64));
    stats.economy_rate = round2(ratio(stats.total_runs_conceded as f64, stats.total_overs_bowled));

    stats
}

/// `numerator / denominator`, or 0 when there is nothing to divide by.
fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator
    } else {
        0.0
    }
}

/// Two decimal places, halves away from zero.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
