use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

// ---------------------------------------------------------------------------
// Match
// ---------------------------------------------------------------------------

/// Figures for one played match, as supplied by the caller.
///
/// `overs_bowled` keeps the scorebook encoding: the fractional digit counts
/// balls within the over (4.5 = four overs and five balls), not tenths.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchInput {
    #[serde(deserialize_with = "date_only")]
    pub match_date: NaiveDate,
    pub opponent: String,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub runs_scored: u32,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub balls_faced: u32,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub wickets_taken: u32,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub overs_bowled: f64,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub runs_conceded: u32,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub catches: u32,
}

/// A persisted match with its store-assigned identity and timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchRecord {
    pub id: String,
    #[serde(flatten)]
    pub data: MatchInput,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MatchRecord {
    pub fn match_date(&self) -> NaiveDate {
        self.data.match_date
    }

    pub fn opponent(&self) -> &str {
        &self.data.opponent
    }
}

/// Accepts `YYYY-MM-DD`, RFC 3339, or a naive `YYYY-MM-DDTHH:MM:SS` and keeps
/// only the calendar date.
fn date_only<'de, D>(deserializer: D) -> std::result::Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_match_date(&raw).ok_or_else(|| {
        serde::de::Error::custom(format!("invalid match date '{raw}'"))
    })
}

fn null_as_zero<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

pub fn parse_match_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(d) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(d);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|dt| dt.date())
}

// ---------------------------------------------------------------------------
// Player stats
// ---------------------------------------------------------------------------

/// Career aggregate over every match of the subject. Always rebuilt whole.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlayerStats {
    pub total_matches: u64,
    pub total_runs: u64,
    pub total_balls_faced: u64,
    pub total_wickets: u64,
    /// Plain sum of scorebook overs; see `MatchInput::overs_bowled`.
    /// Left unrounded, so float noise shows through (1.1 + 2.2 is stored as
    /// 3.3000000000000003). Only the four derived rates are rounded to 2 dp.
    pub total_overs_bowled: f64,
    pub total_runs_conceded: u64,
    pub total_catches: u64,
    pub batting_average: f64,
    pub strike_rate: f64,
    pub bowling_average: f64,
    pub economy_rate: f64,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
