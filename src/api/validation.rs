use chrono::NaiveDate;

use crate::error::{AppError, Result};
use crate::types::MatchInput;

/// Field checks applied before a match reaches the service.
pub fn validate_match(input: &MatchInput, today: NaiveDate) -> Result<()> {
    if input.opponent.trim().is_empty() {
        return Err(AppError::Validation("opponent must not be empty".to_string()));
    }
    if input.match_date > today {
        return Err(AppError::Validation(format!(
            "match date {} is in the future",
            input.match_date
        )));
    }
    validate_overs(input.overs_bowled)
}

/// Scorebook overs: whole overs plus a single ball digit 0..=5.
fn validate_overs(overs: f64) -> Result<()> {
    if !overs.is_finite() || overs < 0.0 {
        return Err(AppError::Validation(format!("overs bowled must be a non-negative number, got {overs}")));
    }
    let tenths = overs * 10.0;
    if (tenths - tenths.round()).abs() > 1e-6 {
        return Err(AppError::Validation(format!(
            "overs bowled takes at most one decimal digit, got {overs}"
        )));
    }
    let balls = (tenths.round() as u64) % 10;
    if balls > 5 {
        return Err(AppError::Validation(format!(
            "overs bowled {overs} has {balls} balls after the point, max is 5"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
    }

    fn input(opponent: &str, date: NaiveDate, overs: f64) -> MatchInput {
        MatchInput {
            match_date: date,
            opponent: opponent.to_string(),
            runs_scored: 0,
            balls_faced: 0,
            wickets_taken: 0,
            overs_bowled: overs,
            runs_conceded: 0,
            catches: 0,
        }
    }

    #[test]
    fn accepts_regular_match() {
        assert!(validate_match(&input("India", today(), 4.5), today()).is_ok());
        assert!(validate_match(&input("India", today(), 10.0), today()).is_ok());
        assert!(validate_match(&input("India", today(), 0.0), today()).is_ok());
    }

    #[test]
    fn rejects_blank_opponent() {
        let err = validate_match(&input("   ", today(), 0.0), today()).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn rejects_future_date() {
        let tomorrow = today().succ_opt().unwrap();
        let err = validate_match(&input("India", tomorrow, 0.0), today()).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn rejects_impossible_overs() {
        for overs in [4.6, 3.9, 2.25, -1.0, f64::NAN, f64::INFINITY] {
            assert!(
                validate_match(&input("India", today(), overs), today()).is_err(),
                "overs={overs} should be rejected"
            );
        }
    }
}
