use chrono::NaiveDate;

use crate::types::MatchRecord;

/// Find a record that collides with `(date, opponent)`: same calendar day and
/// same opponent ignoring case. `exclude_id` is skipped so a record never
/// collides with itself on update.
pub fn find_duplicate<'a>(
    records: &'a [MatchRecord],
    date: NaiveDate,
    opponent: &str,
    exclude_id: Option<&str>,
) -> Option<&'a MatchRecord> {
    let wanted = opponent.to_lowercase();
    records.iter().find(|r| {
        exclude_id != Some(r.id.as_str())
            && r.match_date() == date
            && r.opponent().to_lowercase() == wanted
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MatchInput;
    use chrono::Utc;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, d).unwrap()
    }

    fn record(id: &str, date: NaiveDate, opponent: &str) -> MatchRecord {
        let now = Utc::now();
        MatchRecord {
            id: id.to_string(),
            data: MatchInput {
                match_date: date,
                opponent: opponent.to_string(),
                runs_scored: 0,
                balls_faced: 0,
                wickets_taken: 0,
                overs_bowled: 0.0,
                runs_conceded: 0,
                catches: 0,
            },
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn opponent_match_ignores_case() {
        let records = vec![record("1", day(10), "india")];
        let hit = find_duplicate(&records, day(10), "India", None);
        assert_eq!(hit.map(|r| r.id.as_str()), Some("1"));
        assert!(find_duplicate(&records, day(10), "INDIA", None).is_some());
    }

    #[test]
    fn different_day_or_opponent_is_not_duplicate() {
        let records = vec![record("1", day(10), "India")];
        assert!(find_duplicate(&records, day(11), "India", None).is_none());
        assert!(find_duplicate(&records, day(10), "Pakistan", None).is_none());
    }

    #[test]
    fn excluded_record_never_collides() {
        let records = vec![record("1", day(10), "India")];
        assert!(find_duplicate(&records, day(10), "India", Some("1")).is_none());
    }

    #[test]
    fn exclusion_does_not_hide_other_collisions() {
        let records = vec![record("1", day(10), "India"), record("2", day(10), "INDIA")];
        let hit = find_duplicate(&records, day(10), "india", Some("1"));
        assert_eq!(hit.map(|r| r.id.as_str()), Some("2"));
    }

    #[test]
    fn empty_set_has_no_duplicates() {
        assert!(find_duplicate(&[], day(10), "India", None).is_none());
    }
}
