//! Daily sign-in streaks
//!
//! Sign-in days are UTC calendar days stored as `YYYY-MM-DD`. A streak stays
//! alive until a full day is missed: signing in yesterday but not yet today
//! still counts.

use chrono::{DateTime, Duration, NaiveDate, Utc};

/// Storage format for sign-in days.
pub const DAY_FORMAT: &str = "%Y-%m-%d";

/// Storage format for timestamps, matching SQLite's `datetime('now')`.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn sqlite_timestamp(at: DateTime<Utc>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// Today's UTC date.
pub fn today_utc() -> NaiveDate {
    Utc::now().date_naive()
}

pub fn day_string(day: NaiveDate) -> String {
    day.format(DAY_FORMAT).to_string()
}

pub fn parse_day(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), DAY_FORMAT).ok()
}

/// Length of the run of consecutive days ending today or yesterday.
pub fn current_streak(days: &[NaiveDate], today: NaiveDate) -> u32 {
    let mut sorted = days.to_vec();
    sorted.sort_unstable_by(|a, b| b.cmp(a));
    sorted.dedup();

    let yesterday = today - Duration::days(1);
    let mut expected = match sorted.iter().find(|d| **d <= today) {
        Some(d) if *d == today || *d == yesterday => *d,
        _ => return 0,
    };

    let mut count = 0;
    for day in sorted.iter().filter(|d| **d <= today) {
        if *day == expected {
            count += 1;
            expected -= Duration::days(1);
        } else if *day < expected {
            break;
        }
    }
    count
}

/// Longest run of consecutive days ever recorded.
pub fn best_streak(days: &[NaiveDate]) -> u32 {
    let mut sorted = days.to_vec();
    sorted.sort_unstable();
    sorted.dedup();

    let mut best = 0;
    let mut run = 0;
    let mut prev: Option<NaiveDate> = None;
    for day in sorted {
        run = match prev {
            Some(p) if day - p == Duration::days(1) => run + 1,
            _ => 1,
        };
        best = best.max(run);
        prev = Some(day);
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        parse_day(s).unwrap()
    }

    #[test]
    fn timestamps_sort_after_their_day() {
        let at = d("2024-03-10").and_hms_opt(23, 5, 9).unwrap().and_utc();
        let ts = sqlite_timestamp(at);
        assert_eq!(ts, "2024-03-10 23:05:09");
        assert!(ts.as_str() >= "2024-03-10" && ts.as_str() < "2024-03-11");
    }

    #[test]
    fn empty_history_has_no_streak() {
        assert_eq!(current_streak(&[], d("2024-03-10")), 0);
        assert_eq!(best_streak(&[]), 0);
    }

    #[test]
    fn streak_counts_back_from_today() {
        let days = [d("2024-03-08"), d("2024-03-09"), d("2024-03-10")];
        assert_eq!(current_streak(&days, d("2024-03-10")), 3);
    }

    #[test]
    fn streak_survives_until_a_day_is_missed() {
        let days = [d("2024-03-08"), d("2024-03-09")];
        assert_eq!(current_streak(&days, d("2024-03-10")), 2);
        assert_eq!(current_streak(&days, d("2024-03-11")), 0);
    }

    #[test]
    fn gap_breaks_the_current_run() {
        let days = [
            d("2024-03-01"),
            d("2024-03-02"),
            d("2024-03-03"),
            d("2024-03-05"),
            d("2024-03-06"),
        ];
        assert_eq!(current_streak(&days, d("2024-03-06")), 2);
        assert_eq!(best_streak(&days), 3);
    }

    #[test]
    fn duplicates_and_order_do_not_matter() {
        let days = [d("2024-03-10"), d("2024-03-09"), d("2024-03-10")];
        assert_eq!(current_streak(&days, d("2024-03-10")), 2);
        assert_eq!(best_streak(&days), 2);
    }

    #[test]
    fn future_days_are_ignored_for_current_streak() {
        let days = [d("2024-03-09"), d("2024-03-10"), d("2024-03-12")];
        assert_eq!(current_streak(&days, d("2024-03-10")), 2);
    }
}
