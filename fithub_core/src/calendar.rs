//! Calendar-day arithmetic shared by the stats engine and badge predicates.

use chrono::{Datelike, Duration, NaiveDate};

/// Whole days from `earlier` to `later` (negative if `later` is before `earlier`)
pub fn days_between(later: NaiveDate, earlier: NaiveDate) -> i64 {
    (later - earlier).num_days()
}

/// Monday of the ISO week containing `day`
pub fn start_of_iso_week(day: NaiveDate) -> NaiveDate {
    day - Duration::days(i64::from(day.weekday().num_days_from_monday()))
}

/// True when both dates fall in the same Monday-to-Sunday week
pub fn same_iso_week(a: NaiveDate, b: NaiveDate) -> bool {
    start_of_iso_week(a) == start_of_iso_week(b)
}

/// True when both dates fall in the same calendar month
pub fn same_month(a: NaiveDate, b: NaiveDate) -> bool {
    a.year() == b.year() && a.month() == b.month()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_week_starts_on_monday() {
        // 2024-01-17 is a Wednesday
        assert_eq!(start_of_iso_week(d(2024, 1, 17)), d(2024, 1, 15));
        // Sunday belongs to the week that started the previous Monday
        assert_eq!(start_of_iso_week(d(2024, 1, 21)), d(2024, 1, 15));
        assert_eq!(start_of_iso_week(d(2024, 1, 15)), d(2024, 1, 15));
    }

    #[test]
    fn test_same_iso_week_across_year_boundary() {
        // 2024-12-30 (Mon) and 2025-01-05 (Sun) share ISO week 1 of 2025
        assert!(same_iso_week(d(2024, 12, 30), d(2025, 1, 5)));
        assert!(!same_iso_week(d(2024, 12, 29), d(2024, 12, 30)));
    }

    #[test]
    fn test_days_between_is_signed() {
        assert_eq!(days_between(d(2024, 3, 1), d(2024, 2, 28)), 2);
        assert_eq!(days_between(d(2024, 2, 28), d(2024, 3, 1)), -2);
    }
}
