//! Calendar helpers for cooldown checks. Weeks start on Sunday.

use chrono::{Datelike, Duration, NaiveDate};

/// The Sunday that opens the week containing `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_sunday()))
}

pub fn same_week(a: NaiveDate, b: NaiveDate) -> bool {
    week_start(a) == week_start(b)
}

pub fn same_weekday(a: NaiveDate, b: NaiveDate) -> bool {
    a.weekday() == b.weekday()
}
