//! Calendar features for a daily date, including cyclical encodings.

use chrono::{Datelike, NaiveDate};
use std::f64::consts::PI;

/// Feature names in the column order produced by [`calendar_features`].
pub const CALENDAR_FEATURES: [&str; 10] = [
    "year",
    "month",
    "day",
    "weekday",
    "day_of_year",
    "is_weekend",
    "month_sin",
    "month_cos",
    "weekday_sin",
    "weekday_cos",
];

pub const N_CALENDAR_FEATURES: usize = CALENDAR_FEATURES.len();

/// Encode `date` as calendar features. Weekday counts from Monday = 0.
pub fn calendar_features(date: NaiveDate) -> [f64; N_CALENDAR_FEATURES] {
    let month = date.month() as f64;
    let weekday = date.weekday().num_days_from_monday() as f64;
    let is_weekend = if weekday >= 5.0 { 1.0 } else { 0.0 };

    [
        date.year() as f64,
        month,
        date.day() as f64,
        weekday,
        date.ordinal() as f64,
        is_weekend,
        (2.0 * PI * month / 12.0).sin(),
        (2.0 * PI * month / 12.0).cos(),
        (2.0 * PI * weekday / 7.0).sin(),
        (2.0 * PI * weekday / 7.0).cos(),
    ]
}
