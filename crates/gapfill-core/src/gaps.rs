//! Profile of the missing-date set: where gaps fall and how long they run.

use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::collections::BTreeMap;

/// A maximal run of consecutive missing dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GapRun {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub length: usize,
}

/// Distribution of missing dates over the calendar.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GapProfile {
    pub total: usize,
    /// Index 0 is Monday
    pub by_weekday: [usize; 7],
    /// Index 0 is January
    pub by_month: [usize; 12],
    pub by_year: BTreeMap<i32, usize>,
    pub runs: Vec<GapRun>,
    pub longest_run: usize,
}

impl GapProfile {
    /// Runs of at least `min_length` days, longest first.
    pub fn runs_at_least(&self, min_length: usize) -> Vec<GapRun> {
        let mut runs: Vec<GapRun> = self
            .runs
            .iter()
            .filter(|r| r.length >= min_length)
            .copied()
            .collect();
        runs.sort_by(|a, b| b.length.cmp(&a.length).then(a.start.cmp(&b.start)));
        runs
    }
}

/// Profile a set of missing dates. Input order and duplicates do not matter.
pub fn profile_gaps(missing: &[NaiveDate]) -> GapProfile {
    let mut dates = missing.to_vec();
    dates.sort_unstable();
    dates.dedup();

    let mut profile = GapProfile {
        total: dates.len(),
        ..Default::default()
    };

    for date in &dates {
        profile.by_weekday[date.weekday().num_days_from_monday() as usize] += 1;
        profile.by_month[date.month0() as usize] += 1;
        *profile.by_year.entry(date.year()).or_insert(0) += 1;
    }

    let mut iter = dates.iter().copied();
    if let Some(first) = iter.next() {
        let mut run = GapRun {
            start: first,
            end: first,
            length: 1,
        };
        for date in iter {
            if date.pred_opt() == Some(run.end) {
                run.end = date;
                run.length += 1;
            } else {
                profile.runs.push(run);
                run = GapRun {
                    start: date,
                    end: date,
                    length: 1,
                };
            }
        }
        profile.runs.push(run);
    }

    profile.longest_run = profile.runs.iter().map(|r| r.length).max().unwrap_or(0);
    profile
}
