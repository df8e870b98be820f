//! Date-indexed daily series and the missing-date set.

use crate::error::{ImputeError, Result};
use chrono::{Duration, NaiveDate};
use serde::Serialize;
use std::collections::BTreeMap;

/// Date formats accepted by [`parse_date`], tried in order.
///
/// chrono reads `%m`/`%d` with one or two digits, so `2005.1.3` matches the
/// first pattern.
pub const DATE_FORMATS: [&str; 4] = ["%Y.%m.%d", "%Y-%m-%d", "%Y/%m/%d", "%Y%m%d"];

/// A single raw observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Observation {
    pub date: NaiveDate,
    pub value: f64,
}

impl Observation {
    pub fn new(date: NaiveDate, value: f64) -> Self {
        Self { date, value }
    }
}

/// Parse a calendar date in any of [`DATE_FORMATS`].
pub fn parse_date(raw: &str) -> Result<NaiveDate> {
    let trimmed = raw.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
        .ok_or_else(|| ImputeError::InvalidDateFormat(format!("'{}'", trimmed)))
}

/// Parse a demand value. Non-numeric and non-finite values are rejected.
pub fn parse_value(raw: &str) -> Result<f64> {
    let trimmed = raw.trim();
    match trimmed.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(ImputeError::DataFormat(format!(
            "value '{}' is not a finite number",
            trimmed
        ))),
    }
}

/// A daily series over the full calendar range of its observations.
///
/// Built once per run and never mutated. `values[i]` belongs to
/// `start + i` days; `None` marks a missing date.
#[derive(Debug, Clone)]
pub struct Series {
    observed: Vec<Observation>,
    values: Vec<Option<f64>>,
    missing: Vec<NaiveDate>,
    start: NaiveDate,
}

impl Series {
    /// Build a series from raw observations.
    ///
    /// Duplicate dates keep the last-seen value. Fails with
    /// [`ImputeError::DataFormat`] on an empty list or a non-finite value.
    pub fn from_observations(observations: impl IntoIterator<Item = Observation>) -> Result<Self> {
        let mut by_date: BTreeMap<NaiveDate, f64> = BTreeMap::new();
        let mut n_raw = 0usize;

        for obs in observations {
            n_raw += 1;
            if !obs.value.is_finite() {
                return Err(ImputeError::DataFormat(format!(
                    "non-finite value {} on {}",
                    obs.value, obs.date
                )));
            }
            by_date.insert(obs.date, obs.value);
        }

        let (start, end) = match (by_date.keys().next(), by_date.keys().next_back()) {
            (Some(&s), Some(&e)) => (s, e),
            _ => {
                return Err(ImputeError::DataFormat(
                    "no observations with a valid date".to_string(),
                ))
            }
        };

        if n_raw > by_date.len() {
            tracing::debug!(
                duplicates = n_raw - by_date.len(),
                "resolved duplicate dates (last value kept)"
            );
        }

        let n_days = (end - start).num_days() as usize + 1;
        let mut values = vec![None; n_days];
        let observed: Vec<Observation> = by_date
            .into_iter()
            .map(|(date, value)| {
                values[(date - start).num_days() as usize] = Some(value);
                Observation::new(date, value)
            })
            .collect();

        let missing = values
            .iter()
            .enumerate()
            .filter(|(_, v)| v.is_none())
            .map(|(i, _)| start + Duration::days(i as i64))
            .collect();

        Ok(Self {
            observed,
            values,
            missing,
            start,
        })
    }

    /// Build a series from raw `(date, value)` text pairs.
    ///
    /// Any unparseable date or value aborts with a data-format error that
    /// names the 1-based record number.
    pub fn from_records<D, V>(records: impl IntoIterator<Item = (D, V)>) -> Result<Self>
    where
        D: AsRef<str>,
        V: AsRef<str>,
    {
        let mut observations = Vec::new();
        for (i, (date, value)) in records.into_iter().enumerate() {
            let date = parse_date(date.as_ref()).map_err(|e| {
                ImputeError::DataFormat(format!("record {}: {}", i + 1, e))
            })?;
            let value = parse_value(value.as_ref())
                .map_err(|e| ImputeError::DataFormat(format!("record {}: {}", i + 1, e)))?;
            observations.push(Observation::new(date, value));
        }
        Self::from_observations(observations)
    }

    /// Observations sorted by date, duplicates resolved.
    pub fn observed(&self) -> &[Observation] {
        &self.observed
    }

    /// Observed values in date order.
    pub fn observed_values(&self) -> Vec<f64> {
        self.observed.iter().map(|o| o.value).collect()
    }

    /// Values over the full calendar range, `None` on missing dates.
    pub fn values(&self) -> &[Option<f64>] {
        &self.values
    }

    /// Missing dates in ascending order.
    pub fn missing_dates(&self) -> &[NaiveDate] {
        &self.missing
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.start + Duration::days(self.values.len() as i64 - 1)
    }

    /// Number of calendar days in the full range.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Every date of the full calendar range.
    pub fn calendar(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        (0..self.values.len()).map(move |i| self.start + Duration::days(i as i64))
    }

    /// Day offset of `date` from the earliest observed date.
    pub fn day_offset(&self, date: NaiveDate) -> i64 {
        (date - self.start).num_days()
    }

    /// Position of `date` in the calendar range, if inside it.
    pub fn index_of(&self, date: NaiveDate) -> Option<usize> {
        let offset = self.day_offset(date);
        if offset >= 0 && (offset as usize) < self.values.len() {
            Some(offset as usize)
        } else {
            None
        }
    }

    /// Observed value on `date`, `None` if missing or out of range.
    pub fn value_on(&self, date: NaiveDate) -> Option<f64> {
        self.index_of(date).and_then(|i| self.values[i])
    }

    pub fn is_missing(&self, date: NaiveDate) -> bool {
        self.index_of(date).is_some_and(|i| self.values[i].is_none())
    }

    /// Observations strictly before `date`.
    pub fn history_before(&self, date: NaiveDate) -> &[Observation] {
        let end = self.observed.partition_point(|o| o.date < date);
        &self.observed[..end]
    }

    /// Mean of all observed values.
    pub fn observed_mean(&self) -> f64 {
        self.observed.iter().map(|o| o.value).sum::<f64>() / self.observed.len() as f64
    }
}
