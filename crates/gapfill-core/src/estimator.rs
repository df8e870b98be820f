//! The estimator capability shared by all gap-filling methods.

use crate::series::Series;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::ImputeError;

/// Identifies one of the five gap-filling methods.
///
/// The declaration order is the order in which contributions are listed in
/// ensemble audit trails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EstimatorKind {
    Linear,
    Spline,
    Seasonal,
    Forecast,
    Neighbors,
}

impl EstimatorKind {
    pub const ALL: [EstimatorKind; 5] = [
        EstimatorKind::Linear,
        EstimatorKind::Spline,
        EstimatorKind::Seasonal,
        EstimatorKind::Forecast,
        EstimatorKind::Neighbors,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            EstimatorKind::Linear => "linear",
            EstimatorKind::Spline => "spline",
            EstimatorKind::Seasonal => "seasonal",
            EstimatorKind::Forecast => "forecast",
            EstimatorKind::Neighbors => "neighbors",
        }
    }
}

impl fmt::Display for EstimatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EstimatorKind {
    type Err = ImputeError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "linear" | "interpolate" => Ok(EstimatorKind::Linear),
            "spline" | "cubic" => Ok(EstimatorKind::Spline),
            "seasonal" | "decomposition" | "decompose" => Ok(EstimatorKind::Seasonal),
            "forecast" | "arima" => Ok(EstimatorKind::Forecast),
            "neighbors" | "neighbours" | "knn" => Ok(EstimatorKind::Neighbors),
            _ => Err(ImputeError::invalid_parameter(
                "estimator",
                s,
                "expected one of linear, spline, seasonal, forecast, neighbors",
            )),
        }
    }
}

/// Candidate values produced by one estimator, keyed by missing date.
///
/// A date absent from `values` means the estimator failed for it.
#[derive(Debug, Clone)]
pub struct Estimate {
    pub kind: EstimatorKind,
    values: BTreeMap<NaiveDate, f64>,
}

impl Estimate {
    pub fn new(kind: EstimatorKind) -> Self {
        Self {
            kind,
            values: BTreeMap::new(),
        }
    }

    /// Record a value for `date`. Non-finite values count as a failure and
    /// are dropped.
    pub fn insert(&mut self, date: NaiveDate, value: f64) {
        if value.is_finite() {
            self.values.insert(date, value);
        } else {
            tracing::debug!(estimator = %self.kind, %date, value, "dropped non-finite estimate");
        }
    }

    pub fn get(&self, date: NaiveDate) -> Option<f64> {
        self.values.get(&date).copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, f64)> + '_ {
        self.values.iter().map(|(d, v)| (*d, *v))
    }
}

/// A gap-filling method.
///
/// Implementations read only the immutable series and the missing-date set
/// and never see another estimator's output.
pub trait Estimator: Send + Sync {
    fn kind(&self) -> EstimatorKind;

    /// Produce candidate values for `missing`. Failures for individual dates
    /// are omissions, never errors.
    fn estimate(&self, series: &Series, missing: &[NaiveDate]) -> Estimate;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_estimate_drops_non_finite() {
        let date = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        let mut est = Estimate::new(EstimatorKind::Spline);
        est.insert(date, f64::NAN);
        assert!(est.is_empty());
        est.insert(date, f64::INFINITY);
        assert!(est.get(date).is_none());
        est.insert(date, 3.5);
        assert_eq!(est.get(date), Some(3.5));
    }

    #[test]
    fn test_kind_from_str() {
        assert_eq!("KNN".parse::<EstimatorKind>().unwrap(), EstimatorKind::Neighbors);
        assert_eq!("arima".parse::<EstimatorKind>().unwrap(), EstimatorKind::Forecast);
        assert!("median".parse::<EstimatorKind>().is_err());
    }

    #[test]
    fn test_kind_order_matches_all() {
        let mut sorted = EstimatorKind::ALL;
        sorted.sort();
        assert_eq!(sorted, EstimatorKind::ALL);
    }
}
