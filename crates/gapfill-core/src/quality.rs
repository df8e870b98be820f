//! Quality assessment of the completed series.

use crate::ensemble::EnsembleResult;
use crate::error::{ImputeError, Result};
use crate::series::Series;
use crate::stats::{self, SummaryStats};
use serde::Serialize;
use std::str::FromStr;

/// How the observed neighbourhood around an imputed date is chosen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NeighborhoodWindow {
    /// Observations within `radius` calendar days either side
    #[default]
    Calendar,
    /// The `radius` nearest observations before and the `radius` after,
    /// however far away they are
    Observations,
}

impl FromStr for NeighborhoodWindow {
    type Err = ImputeError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "calendar" | "days" => Ok(Self::Calendar),
            "observations" | "obs" => Ok(Self::Observations),
            _ => Err(ImputeError::invalid_parameter(
                "neighborhood_window",
                s,
                "expected 'calendar' or 'observations'",
            )),
        }
    }
}

/// Quality evaluation thresholds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QualityOptions {
    /// Absolute z-score above which an imputed value counts as an outlier
    pub z_threshold: f64,
    /// Radius of the observed neighbourhood around a gap, in calendar days
    /// or in observations per side depending on `window`
    pub neighborhood_days: usize,
    pub window: NeighborhoodWindow,
}

impl Default for QualityOptions {
    fn default() -> Self {
        Self {
            z_threshold: 3.0,
            neighborhood_days: 7,
            window: NeighborhoodWindow::Calendar,
        }
    }
}

impl QualityOptions {
    pub fn validate(&self) -> Result<()> {
        if !self.z_threshold.is_finite() || self.z_threshold <= 0.0 {
            return Err(ImputeError::invalid_parameter(
                "z_threshold",
                self.z_threshold,
                "must be a positive number",
            ));
        }
        if self.neighborhood_days == 0 {
            return Err(ImputeError::invalid_parameter(
                "neighborhood_days",
                self.neighborhood_days,
                "must be at least 1",
            ));
        }
        Ok(())
    }
}

/// Read-only summary of how plausible the imputed values are.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualityReport {
    /// Observed values only
    pub original: SummaryStats,
    /// Observed plus imputed values over the whole calendar
    pub completed: SummaryStats,
    /// Imputed values only; `None` when nothing was missing
    pub imputed: Option<SummaryStats>,
    pub n_imputed: usize,
    /// Imputed values with |z| above the threshold, z taken over the
    /// imputed values themselves
    pub outlier_count: usize,
    /// Mean of |imputed - neighbourhood mean| / neighbourhood std
    pub consistency_score: Option<f64>,
    /// Mean of |imputed - neighbourhood mean| / |neighbourhood mean| in percent
    pub mean_relative_deviation_pct: Option<f64>,
    /// Imputed dates that had a usable neighbourhood for `consistency_score`
    pub n_consistency_dates: usize,
}

impl QualityReport {
    /// Shift of the mean caused by imputation.
    pub fn mean_shift(&self) -> f64 {
        self.completed.mean - self.original.mean
    }
}

/// Observed values around calendar index `i`; `values[i]` itself is a gap.
fn observed_neighborhood(
    values: &[Option<f64>],
    i: usize,
    radius: usize,
    window: NeighborhoodWindow,
) -> Vec<f64> {
    match window {
        NeighborhoodWindow::Calendar => {
            let lo = i.saturating_sub(radius);
            let hi = i.saturating_add(radius).min(values.len() - 1);
            values[lo..=hi].iter().flatten().copied().collect()
        }
        NeighborhoodWindow::Observations => {
            let before = values[..i].iter().rev().flatten().take(radius);
            let after = values[i + 1..].iter().flatten().take(radius);
            before.chain(after).copied().collect()
        }
    }
}

/// Evaluate the completed series: distribution shift, outliers among the
/// imputed values and consistency with the observed neighbourhood.
///
/// Fails with [`ImputeError::InternalError`] if a missing date has no
/// combined value.
pub fn evaluate_quality(
    series: &Series,
    ensemble: &EnsembleResult,
    options: &QualityOptions,
) -> Result<QualityReport> {
    let observed = series.observed_values();
    let original = SummaryStats::from_values(&observed)
        .ok_or_else(|| ImputeError::InternalError("series has no observations".to_string()))?;

    let mut imputed = Vec::with_capacity(series.missing_dates().len());
    for &date in series.missing_dates() {
        let value = ensemble.value(date).ok_or_else(|| {
            ImputeError::InternalError(format!("no combined value for missing date {}", date))
        })?;
        imputed.push(value);
    }

    let completed_values: Vec<f64> = series
        .calendar()
        .zip(series.values().iter())
        .filter_map(|(date, v)| v.or_else(|| ensemble.value(date)))
        .collect();
    let completed = SummaryStats::from_values(&completed_values)
        .ok_or_else(|| ImputeError::InternalError("completed series is empty".to_string()))?;

    let outlier_count = stats::z_scores(&imputed)
        .iter()
        .filter(|z| z.abs() > options.z_threshold)
        .count();

    let radius = options.neighborhood_days;
    let values = series.values();
    let mut scores = Vec::new();
    let mut relative = Vec::new();

    for (&date, &value) in series.missing_dates().iter().zip(imputed.iter()) {
        let Some(i) = series.index_of(date) else {
            continue;
        };
        let neighborhood = observed_neighborhood(values, i, radius, options.window);

        let Some(mean) = stats::mean(&neighborhood) else {
            tracing::debug!(%date, "quality: no observations in neighbourhood");
            continue;
        };
        let deviation = (value - mean).abs();

        if mean != 0.0 {
            relative.push(deviation / mean.abs() * 100.0);
        }
        match stats::sample_std_dev(&neighborhood) {
            Some(sd) if sd.is_finite() && sd > 0.0 => scores.push(deviation / sd),
            _ => tracing::debug!(%date, "quality: neighbourhood has no spread"),
        }
    }

    Ok(QualityReport {
        original,
        completed,
        imputed: SummaryStats::from_values(&imputed),
        n_imputed: imputed.len(),
        outlier_count,
        consistency_score: stats::mean(&scores),
        mean_relative_deviation_pct: stats::mean(&relative),
        n_consistency_dates: scores.len(),
    })
}
