//! End-to-end run: estimators, combination and quality evaluation.

use crate::decomposition::{SeasonalDecomposer, WEEKLY_PERIOD};
use crate::ensemble::{EnsembleCombiner, EnsembleResult, EnsembleWeights, WeightPolicy};
use crate::error::{ImputeError, Result};
use crate::estimator::{Estimate, Estimator, EstimatorKind};
use crate::forecast::{ArimaForecaster, ForecasterOptions};
use crate::gaps::{profile_gaps, GapProfile};
use crate::imputation::LinearInterpolator;
use crate::neighbors::{NeighborImputer, NeighborOptions};
use crate::quality::{evaluate_quality, QualityOptions, QualityReport};
use crate::series::Series;
use crate::spline::SplineInterpolator;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// All tunables of a run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImputationConfig {
    pub weights: EnsembleWeights,
    pub weight_policy: WeightPolicy,
    /// Seasonal period of the decomposition imputer, in days
    pub seasonal_period: usize,
    pub forecaster: ForecasterOptions,
    pub neighbors: NeighborOptions,
    pub quality: QualityOptions,
}

impl Default for ImputationConfig {
    fn default() -> Self {
        Self {
            weights: EnsembleWeights::default(),
            weight_policy: WeightPolicy::default(),
            seasonal_period: WEEKLY_PERIOD,
            forecaster: ForecasterOptions::default(),
            neighbors: NeighborOptions::default(),
            quality: QualityOptions::default(),
        }
    }
}

impl ImputationConfig {
    pub fn validate(&self) -> Result<()> {
        self.weights.validate()?;
        if self.seasonal_period < 2 {
            return Err(ImputeError::invalid_parameter(
                "seasonal_period",
                self.seasonal_period,
                "must be at least 2",
            ));
        }
        self.forecaster.validate()?;
        self.neighbors.validate()?;
        self.quality.validate()?;
        Ok(())
    }

    pub fn combiner(&self) -> EnsembleCombiner {
        EnsembleCombiner::new(self.weights, self.weight_policy)
    }
}

/// The five estimators, configured from `config`, in contribution order.
pub fn default_estimators(config: &ImputationConfig) -> Vec<Box<dyn Estimator>> {
    vec![
        Box::new(LinearInterpolator) as Box<dyn Estimator>,
        Box::new(SplineInterpolator),
        Box::new(SeasonalDecomposer::new(config.seasonal_period)),
        Box::new(ArimaForecaster::new(config.forecaster)),
        Box::new(NeighborImputer::new(config.neighbors)),
    ]
}

/// One row of the completed series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CompletedDay {
    pub date: NaiveDate,
    pub value: f64,
    pub imputed: bool,
}

/// Headline numbers of a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub n_days: usize,
    pub n_observed: usize,
    pub n_missing: usize,
    pub n_fallback: usize,
    pub weight_policy: WeightPolicy,
    pub coverage: BTreeMap<EstimatorKind, usize>,
}

/// Everything a run produces.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub summary: RunSummary,
    pub gaps: GapProfile,
    pub estimates: Vec<Estimate>,
    pub ensemble: EnsembleResult,
    pub quality: QualityReport,
    completed: Vec<CompletedDay>,
}

impl PipelineOutput {
    /// One row per calendar date; observed values are passed through as is.
    pub fn completed(&self) -> &[CompletedDay] {
        &self.completed
    }

    pub fn completed_values(&self) -> Vec<f64> {
        self.completed.iter().map(|d| d.value).collect()
    }

    pub fn estimate(&self, kind: EstimatorKind) -> Option<&Estimate> {
        self.estimates.iter().find(|e| e.kind == kind)
    }
}

/// Run the default ensemble over `series`.
pub fn run(series: &Series, config: &ImputationConfig) -> Result<PipelineOutput> {
    config.validate()?;
    let estimators = default_estimators(config);
    run_with(series, &estimators, config)
}

/// Run a caller-chosen set of estimators over `series`.
pub fn run_with(
    series: &Series,
    estimators: &[Box<dyn Estimator>],
    config: &ImputationConfig,
) -> Result<PipelineOutput> {
    let missing = series.missing_dates();
    tracing::info!(
        start = %series.start(),
        end = %series.end(),
        days = series.len(),
        missing = missing.len(),
        "imputing series"
    );

    let gaps = profile_gaps(missing);

    #[cfg(feature = "parallel")]
    let estimates: Vec<Estimate> = estimators
        .par_iter()
        .map(|e| run_estimator(e.as_ref(), series, missing))
        .collect();

    #[cfg(not(feature = "parallel"))]
    let estimates: Vec<Estimate> = estimators
        .iter()
        .map(|e| run_estimator(e.as_ref(), series, missing))
        .collect();

    let ensemble = config
        .combiner()
        .combine(missing, &estimates, series.observed_mean());
    let n_fallback = ensemble.fallback_dates().len();
    if n_fallback > 0 {
        tracing::warn!(dates = n_fallback, "global-mean fallback used");
    }

    let completed = complete(series, &ensemble)?;
    let quality = evaluate_quality(series, &ensemble, &config.quality)?;
    tracing::info!(
        outliers = quality.outlier_count,
        consistency = ?quality.consistency_score,
        "quality evaluated"
    );

    let summary = RunSummary {
        start: series.start(),
        end: series.end(),
        n_days: series.len(),
        n_observed: series.observed().len(),
        n_missing: missing.len(),
        n_fallback,
        weight_policy: config.weight_policy,
        coverage: ensemble.coverage(),
    };

    Ok(PipelineOutput {
        summary,
        gaps,
        estimates,
        ensemble,
        quality,
        completed,
    })
}

fn run_estimator(estimator: &dyn Estimator, series: &Series, missing: &[NaiveDate]) -> Estimate {
    let estimate = estimator.estimate(series, missing);
    tracing::info!(
        estimator = %estimator.kind(),
        covered = estimate.len(),
        missing = missing.len(),
        "estimator finished"
    );
    estimate
}

fn complete(series: &Series, ensemble: &EnsembleResult) -> Result<Vec<CompletedDay>> {
    series
        .calendar()
        .zip(series.values().iter())
        .map(|(date, value)| match value {
            Some(v) => Ok(CompletedDay {
                date,
                value: *v,
                imputed: false,
            }),
            None => ensemble
                .value(date)
                .map(|v| CompletedDay {
                    date,
                    value: v,
                    imputed: true,
                })
                .ok_or_else(|| {
                    ImputeError::InternalError(format!("no combined value for {}", date))
                }),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::Observation;
    use chrono::Duration;

    fn weekly_series(n: usize, gaps: &[usize]) -> Series {
        let start = NaiveDate::from_ymd_opt(2022, 1, 3).unwrap();
        let pattern = [5.0, 3.0, 0.0, 2.0, 4.0, 9.0, 8.0];
        let observations = (0..n)
            .filter(|i| !gaps.contains(i))
            .map(|i| Observation::new(start + Duration::days(i as i64), 100.0 + pattern[i % 7]));
        Series::from_observations(observations).unwrap()
    }

    #[test]
    fn test_run_completes_every_date() {
        let series = weekly_series(60, &[10, 11, 40]);
        let output = run(&series, &ImputationConfig::default()).unwrap();
        assert_eq!(output.completed().len(), 60);
        assert_eq!(output.summary.n_missing, 3);
        assert_eq!(output.gaps.longest_run, 2);
        assert_eq!(output.estimates.len(), 5);
        assert!(output.completed().iter().filter(|d| d.imputed).count() == 3);
    }

    #[test]
    fn test_no_gaps_is_passthrough() {
        let series = weekly_series(20, &[]);
        let output = run(&series, &ImputationConfig::default()).unwrap();
        assert!(output.ensemble.is_empty());
        assert!(output.completed().iter().all(|d| !d.imputed));
        assert_eq!(output.quality.n_imputed, 0);
    }

    #[test]
    fn test_empty_estimator_set_falls_back() {
        let series = weekly_series(14, &[6]);
        let output = run_with(&series, &[], &ImputationConfig::default()).unwrap();
        let gap = series.missing_dates()[0];
        let entry = output.ensemble.get(gap).unwrap();
        assert!(entry.fallback);
        assert_eq!(entry.value, series.observed_mean());
        assert_eq!(output.summary.n_fallback, 1);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let series = weekly_series(14, &[6]);
        let config = ImputationConfig {
            seasonal_period: 1,
            ..Default::default()
        };
        let err = run(&series, &config).unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }
}
