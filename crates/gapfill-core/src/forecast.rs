//! One-step-ahead ARIMA(1,1,1) forecasts for each gap.
//!
//! Each missing date is forecast from the observations strictly before it.
//! Other gaps' estimates are never fed back in, so the per-date fits are
//! independent and run in parallel when the `parallel` feature is on.

use crate::error::{ImputeError, Result};
use crate::estimator::{Estimate, Estimator, EstimatorKind};
use crate::series::{Observation, Series};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

use anofox_forecast::core::TimeSeriesBuilder;
use anofox_forecast::models::arima::ARIMA;
use anofox_forecast::prelude::Forecaster;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Forecaster options.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForecasterOptions {
    /// Minimum prior observations before an ARIMA fit is attempted
    pub min_history: usize,
    /// Number of most recent observations averaged by the fallback
    pub fallback_window: usize,
}

impl Default for ForecasterOptions {
    fn default() -> Self {
        Self {
            min_history: 30,
            fallback_window: 7,
        }
    }
}

impl ForecasterOptions {
    pub fn validate(&self) -> Result<()> {
        if self.fallback_window == 0 {
            return Err(ImputeError::invalid_parameter(
                "fallback_window",
                self.fallback_window,
                "must be at least 1",
            ));
        }
        Ok(())
    }
}

/// Where a one-step forecast came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForecastSource {
    Arima,
    /// Mean of the most recent observations (fit failed or short history)
    RecentMean,
    /// Mean of the whole observed series (no prior history at all)
    SeriesMean,
}

/// A single one-step forecast with its provenance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForecastStep {
    pub value: f64,
    pub source: ForecastSource,
}

/// Fit ARIMA(1,1,1) on `history` and forecast one step ahead.
///
/// Observations are stamped at midnight UTC of their date; gaps in the
/// history simply leave holes between the stamps.
pub fn arima_one_step(history: &[Observation]) -> Result<f64> {
    let timestamps: Vec<DateTime<Utc>> = history
        .iter()
        .map(|o| o.date.and_time(NaiveTime::MIN).and_utc())
        .collect();
    let values: Vec<f64> = history.iter().map(|o| o.value).collect();

    let time_series = TimeSeriesBuilder::new()
        .timestamps(timestamps)
        .values(values)
        .build()
        .map_err(|e| {
            ImputeError::ComputationError(format!("Failed to build TimeSeries: {}", e))
        })?;

    let mut model = ARIMA::new(1, 1, 1);
    model
        .fit(&time_series)
        .map_err(|e| ImputeError::ComputationError(format!("Failed to fit ARIMA: {}", e)))?;

    let forecast = model.predict(1).map_err(|e| {
        ImputeError::ComputationError(format!("Failed to generate ARIMA forecast: {}", e))
    })?;

    let point = forecast.point().first().cloned().unwrap_or_default();
    match point.first() {
        Some(v) if v.is_finite() => Ok(*v),
        Some(v) => Err(ImputeError::ComputationError(format!(
            "ARIMA forecast is not finite: {}",
            v
        ))),
        None => Err(ImputeError::ComputationError(
            "ARIMA returned an empty forecast".to_string(),
        )),
    }
}

/// Mean of the last `window` values (or all of them if fewer).
fn recent_mean(history: &[Observation], window: usize) -> f64 {
    let tail = &history[history.len().saturating_sub(window)..];
    tail.iter().map(|o| o.value).sum::<f64>() / tail.len() as f64
}

/// One-step forecast with the full fallback chain:
/// ARIMA when history is long enough, else (or on fit failure) the recent
/// mean, else the whole-series mean when there is no history.
pub fn forecast_next(
    history: &[Observation],
    series_mean: f64,
    options: &ForecasterOptions,
) -> ForecastStep {
    if history.is_empty() {
        return ForecastStep {
            value: series_mean,
            source: ForecastSource::SeriesMean,
        };
    }

    if history.len() >= options.min_history {
        match arima_one_step(history) {
            Ok(value) => {
                return ForecastStep {
                    value,
                    source: ForecastSource::Arima,
                }
            }
            Err(e) => tracing::warn!(error = %e, n = history.len(), "forecast: ARIMA fit failed"),
        }
    }

    ForecastStep {
        value: recent_mean(history, options.fallback_window),
        source: ForecastSource::RecentMean,
    }
}

/// Short-horizon ARIMA forecaster conditioned only on actual observations.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArimaForecaster {
    pub options: ForecasterOptions,
}

impl ArimaForecaster {
    pub fn new(options: ForecasterOptions) -> Self {
        Self { options }
    }

    fn forecast_date(&self, series: &Series, date: NaiveDate, series_mean: f64) -> ForecastStep {
        forecast_next(series.history_before(date), series_mean, &self.options)
    }

    /// Per-date forecasts with their provenance, in `missing` order.
    pub fn forecast_steps(
        &self,
        series: &Series,
        missing: &[NaiveDate],
    ) -> Vec<(NaiveDate, ForecastStep)> {
        let series_mean = series.observed_mean();

        #[cfg(feature = "parallel")]
        let steps = missing
            .par_iter()
            .map(|&date| (date, self.forecast_date(series, date, series_mean)))
            .collect();

        #[cfg(not(feature = "parallel"))]
        let steps = missing
            .iter()
            .map(|&date| (date, self.forecast_date(series, date, series_mean)))
            .collect();

        steps
    }
}

impl Estimator for ArimaForecaster {
    fn kind(&self) -> EstimatorKind {
        EstimatorKind::Forecast
    }

    fn estimate(&self, series: &Series, missing: &[NaiveDate]) -> Estimate {
        let mut estimate = Estimate::new(self.kind());
        for (date, step) in self.forecast_steps(series, missing) {
            if step.source != ForecastSource::Arima {
                tracing::debug!(%date, source = ?step.source, "forecast: fallback used");
            }
            estimate.insert(date, step.value);
        }
        estimate
    }
}
