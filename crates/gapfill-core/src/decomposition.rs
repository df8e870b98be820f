//! Classical additive seasonal decomposition and the imputer built on it.

use crate::error::{ImputeError, Result};
use crate::estimator::{Estimate, Estimator, EstimatorKind};
use crate::imputation::interpolate_linear;
use crate::series::Series;
use chrono::NaiveDate;

/// Weekly cycle of a daily series.
pub const WEEKLY_PERIOD: usize = 7;

/// Result of an additive decomposition `value = trend + seasonal + residual`.
#[derive(Debug, Clone)]
pub struct SeasonalDecomposition {
    /// Centered moving average; `None` within half a window of either edge
    pub trend: Vec<Option<f64>>,
    /// Seasonal component, zero-mean over one cycle
    pub seasonal: Vec<f64>,
    /// Residual; `None` wherever the trend is undefined
    pub residual: Vec<Option<f64>>,
    /// Seasonal period used
    pub period: usize,
}

impl SeasonalDecomposition {
    /// Mean of all defined residuals, `None` if there are none.
    pub fn mean_residual(&self) -> Option<f64> {
        let (sum, count) = self
            .residual
            .iter()
            .flatten()
            .fold((0.0, 0usize), |(s, c), r| (s + r, c + 1));
        (count > 0).then(|| sum / count as f64)
    }
}

/// Centered moving average over `period` points.
///
/// Even periods use the 2×MA filter (window `period + 1`, half weight on
/// both ends) so the average stays centered.
fn centered_moving_average(values: &[f64], period: usize) -> Vec<Option<f64>> {
    let n = values.len();
    let half = period / 2;
    let mut trend = vec![None; n];

    if n < 2 * half + 1 {
        return trend;
    }

    for (i, slot) in trend.iter_mut().enumerate().take(n - half).skip(half) {
        let window = &values[i - half..=i + half];
        let avg = if period % 2 == 1 {
            window.iter().sum::<f64>() / period as f64
        } else {
            let inner: f64 = window[1..window.len() - 1].iter().sum();
            (inner + 0.5 * (window[0] + window[window.len() - 1])) / period as f64
        };
        *slot = Some(avg);
    }

    trend
}

/// Decompose a gap-free series additively with the given seasonal period.
pub fn decompose_additive(values: &[f64], period: usize) -> Result<SeasonalDecomposition> {
    if period < 2 {
        return Err(ImputeError::invalid_parameter(
            "period",
            period,
            "must be at least 2",
        ));
    }

    let n = values.len();
    if n < 2 * period {
        return Err(ImputeError::InsufficientData {
            needed: 2 * period,
            got: n,
        });
    }

    let trend = centered_moving_average(values, period);

    // Average detrended value per position in the cycle
    let mut sums = vec![0.0; period];
    let mut counts = vec![0usize; period];
    for (i, (v, t)) in values.iter().zip(trend.iter()).enumerate() {
        if let Some(t) = t {
            sums[i % period] += v - t;
            counts[i % period] += 1;
        }
    }
    let mut cycle: Vec<f64> = sums
        .iter()
        .zip(counts.iter())
        .map(|(s, &c)| if c > 0 { s / c as f64 } else { 0.0 })
        .collect();

    // Center the seasonal component (mean = 0 over one cycle)
    let cycle_mean = cycle.iter().sum::<f64>() / period as f64;
    for c in &mut cycle {
        *c -= cycle_mean;
    }

    let seasonal: Vec<f64> = (0..n).map(|i| cycle[i % period]).collect();

    let residual = values
        .iter()
        .zip(trend.iter())
        .zip(seasonal.iter())
        .map(|((v, t), s)| t.map(|t| v - t - s))
        .collect();

    Ok(SeasonalDecomposition {
        trend,
        seasonal,
        residual,
        period,
    })
}

/// Reconstructs gaps from trend + weekly seasonal + mean residual of a
/// linearly pre-filled copy of the series.
#[derive(Debug, Clone, Copy)]
pub struct SeasonalDecomposer {
    pub period: usize,
}

impl Default for SeasonalDecomposer {
    fn default() -> Self {
        Self {
            period: WEEKLY_PERIOD,
        }
    }
}

impl SeasonalDecomposer {
    pub fn new(period: usize) -> Self {
        Self { period }
    }
}

impl Estimator for SeasonalDecomposer {
    fn kind(&self) -> EstimatorKind {
        EstimatorKind::Seasonal
    }

    fn estimate(&self, series: &Series, missing: &[NaiveDate]) -> Estimate {
        let mut estimate = Estimate::new(self.kind());

        // Calendar edges are always observed, so the pre-fill has no holes.
        let prefilled: Option<Vec<f64>> = interpolate_linear(series.values()).into_iter().collect();
        let Some(prefilled) = prefilled else {
            tracing::debug!("seasonal: linear pre-fill left gaps, no estimates");
            return estimate;
        };

        let decomposition = match decompose_additive(&prefilled, self.period) {
            Ok(d) => d,
            Err(e) => {
                tracing::debug!(error = %e, "seasonal: decomposition failed, no estimates");
                return estimate;
            }
        };
        let mean_residual = decomposition.mean_residual().unwrap_or(0.0);

        for &date in missing {
            let Some(i) = series.index_of(date) else {
                continue;
            };
            match decomposition.trend[i] {
                Some(trend) => {
                    estimate.insert(date, trend + decomposition.seasonal[i] + mean_residual)
                }
                None => tracing::debug!(%date, "seasonal: trend undefined near series edge"),
            }
        }

        estimate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn weekly_series(n: usize) -> Vec<f64> {
        let pattern = [3.0, 1.0, -2.0, 0.5, -1.5, -4.0, 3.0];
        (0..n).map(|i| 100.0 + 0.5 * i as f64 + pattern[i % 7]).collect()
    }

    #[test]
    fn test_trend_undefined_at_edges() {
        let values = weekly_series(28);
        let result = decompose_additive(&values, 7).unwrap();
        assert!(result.trend[..3].iter().all(|t| t.is_none()));
        assert!(result.trend[25..].iter().all(|t| t.is_none()));
        assert!(result.trend[3..25].iter().all(|t| t.is_some()));
        assert!(result.residual[0].is_none());
    }

    #[test]
    fn test_recovers_linear_trend_and_pattern() {
        let values = weekly_series(70);
        let result = decompose_additive(&values, 7).unwrap();

        // A full-cycle average of a linear trend is exact.
        let pattern_mean = (3.0 + 1.0 - 2.0 + 0.5 - 1.5 - 4.0 + 3.0) / 7.0;
        assert_relative_eq!(
            result.trend[10].unwrap(),
            100.0 + 5.0 + pattern_mean,
            epsilon = 1e-9
        );
        assert_relative_eq!(result.seasonal[0], 3.0 - pattern_mean, epsilon = 1e-9);
        assert_relative_eq!(result.seasonal[5], -4.0 - pattern_mean, epsilon = 1e-9);
        assert_relative_eq!(result.mean_residual().unwrap(), 0.0, epsilon = 1e-9);

        let cycle_sum: f64 = result.seasonal[..7].iter().sum();
        assert_relative_eq!(cycle_sum, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_even_period_uses_two_by_ma() {
        let values: Vec<f64> = (0..12).map(|i| i as f64).collect();
        let result = decompose_additive(&values, 4).unwrap();
        assert!(result.trend[1].is_none());
        assert_relative_eq!(result.trend[2].unwrap(), 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_insufficient_data() {
        let err = decompose_additive(&[1.0; 10], 7).unwrap_err();
        assert!(matches!(
            err,
            ImputeError::InsufficientData { needed: 14, got: 10 }
        ));
    }

    #[test]
    fn test_estimator_fills_interior_gap_only() {
        let values = weekly_series(35);
        let start = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        let gap_inner = start + chrono::Duration::days(17);
        let gap_edge = start + chrono::Duration::days(1);
        let observations = values
            .iter()
            .enumerate()
            .map(|(i, &v)| crate::series::Observation::new(start + chrono::Duration::days(i as i64), v))
            .filter(|o| o.date != gap_inner && o.date != gap_edge);
        let series = Series::from_observations(observations).unwrap();

        let estimate = SeasonalDecomposer::default().estimate(&series, series.missing_dates());
        assert!(estimate.get(gap_edge).is_none());
        let inner = estimate.get(gap_inner).unwrap();
        assert!((inner - values[17]).abs() < 2.0);
    }
}
