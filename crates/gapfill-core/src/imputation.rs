//! Piecewise-linear interpolation over the daily calendar.

use crate::estimator::{Estimate, Estimator, EstimatorKind};
use crate::series::Series;
use chrono::NaiveDate;

/// Fill NULL values by linear interpolation between the nearest observed
/// neighbours, proportional to the index distance.
///
/// Positions before the first or after the last observed value have no
/// bracketing pair and stay `None`.
pub fn interpolate_linear(values: &[Option<f64>]) -> Vec<Option<f64>> {
    let mut result = values.to_vec();

    let Some(first) = values.iter().position(|v| v.is_some()) else {
        return result;
    };

    let mut prev_idx = first;
    let mut prev_val = match values[first] {
        Some(v) => v,
        None => return result,
    };

    for (i, v) in values.iter().enumerate().skip(first + 1) {
        if let Some(v) = *v {
            let gap = i - prev_idx;
            if gap > 1 {
                let slope = (v - prev_val) / gap as f64;
                for j in 1..gap {
                    result[prev_idx + j] = Some(prev_val + slope * j as f64);
                }
            }
            prev_idx = i;
            prev_val = v;
        }
    }

    result
}

/// Linear interpolation across each gap.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinearInterpolator;

impl Estimator for LinearInterpolator {
    fn kind(&self) -> EstimatorKind {
        EstimatorKind::Linear
    }

    fn estimate(&self, series: &Series, missing: &[NaiveDate]) -> Estimate {
        let filled = interpolate_linear(series.values());
        let mut estimate = Estimate::new(self.kind());

        for &date in missing {
            match series.index_of(date).and_then(|i| filled[i]) {
                Some(v) => estimate.insert(date, v),
                None => tracing::debug!(%date, "linear: no bracketing observations"),
            }
        }

        estimate
    }
}
