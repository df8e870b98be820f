//! Interpolating cubic spline over observed day offsets.
//!
//! The spline passes through every knot and uses not-a-knot end conditions:
//! the third derivative is continuous across the second and the penultimate
//! knot. With three knots this degenerates to the interpolating parabola and
//! with two to the straight line.

use crate::error::{ImputeError, Result};
use crate::estimator::{Estimate, Estimator, EstimatorKind};
use crate::series::Series;
use chrono::NaiveDate;

/// A fitted cubic spline in second-derivative form.
#[derive(Debug, Clone)]
pub struct CubicSpline {
    x: Vec<f64>,
    y: Vec<f64>,
    /// Second derivative at each knot
    m: Vec<f64>,
}

impl CubicSpline {
    /// Fit the interpolating spline through `(x[i], y[i])`.
    ///
    /// `x` must be strictly increasing.
    pub fn fit(x: &[f64], y: &[f64]) -> Result<Self> {
        if x.len() != y.len() {
            return Err(ImputeError::DataFormat(format!(
                "spline knots and values differ in length ({} vs {})",
                x.len(),
                y.len()
            )));
        }

        let n = x.len();
        if n < 2 {
            return Err(ImputeError::InsufficientData { needed: 2, got: n });
        }

        if let Some(i) = x.windows(2).position(|w| !(w[1] > w[0])) {
            return Err(ImputeError::DataFormat(format!(
                "spline day offsets must be strictly increasing (offset {} then {})",
                x[i],
                x[i + 1]
            )));
        }

        let m = match n {
            2 => vec![0.0; 2],
            3 => {
                let h0 = x[1] - x[0];
                let h1 = x[2] - x[1];
                let curvature = 2.0 * ((y[2] - y[1]) / h1 - (y[1] - y[0]) / h0) / (h0 + h1);
                vec![curvature; 3]
            }
            _ => not_a_knot_second_derivatives(x, y)?,
        };

        Ok(Self {
            x: x.to_vec(),
            y: y.to_vec(),
            m,
        })
    }

    /// Evaluate the spline at `at`. Outside the knot range the end
    /// polynomials are extended.
    pub fn evaluate(&self, at: f64) -> f64 {
        if let Ok(i) = self.x.binary_search_by(|k| k.total_cmp(&at)) {
            return self.y[i];
        }

        let last_segment = self.x.len() - 2;
        let seg = self
            .x
            .partition_point(|&k| k <= at)
            .saturating_sub(1)
            .min(last_segment);

        let (x0, x1) = (self.x[seg], self.x[seg + 1]);
        let (y0, y1) = (self.y[seg], self.y[seg + 1]);
        let (m0, m1) = (self.m[seg], self.m[seg + 1]);
        let h = x1 - x0;
        let t0 = at - x0;
        let t1 = x1 - at;

        m0 * t1.powi(3) / (6.0 * h)
            + m1 * t0.powi(3) / (6.0 * h)
            + (y0 / h - m0 * h / 6.0) * t1
            + (y1 / h - m1 * h / 6.0) * t0
    }

    pub fn knots(&self) -> &[f64] {
        &self.x
    }
}

/// Solve for knot second derivatives under not-a-knot end conditions.
///
/// The end conditions are substituted into the first and last interior
/// equations so the system stays tridiagonal in `m[1..n-1]`.
fn not_a_knot_second_derivatives(x: &[f64], y: &[f64]) -> Result<Vec<f64>> {
    let n = x.len();
    let h: Vec<f64> = x.windows(2).map(|w| w[1] - w[0]).collect();
    let k = n - 2;

    let mut sub = vec![0.0; k];
    let mut diag = vec![0.0; k];
    let mut sup = vec![0.0; k];
    let mut rhs = vec![0.0; k];

    for j in 0..k {
        let i = j + 1;
        sub[j] = h[i - 1];
        diag[j] = 2.0 * (h[i - 1] + h[i]);
        sup[j] = h[i];
        rhs[j] = 6.0 * ((y[i + 1] - y[i]) / h[i] - (y[i] - y[i - 1]) / h[i - 1]);
    }

    // m[0] = ((h0 + h1) m[1] - h0 m[2]) / h1
    diag[0] += h[0] * (h[0] + h[1]) / h[1];
    sup[0] = h[1] - h[0] * h[0] / h[1];

    // m[n-1] = ((h[n-3] + h[n-2]) m[n-2] - h[n-2] m[n-3]) / h[n-3]
    let (ha, hb) = (h[n - 3], h[n - 2]);
    diag[k - 1] += hb * (ha + hb) / ha;
    sub[k - 1] = ha - hb * hb / ha;

    let interior = solve_tridiagonal(&sub, &diag, &sup, &rhs)?;

    let mut m = Vec::with_capacity(n);
    m.push(((h[0] + h[1]) * interior[0] - h[0] * interior[1]) / h[1]);
    m.extend_from_slice(&interior);
    m.push(((ha + hb) * interior[k - 1] - hb * interior[k - 2]) / ha);

    Ok(m)
}

/// Thomas algorithm. `sub[0]` and `sup[len-1]` are ignored.
fn solve_tridiagonal(sub: &[f64], diag: &[f64], sup: &[f64], rhs: &[f64]) -> Result<Vec<f64>> {
    let n = diag.len();
    let mut c = vec![0.0; n];
    let mut d = vec![0.0; n];

    for i in 0..n {
        let denom = if i == 0 {
            diag[0]
        } else {
            diag[i] - sub[i] * c[i - 1]
        };
        if denom == 0.0 || !denom.is_finite() {
            return Err(ImputeError::ComputationError(format!(
                "singular spline system at row {}",
                i
            )));
        }
        c[i] = if i + 1 < n { sup[i] / denom } else { 0.0 };
        d[i] = if i == 0 {
            rhs[0] / denom
        } else {
            (rhs[i] - sub[i] * d[i - 1]) / denom
        };
    }

    let mut out = vec![0.0; n];
    out[n - 1] = d[n - 1];
    for i in (0..n - 1).rev() {
        out[i] = d[i] - c[i] * out[i + 1];
    }

    Ok(out)
}

/// Cubic spline through the observed points, evaluated at each gap.
///
/// Near the series edges the spline may overshoot; that is accepted rather
/// than corrected.
#[derive(Debug, Clone, Copy, Default)]
pub struct SplineInterpolator;

impl Estimator for SplineInterpolator {
    fn kind(&self) -> EstimatorKind {
        EstimatorKind::Spline
    }

    fn estimate(&self, series: &Series, missing: &[NaiveDate]) -> Estimate {
        let mut estimate = Estimate::new(self.kind());

        let x: Vec<f64> = series
            .observed()
            .iter()
            .map(|o| series.day_offset(o.date) as f64)
            .collect();
        let y = series.observed_values();

        let spline = match CubicSpline::fit(&x, &y) {
            Ok(s) => s,
            Err(e) => {
                tracing::debug!(error = %e, "spline: fit failed, no estimates");
                return estimate;
            }
        };

        for &date in missing {
            estimate.insert(date, spline.evaluate(series.day_offset(date) as f64));
        }

        estimate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_reproduces_knots_exactly() {
        let x = vec![0.0, 1.0, 2.0, 4.0, 5.0, 8.0, 9.0];
        let y = vec![3.0, -1.0, 7.5, 2.25, 0.0, 11.0, 4.0];
        let spline = CubicSpline::fit(&x, &y).unwrap();
        for (xi, yi) in x.iter().zip(y.iter()) {
            assert_eq!(spline.evaluate(*xi), *yi);
        }
    }

    #[test]
    fn test_reproduces_cubic_polynomial() {
        // Not-a-knot splines are exact for cubics.
        let f = |t: f64| 0.5 * t.powi(3) - 2.0 * t * t + t + 7.0;
        let x = vec![0.0, 1.0, 2.0, 3.0, 5.0, 6.0];
        let y: Vec<f64> = x.iter().map(|&t| f(t)).collect();
        let spline = CubicSpline::fit(&x, &y).unwrap();
        assert_relative_eq!(spline.evaluate(4.0), f(4.0), epsilon = 1e-9);
        assert_relative_eq!(spline.evaluate(2.5), f(2.5), epsilon = 1e-9);
    }

    #[test]
    fn test_four_knots() {
        let f = |t: f64| t.powi(3);
        let x = vec![0.0, 1.0, 3.0, 4.0];
        let y: Vec<f64> = x.iter().map(|&t| f(t)).collect();
        let spline = CubicSpline::fit(&x, &y).unwrap();
        assert_relative_eq!(spline.evaluate(2.0), 8.0, epsilon = 1e-9);
    }

    #[test]
    fn test_three_knots_is_parabola() {
        let x = vec![0.0, 1.0, 3.0];
        let y = vec![0.0, 1.0, 9.0];
        let spline = CubicSpline::fit(&x, &y).unwrap();
        assert_relative_eq!(spline.evaluate(2.0), 4.0, epsilon = 1e-12);
    }

    #[test]
    fn test_two_knots_is_line() {
        let spline = CubicSpline::fit(&[0.0, 10.0], &[100.0, 200.0]).unwrap();
        assert_relative_eq!(spline.evaluate(5.0), 150.0, epsilon = 1e-12);
    }

    #[test]
    fn test_rejects_non_increasing_offsets() {
        let err = CubicSpline::fit(&[0.0, 2.0, 2.0, 3.0], &[1.0, 2.0, 3.0, 4.0]).unwrap_err();
        assert!(matches!(err, ImputeError::DataFormat(_)));
        let err = CubicSpline::fit(&[0.0, 3.0, 2.0], &[1.0, 2.0, 3.0]).unwrap_err();
        assert!(matches!(err, ImputeError::DataFormat(_)));
    }

    #[test]
    fn test_rejects_single_knot() {
        let err = CubicSpline::fit(&[0.0], &[1.0]).unwrap_err();
        assert!(matches!(err, ImputeError::InsufficientData { .. }));
    }

    #[test]
    fn test_estimator_fills_gap() {
        let series = Series::from_records(vec![
            ("2023.1.1", "0"),
            ("2023.1.2", "1"),
            ("2023.1.3", "8"),
            ("2023.1.5", "64"),
            ("2023.1.6", "125"),
        ])
        .unwrap();
        let estimate = SplineInterpolator.estimate(&series, series.missing_dates());
        let gap = NaiveDate::from_ymd_opt(2023, 1, 4).unwrap();
        assert_relative_eq!(estimate.get(gap).unwrap(), 27.0, epsilon = 1e-9);
    }
}
