//! Summary statistics for observed, imputed and completed values.

use serde::Serialize;
use statrs::statistics::Statistics;

/// Count, location and spread of a set of values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SummaryStats {
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation (n - 1); `None` for fewer than two values
    pub std_dev: Option<f64>,
    pub min: f64,
    pub max: f64,
}

impl SummaryStats {
    /// Summarize `values`, `None` when empty.
    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }

        let std_dev = if values.len() > 1 {
            Some(values.iter().std_dev())
        } else {
            None
        };

        Some(Self {
            count: values.len(),
            mean: values.iter().mean(),
            std_dev,
            min: Statistics::min(values.iter()),
            max: Statistics::max(values.iter()),
        })
    }
}

/// Population standard deviation (n), `None` when empty.
pub fn population_std_dev(values: &[f64]) -> Option<f64> {
    (!values.is_empty()).then(|| values.iter().population_std_dev())
}

/// Sample standard deviation (n - 1), `None` for fewer than two values.
pub fn sample_std_dev(values: &[f64]) -> Option<f64> {
    (values.len() > 1).then(|| values.iter().std_dev())
}

/// Arithmetic mean, `None` when empty.
pub fn mean(values: &[f64]) -> Option<f64> {
    (!values.is_empty()).then(|| values.iter().mean())
}

/// Standard scores under the population standard deviation.
///
/// A constant input has no spread and yields all zeros.
pub fn z_scores(values: &[f64]) -> Vec<f64> {
    let (Some(m), Some(sd)) = (mean(values), population_std_dev(values)) else {
        return Vec::new();
    };
    if sd <= 0.0 || !sd.is_finite() {
        return vec![0.0; values.len()];
    }
    values.iter().map(|v| (v - m) / sd).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_summary() {
        let s = SummaryStats::from_values(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert_eq!(s.count, 8);
        assert_relative_eq!(s.mean, 5.0);
        assert_relative_eq!(s.std_dev.unwrap(), (32.0f64 / 7.0).sqrt(), epsilon = 1e-12);
        assert_eq!(s.min, 2.0);
        assert_eq!(s.max, 9.0);
    }

    #[test]
    fn test_single_value_has_no_sample_std() {
        let s = SummaryStats::from_values(&[3.0]).unwrap();
        assert!(s.std_dev.is_none());
        assert!(SummaryStats::from_values(&[]).is_none());
    }

    #[test]
    fn test_population_vs_sample() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_relative_eq!(population_std_dev(&values).unwrap(), 2.0, epsilon = 1e-12);
        assert!(sample_std_dev(&[1.0]).is_none());
    }

    #[test]
    fn test_z_scores() {
        let z = z_scores(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert_relative_eq!(z[0], -1.5, epsilon = 1e-12);
        assert_relative_eq!(z[7], 2.0, epsilon = 1e-12);
        assert_eq!(z_scores(&[5.0, 5.0]), vec![0.0, 0.0]);
        assert!(z_scores(&[]).is_empty());
    }
}
