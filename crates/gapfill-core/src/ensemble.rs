//! Fixed-weight combination of estimator outputs per missing date.

use crate::error::{ImputeError, Result};
use crate::estimator::{Estimate, EstimatorKind};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;
use std::str::FromStr;

/// Per-estimator ensemble weights.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EnsembleWeights {
    pub linear: f64,
    pub spline: f64,
    pub seasonal: f64,
    pub forecast: f64,
    pub neighbors: f64,
}

impl Default for EnsembleWeights {
    fn default() -> Self {
        Self {
            linear: 0.10,
            spline: 0.25,
            seasonal: 0.30,
            forecast: 0.25,
            neighbors: 0.10,
        }
    }
}

impl EnsembleWeights {
    pub fn weight(&self, kind: EstimatorKind) -> f64 {
        match kind {
            EstimatorKind::Linear => self.linear,
            EstimatorKind::Spline => self.spline,
            EstimatorKind::Seasonal => self.seasonal,
            EstimatorKind::Forecast => self.forecast,
            EstimatorKind::Neighbors => self.neighbors,
        }
    }

    pub fn total(&self) -> f64 {
        EstimatorKind::ALL.iter().map(|&k| self.weight(k)).sum()
    }

    pub fn validate(&self) -> Result<()> {
        for kind in EstimatorKind::ALL {
            let w = self.weight(kind);
            if !w.is_finite() || w < 0.0 {
                return Err(ImputeError::invalid_parameter(
                    &format!("weight.{}", kind),
                    w,
                    "must be a finite, non-negative number",
                ));
            }
        }
        if self.total() <= 0.0 {
            return Err(ImputeError::invalid_parameter(
                "weights",
                self.total(),
                "at least one weight must be positive",
            ));
        }
        Ok(())
    }
}

/// How contributing weights are turned into a final value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightPolicy {
    /// `sum(w * v)` over contributing estimators, weights used as given.
    /// A date with a single contributor is scaled by that weight.
    #[default]
    Fixed,
    /// `sum(w * v) / sum(w)` over contributing estimators
    Normalized,
}

impl FromStr for WeightPolicy {
    type Err = ImputeError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fixed" | "literal" | "raw" => Ok(Self::Fixed),
            "normalized" | "normalised" | "normalize" => Ok(Self::Normalized),
            _ => Err(ImputeError::invalid_parameter(
                "weight_policy",
                s,
                "expected 'fixed' or 'normalized'",
            )),
        }
    }
}

/// One estimator's share in a final value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Contribution {
    pub estimator: EstimatorKind,
    pub value: f64,
    pub weight: f64,
}

/// Final value for one missing date plus its audit trail.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnsembleEntry {
    pub date: NaiveDate,
    pub value: f64,
    /// Contributions in estimator order; empty when `fallback` is set
    pub contributions: Vec<Contribution>,
    pub weight_sum: f64,
    /// The global mean was substituted because no estimator contributed
    pub fallback: bool,
}

impl EnsembleEntry {
    /// Range of the contributing estimates.
    pub fn spread(&self) -> Option<f64> {
        let values = self.contributions.iter().map(|c| c.value);
        let min = values.clone().fold(f64::INFINITY, f64::min);
        let max = values.fold(f64::NEG_INFINITY, f64::max);
        (!self.contributions.is_empty()).then_some(max - min)
    }
}

/// Combined values for every missing date.
#[derive(Debug, Clone, Default, Serialize)]
pub struct EnsembleResult {
    entries: BTreeMap<NaiveDate, EnsembleEntry>,
}

impl EnsembleResult {
    pub fn get(&self, date: NaiveDate) -> Option<&EnsembleEntry> {
        self.entries.get(&date)
    }

    pub fn value(&self, date: NaiveDate) -> Option<f64> {
        self.entries.get(&date).map(|e| e.value)
    }

    pub fn entries(&self) -> impl Iterator<Item = &EnsembleEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Dates where the global-mean fallback was used.
    pub fn fallback_dates(&self) -> Vec<NaiveDate> {
        self.entries
            .values()
            .filter(|e| e.fallback)
            .map(|e| e.date)
            .collect()
    }

    /// Number of dates each estimator contributed to.
    pub fn coverage(&self) -> BTreeMap<EstimatorKind, usize> {
        let mut counts: BTreeMap<EstimatorKind, usize> =
            EstimatorKind::ALL.iter().map(|&k| (k, 0)).collect();
        for c in self.entries.values().flat_map(|e| e.contributions.iter()) {
            *counts.entry(c.estimator).or_insert(0) += 1;
        }
        counts
    }
}

/// Combine contributions under `policy`. `None` if nothing usable
/// contributed.
pub fn weighted_value(contributions: &[Contribution], policy: WeightPolicy) -> Option<f64> {
    if contributions.is_empty() {
        return None;
    }
    let weighted: f64 = contributions.iter().map(|c| c.weight * c.value).sum();
    match policy {
        WeightPolicy::Fixed => Some(weighted),
        WeightPolicy::Normalized => {
            let total: f64 = contributions.iter().map(|c| c.weight).sum();
            (total > 0.0).then(|| weighted / total)
        }
    }
}

/// Merges estimator outputs into one value per missing date.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnsembleCombiner {
    pub weights: EnsembleWeights,
    pub policy: WeightPolicy,
}

impl EnsembleCombiner {
    pub fn new(weights: EnsembleWeights, policy: WeightPolicy) -> Self {
        Self { weights, policy }
    }

    /// Combine `estimates` for each date in `missing`; dates with no
    /// contributor get `global_mean` and are flagged.
    pub fn combine(
        &self,
        missing: &[NaiveDate],
        estimates: &[Estimate],
        global_mean: f64,
    ) -> EnsembleResult {
        let by_kind: BTreeMap<EstimatorKind, &Estimate> = estimates
            .iter()
            .rev()
            .map(|e| (e.kind, e))
            .collect();

        let mut entries = BTreeMap::new();
        for &date in missing {
            let contributions: Vec<Contribution> = by_kind
                .iter()
                .filter_map(|(&kind, est)| {
                    est.get(date).map(|value| Contribution {
                        estimator: kind,
                        value,
                        weight: self.weights.weight(kind),
                    })
                })
                .collect();

            let entry = match weighted_value(&contributions, self.policy) {
                Some(value) => EnsembleEntry {
                    date,
                    value,
                    weight_sum: contributions.iter().map(|c| c.weight).sum(),
                    contributions,
                    fallback: false,
                },
                None => {
                    tracing::warn!(%date, global_mean, "no estimator produced a value, using global mean");
                    EnsembleEntry {
                        date,
                        value: global_mean,
                        contributions: Vec::new(),
                        weight_sum: 0.0,
                        fallback: true,
                    }
                }
            };
            entries.insert(date, entry);
        }

        EnsembleResult { entries }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 3, d).unwrap()
    }

    fn estimate(kind: EstimatorKind, values: &[(NaiveDate, f64)]) -> Estimate {
        let mut e = Estimate::new(kind);
        for &(d, v) in values {
            e.insert(d, v);
        }
        e
    }

    #[test]
    fn test_three_contributors_fixed_weights() {
        let estimates = vec![
            estimate(EstimatorKind::Spline, &[(day(1), 100.0)]),
            estimate(EstimatorKind::Seasonal, &[(day(1), 200.0)]),
            estimate(EstimatorKind::Neighbors, &[(day(1), 300.0)]),
            estimate(EstimatorKind::Linear, &[]),
            estimate(EstimatorKind::Forecast, &[]),
        ];
        let result = EnsembleCombiner::default().combine(&[day(1)], &estimates, 0.0);
        let entry = result.get(day(1)).unwrap();
        assert_relative_eq!(entry.value, 115.0, epsilon = 1e-9);
        assert_relative_eq!(entry.weight_sum, 0.65, epsilon = 1e-12);
        assert!(!entry.fallback);
        let order: Vec<EstimatorKind> = entry.contributions.iter().map(|c| c.estimator).collect();
        assert_eq!(
            order,
            vec![
                EstimatorKind::Spline,
                EstimatorKind::Seasonal,
                EstimatorKind::Neighbors
            ]
        );
    }

    #[test]
    fn test_normalized_policy() {
        let estimates = vec![
            estimate(EstimatorKind::Spline, &[(day(1), 100.0)]),
            estimate(EstimatorKind::Seasonal, &[(day(1), 200.0)]),
            estimate(EstimatorKind::Neighbors, &[(day(1), 300.0)]),
        ];
        let combiner = EnsembleCombiner::new(EnsembleWeights::default(), WeightPolicy::Normalized);
        let result = combiner.combine(&[day(1)], &estimates, 0.0);
        assert_relative_eq!(result.value(day(1)).unwrap(), 115.0 / 0.65, epsilon = 1e-9);
    }

    #[test]
    fn test_single_contributor_is_scaled_by_weight() {
        let estimates = vec![estimate(EstimatorKind::Linear, &[(day(2), 500.0)])];
        let result = EnsembleCombiner::default().combine(&[day(2)], &estimates, 0.0);
        assert_relative_eq!(result.value(day(2)).unwrap(), 50.0, epsilon = 1e-9);
    }

    #[test]
    fn test_all_five_is_a_weighted_mean() {
        let values = [10.0, 20.0, 30.0, 40.0, 50.0];
        let estimates: Vec<Estimate> = EstimatorKind::ALL
            .iter()
            .zip(values.iter())
            .map(|(&k, &v)| estimate(k, &[(day(3), v)]))
            .collect();
        let result = EnsembleCombiner::default().combine(&[day(3)], &estimates, 0.0);
        let expected = 0.10 * 10.0 + 0.25 * 20.0 + 0.30 * 30.0 + 0.25 * 40.0 + 0.10 * 50.0;
        assert_relative_eq!(result.value(day(3)).unwrap(), expected, epsilon = 1e-9);
        assert_relative_eq!(result.get(day(3)).unwrap().spread().unwrap(), 40.0);
    }

    #[test]
    fn test_fallback_is_flagged() {
        let estimates = vec![estimate(EstimatorKind::Spline, &[(day(1), 1.0)])];
        let result = EnsembleCombiner::default().combine(&[day(1), day(4)], &estimates, 777.0);
        let entry = result.get(day(4)).unwrap();
        assert!(entry.fallback);
        assert_eq!(entry.value, 777.0);
        assert!(entry.contributions.is_empty());
        assert_eq!(result.fallback_dates(), vec![day(4)]);
        assert_eq!(result.coverage()[&EstimatorKind::Spline], 1);
        assert_eq!(result.coverage()[&EstimatorKind::Linear], 0);
    }

    #[test]
    fn test_weight_validation_and_policy_parsing() {
        assert!(EnsembleWeights::default().validate().is_ok());
        let negative = EnsembleWeights {
            spline: -0.1,
            ..Default::default()
        };
        assert!(negative.validate().is_err());
        assert_eq!("Normalized".parse::<WeightPolicy>().unwrap(), WeightPolicy::Normalized);
        assert_eq!("fixed".parse::<WeightPolicy>().unwrap(), WeightPolicy::Fixed);
        assert!("adaptive".parse::<WeightPolicy>().is_err());
    }
}
