//! Distance-weighted k-nearest-neighbour imputation over calendar features.
//!
//! Every calendar date becomes a row of calendar features plus the target.
//! All columns are standardized together, the target is imputed from the
//! `k` nearest rows that have it, then mapped back to the original scale.

use crate::error::{ImputeError, Result};
use crate::estimator::{Estimate, Estimator, EstimatorKind};
use crate::features::calendar_features;
use crate::series::Series;
use chrono::NaiveDate;

/// Neighbour imputer options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NeighborOptions {
    /// Number of donor rows averaged per gap
    pub k: usize,
}

impl Default for NeighborOptions {
    fn default() -> Self {
        Self { k: 7 }
    }
}

impl NeighborOptions {
    pub fn validate(&self) -> Result<()> {
        if self.k == 0 {
            return Err(ImputeError::invalid_parameter("k", self.k, "must be at least 1"));
        }
        Ok(())
    }
}

/// Per-column standardization fit on the non-missing entries.
#[derive(Debug, Clone)]
pub struct StandardScaler {
    mean: Vec<f64>,
    scale: Vec<f64>,
}

impl StandardScaler {
    /// Fit column means and population standard deviations. Columns with
    /// zero variance (or no values) get a unit scale.
    pub fn fit(rows: &[Vec<Option<f64>>], n_cols: usize) -> Self {
        let mut mean = vec![0.0; n_cols];
        let mut scale = vec![1.0; n_cols];

        for col in 0..n_cols {
            let values: Vec<f64> = rows.iter().filter_map(|r| r[col]).collect();
            if values.is_empty() {
                continue;
            }
            let n = values.len() as f64;
            let m = values.iter().sum::<f64>() / n;
            let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / n;
            mean[col] = m;
            if var > 0.0 {
                scale[col] = var.sqrt();
            }
        }

        Self { mean, scale }
    }

    pub fn transform(&self, rows: &[Vec<Option<f64>>]) -> Vec<Vec<Option<f64>>> {
        rows.iter()
            .map(|r| {
                r.iter()
                    .enumerate()
                    .map(|(c, v)| v.map(|v| (v - self.mean[c]) / self.scale[c]))
                    .collect()
            })
            .collect()
    }

    pub fn inverse(&self, col: usize, value: f64) -> f64 {
        value * self.scale[col] + self.mean[col]
    }
}

/// Euclidean distance over coordinates present in both rows, scaled up by
/// `total / present` to account for the skipped ones. `None` when the rows
/// share no coordinate.
fn nan_euclidean(a: &[Option<f64>], b: &[Option<f64>]) -> Option<f64> {
    let mut sum = 0.0;
    let mut present = 0usize;
    for (x, y) in a.iter().zip(b.iter()) {
        if let (Some(x), Some(y)) = (x, y) {
            sum += (x - y).powi(2);
            present += 1;
        }
    }
    (present > 0).then(|| (sum * a.len() as f64 / present as f64).sqrt())
}

/// Impute column `target` for each row in `receivers` from the `k` nearest
/// donor rows that have it, weighting donors by inverse distance.
///
/// Donors at distance zero take all the weight. A receiver with no usable
/// donor gets the donor mean of the column. Returns `None` when no row has
/// the column at all.
pub fn knn_impute(
    rows: &[Vec<Option<f64>>],
    target: usize,
    receivers: &[usize],
    k: usize,
) -> Vec<Option<f64>> {
    let donors: Vec<usize> = (0..rows.len()).filter(|&i| rows[i][target].is_some()).collect();
    if donors.is_empty() {
        return vec![None; receivers.len()];
    }
    let donor_mean =
        donors.iter().filter_map(|&i| rows[i][target]).sum::<f64>() / donors.len() as f64;

    receivers
        .iter()
        .map(|&r| {
            let mut candidates: Vec<(f64, usize)> = donors
                .iter()
                .filter(|&&d| d != r)
                .filter_map(|&d| nan_euclidean(&rows[r], &rows[d]).map(|dist| (dist, d)))
                .collect();

            if candidates.is_empty() {
                return Some(donor_mean);
            }

            candidates.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
            candidates.truncate(k);

            let exact = candidates.iter().any(|(dist, _)| *dist == 0.0);
            let (num, den) = candidates.iter().fold((0.0, 0.0), |(num, den), &(dist, d)| {
                let w = if exact {
                    if dist == 0.0 {
                        1.0
                    } else {
                        0.0
                    }
                } else {
                    1.0 / dist
                };
                // donors always carry the target
                let v = rows[d][target].unwrap_or(donor_mean);
                (num + w * v, den + w)
            });

            Some(num / den)
        })
        .collect()
}

/// KNN imputer over calendar features and the target value.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeighborImputer {
    pub options: NeighborOptions,
}

impl NeighborImputer {
    pub fn new(options: NeighborOptions) -> Self {
        Self { options }
    }
}

impl Estimator for NeighborImputer {
    fn kind(&self) -> EstimatorKind {
        EstimatorKind::Neighbors
    }

    fn estimate(&self, series: &Series, missing: &[NaiveDate]) -> Estimate {
        let mut estimate = Estimate::new(self.kind());

        let rows: Vec<Vec<Option<f64>>> = series
            .calendar()
            .zip(series.values().iter())
            .map(|(date, value)| {
                let mut row: Vec<Option<f64>> =
                    calendar_features(date).iter().map(|&f| Some(f)).collect();
                row.push(*value);
                row
            })
            .collect();
        let n_cols = rows.first().map_or(0, |r| r.len());
        let target = n_cols.saturating_sub(1);

        let scaler = StandardScaler::fit(&rows, n_cols);
        let scaled = scaler.transform(&rows);

        let targets: Vec<(NaiveDate, usize)> = missing
            .iter()
            .filter_map(|&date| series.index_of(date).map(|i| (date, i)))
            .filter(|&(_, i)| series.values()[i].is_none())
            .collect();
        let receivers: Vec<usize> = targets.iter().map(|&(_, i)| i).collect();

        let imputed = knn_impute(&scaled, target, &receivers, self.options.k);
        for ((date, _), value) in targets.iter().zip(imputed) {
            match value {
                Some(v) => estimate.insert(*date, scaler.inverse(target, v)),
                None => tracing::debug!(%date, "neighbors: no donors"),
            }
        }

        estimate
    }
}
