//! Command-line arguments.

use clap::Parser;
use gapfill_core::{
    EnsembleWeights, ForecasterOptions, ImputationConfig, NeighborOptions, NeighborhoodWindow,
    QualityOptions, WeightPolicy,
};
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(name = "gapfill")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Fill missing dates in a daily demand series with an estimator ensemble", long_about = None)]
pub struct Cli {
    /// Input file with a date column and a numeric demand column
    pub input: PathBuf,

    /// Completed series (CSV); stdout when omitted
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Human-readable report; stderr when omitted
    #[arg(short, long)]
    pub report: Option<PathBuf>,

    /// Machine-readable report (JSON)
    #[arg(long)]
    pub json_report: Option<PathBuf>,

    /// Name of the date column (case-insensitive)
    #[arg(long, default_value = "date")]
    pub date_column: String,

    /// Name of the demand column; the first non-date column when omitted
    #[arg(long)]
    pub value_column: Option<String>,

    /// Field delimiter of the input
    #[arg(long, default_value_t = ',')]
    pub delimiter: char,

    /// Weight policy (fixed, normalized)
    #[arg(long, default_value = "fixed")]
    pub weight_policy: WeightPolicy,

    /// Neighbours averaged by the KNN imputer
    #[arg(short = 'k', long, default_value_t = 7)]
    pub neighbors: usize,

    /// Seasonal period of the decomposition imputer, in days
    #[arg(long, default_value_t = 7)]
    pub period: usize,

    /// Prior observations required before fitting ARIMA
    #[arg(long, default_value_t = 30)]
    pub min_history: usize,

    /// |z| above which an imputed value is reported as an outlier
    #[arg(long, default_value_t = 3.0)]
    pub z_threshold: f64,

    /// Radius of the observed neighbourhood used for consistency
    #[arg(long, default_value_t = 7)]
    pub neighborhood_days: usize,

    /// Neighbourhood window (calendar, observations)
    #[arg(long, default_value = "calendar")]
    pub neighborhood_window: NeighborhoodWindow,
}

impl Cli {
    pub fn config(&self) -> ImputationConfig {
        ImputationConfig {
            weights: EnsembleWeights::default(),
            weight_policy: self.weight_policy,
            seasonal_period: self.period,
            forecaster: ForecasterOptions {
                min_history: self.min_history,
                ..Default::default()
            },
            neighbors: NeighborOptions { k: self.neighbors },
            quality: QualityOptions {
                z_threshold: self.z_threshold,
                neighborhood_days: self.neighborhood_days,
                window: self.neighborhood_window,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_library_defaults() {
        let cli = Cli::parse_from(["gapfill", "demand.csv"]);
        assert_eq!(cli.config(), ImputationConfig::default());
        assert!(cli.output.is_none());
        assert_eq!(cli.delimiter, ',');
    }

    #[test]
    fn test_flags() {
        let cli = Cli::parse_from([
            "gapfill",
            "demand.csv",
            "--weight-policy",
            "normalized",
            "-k",
            "5",
            "--value-column",
            "qty",
            "--z-threshold",
            "2.5",
            "--neighborhood-window",
            "observations",
        ]);
        let config = cli.config();
        assert_eq!(config.weight_policy, WeightPolicy::Normalized);
        assert_eq!(config.neighbors.k, 5);
        assert_eq!(config.quality.z_threshold, 2.5);
        assert_eq!(config.quality.window, NeighborhoodWindow::Observations);
        assert_eq!(cli.value_column.as_deref(), Some("qty"));
    }

    #[test]
    fn test_unknown_policy_is_rejected() {
        assert!(Cli::try_parse_from(["gapfill", "x.csv", "--weight-policy", "adaptive"]).is_err());
    }
}
