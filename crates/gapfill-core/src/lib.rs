//! Ensemble imputation of missing dates in a daily demand series.
//!
//! Five independent estimators (linear, cubic spline, seasonal
//! decomposition, ARIMA forecast, calendar-feature KNN) each propose values
//! for the gaps; a fixed-weight combiner merges them and a quality
//! evaluator scores the result.

pub mod decomposition;
pub mod ensemble;
pub mod error;
pub mod estimator;
pub mod features;
pub mod forecast;
pub mod gaps;
pub mod imputation;
pub mod neighbors;
pub mod pipeline;
pub mod quality;
pub mod series;
pub mod spline;
pub mod stats;

// Re-exports for convenience
pub use decomposition::{decompose_additive, SeasonalDecomposer, SeasonalDecomposition};
pub use ensemble::{
    weighted_value, Contribution, EnsembleCombiner, EnsembleEntry, EnsembleResult,
    EnsembleWeights, WeightPolicy,
};
pub use error::{ImputeError, Result};
pub use estimator::{Estimate, Estimator, EstimatorKind};
pub use features::{calendar_features, CALENDAR_FEATURES};
pub use forecast::{
    arima_one_step, forecast_next, ArimaForecaster, ForecastSource, ForecastStep,
    ForecasterOptions,
};
pub use gaps::{profile_gaps, GapProfile, GapRun};
pub use imputation::{interpolate_linear, LinearInterpolator};
pub use neighbors::{knn_impute, NeighborImputer, NeighborOptions};
pub use pipeline::{
    default_estimators, run, run_with, CompletedDay, ImputationConfig, PipelineOutput, RunSummary,
};
pub use quality::{evaluate_quality, NeighborhoodWindow, QualityOptions, QualityReport};
pub use series::{parse_date, parse_value, Observation, Series, DATE_FORMATS};
pub use spline::{CubicSpline, SplineInterpolator};
pub use stats::SummaryStats;
