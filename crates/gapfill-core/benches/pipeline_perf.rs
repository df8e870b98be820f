//! Performance benchmark for the imputation pipeline on long daily series
//!
//! Run with: cargo bench --bench pipeline_perf

use chrono::{Duration, NaiveDate};
use gapfill_core::{
    ArimaForecaster, Estimator, ImputationConfig, LinearInterpolator, NeighborImputer,
    Observation, SeasonalDecomposer, Series, SplineInterpolator,
};
use std::time::{Duration as StdDuration, Instant};

fn generate_demand_series(n_days: usize, gap_every: usize) -> Series {
    let start = NaiveDate::from_ymd_opt(2005, 1, 1).expect("valid date");
    let observations = (0..n_days)
        .filter(|i| *i == 0 || *i == n_days - 1 || i % gap_every != 0)
        .map(|i| {
            let trend = 0.02 * i as f64;
            let weekly = 30.0 * (2.0 * std::f64::consts::PI * i as f64 / 7.0).sin();
            let yearly = 80.0 * (2.0 * std::f64::consts::PI * i as f64 / 365.25).cos();
            Observation::new(
                start + Duration::days(i as i64),
                1000.0 + trend + weekly + yearly + (i % 13) as f64,
            )
        });
    Series::from_observations(observations).expect("synthetic series is valid")
}

fn benchmark_fn<F, R>(name: &str, iterations: usize, mut f: F) -> StdDuration
where
    F: FnMut() -> R,
{
    // Warmup
    let _ = f();

    let start = Instant::now();
    for _ in 0..iterations {
        let _ = std::hint::black_box(f());
    }
    let elapsed = start.elapsed();
    let per_iter = elapsed / iterations as u32;
    println!(
        "{}: total={:?}, per_iter={:?}, iters={}",
        name, elapsed, per_iter, iterations
    );
    elapsed
}

fn main() {
    println!("=== Imputation Pipeline Benchmark ===\n");

    let lengths = [365, 1825, 7000];

    println!("--- 1. Individual Estimators ---\n");

    for &n in &lengths {
        let series = generate_demand_series(n, 17);
        let missing = series.missing_dates();
        println!("Series length: {} ({} missing)", n, missing.len());

        let estimators: Vec<(&str, Box<dyn Estimator>)> = vec![
            ("linear", Box::new(LinearInterpolator) as Box<dyn Estimator>),
            ("spline", Box::new(SplineInterpolator) as Box<dyn Estimator>),
            ("seasonal", Box::new(SeasonalDecomposer::default()) as Box<dyn Estimator>),
            ("neighbors", Box::new(NeighborImputer::default()) as Box<dyn Estimator>),
        ];
        for (name, estimator) in &estimators {
            let iters = if n <= 1825 { 20 } else { 3 };
            benchmark_fn(&format!("  {}", name), iters, || {
                estimator.estimate(&series, missing)
            });
        }

        // One ARIMA fit per gap dominates the run
        benchmark_fn("  forecast", 1, || {
            ArimaForecaster::default().estimate(&series, missing)
        });
        println!();
    }

    println!("--- 2. Full Pipeline ---\n");

    for &n in &lengths {
        let series = generate_demand_series(n, 17);
        let config = ImputationConfig::default();
        benchmark_fn(&format!("run(n={})", n), 1, || gapfill_core::run(&series, &config));
    }

    println!("\n=== Benchmark Complete ===");
}
