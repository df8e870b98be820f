//! Text and JSON run reports.

use gapfill_core::{
    EnsembleEntry, EstimatorKind, GapProfile, PipelineOutput, QualityReport, RunSummary,
    SummaryStats,
};
use serde::Serialize;
use std::fmt::Write as _;
use std::io::Write;

const WEEKDAYS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];
const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Machine-readable report.
#[derive(Debug, Serialize)]
pub struct JsonReport<'a> {
    pub summary: &'a RunSummary,
    pub gaps: &'a GapProfile,
    pub imputations: Vec<&'a EnsembleEntry>,
    pub quality: &'a QualityReport,
}

impl<'a> JsonReport<'a> {
    pub fn new(output: &'a PipelineOutput) -> Self {
        Self {
            summary: &output.summary,
            gaps: &output.gaps,
            imputations: output.ensemble.entries().collect(),
            quality: &output.quality,
        }
    }
}

pub fn write_json<W: Write>(writer: W, output: &PipelineOutput) -> serde_json::Result<()> {
    serde_json::to_writer_pretty(writer, &JsonReport::new(output))
}

fn fmt_opt(value: Option<f64>, precision: usize) -> String {
    match value {
        Some(v) => format!("{:.*}", precision, v),
        None => "n/a".to_string(),
    }
}

fn fmt_stats(stats: &SummaryStats) -> String {
    format!(
        "mean {:.2}, std {}, min {:.2}, max {:.2} (n={})",
        stats.mean,
        fmt_opt(stats.std_dev, 2),
        stats.min,
        stats.max,
        stats.count
    )
}

fn fmt_counts(labels: &[&str], counts: &[usize]) -> String {
    labels
        .iter()
        .zip(counts)
        .map(|(l, c)| format!("{} {}", l, c))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Render the human-readable report.
pub fn render_text(output: &PipelineOutput) -> String {
    let s = &output.summary;
    let mut out = String::new();

    // Writing into a String cannot fail
    let _ = writeln!(out, "Gap-fill report");
    let _ = writeln!(out, "===============");
    let _ = writeln!(out, "Range:          {} .. {} ({} days)", s.start, s.end, s.n_days);
    let _ = writeln!(out, "Observed:       {}", s.n_observed);
    let _ = writeln!(out, "Missing:        {}", s.n_missing);
    let _ = writeln!(out, "Fallback dates: {}", s.n_fallback);
    let _ = writeln!(out, "Weight policy:  {:?}", s.weight_policy);

    let gaps = &output.gaps;
    if gaps.total > 0 {
        let _ = writeln!(out);
        let _ = writeln!(out, "Missing by weekday: {}", fmt_counts(&WEEKDAYS, &gaps.by_weekday));
        let _ = writeln!(out, "Missing by month:   {}", fmt_counts(&MONTHS, &gaps.by_month));
        let years: Vec<String> = gaps
            .by_year
            .iter()
            .map(|(y, c)| format!("{} {}", y, c))
            .collect();
        let _ = writeln!(out, "Missing by year:    {}", years.join(", "));
        if let Some(run) = gaps.runs_at_least(gaps.longest_run).first() {
            let _ = writeln!(
                out,
                "Longest run:        {} days ({} .. {})",
                run.length, run.start, run.end
            );
        }

        let _ = writeln!(out);
        let _ = writeln!(out, "Estimator coverage:");
        for kind in EstimatorKind::ALL {
            let covered = s.coverage.get(&kind).copied().unwrap_or(0);
            let _ = writeln!(out, "  {:<10} {}/{}", kind.name(), covered, s.n_missing);
        }

        let _ = writeln!(out);
        let _ = writeln!(out, "Imputed values:");
        for entry in output.ensemble.entries() {
            if entry.fallback {
                let _ = writeln!(
                    out,
                    "  {}  {:>12.2}  FALLBACK (global mean)",
                    entry.date, entry.value
                );
                continue;
            }
            let parts: Vec<String> = entry
                .contributions
                .iter()
                .map(|c| format!("{} {:.2}@{:.2}", c.estimator, c.value, c.weight))
                .collect();
            let _ = writeln!(
                out,
                "  {}  {:>12.2}  spread {:>10}  [{}]",
                entry.date,
                entry.value,
                fmt_opt(entry.spread(), 2),
                parts.join(", ")
            );
        }
    }

    let q = &output.quality;
    let _ = writeln!(out);
    let _ = writeln!(out, "Quality:");
    let _ = writeln!(out, "  original:   {}", fmt_stats(&q.original));
    let _ = writeln!(out, "  completed:  {}", fmt_stats(&q.completed));
    if let Some(imputed) = &q.imputed {
        let _ = writeln!(out, "  imputed:    {}", fmt_stats(imputed));
    }
    let _ = writeln!(out, "  mean shift: {:.4}", q.mean_shift());
    let _ = writeln!(out, "  outliers:   {} of {}", q.outlier_count, q.n_imputed);
    let _ = writeln!(
        out,
        "  consistency score: {} (over {} dates)",
        fmt_opt(q.consistency_score, 4),
        q.n_consistency_dates
    );
    let _ = writeln!(
        out,
        "  mean relative deviation: {}%",
        fmt_opt(q.mean_relative_deviation_pct, 2)
    );

    out
}
