//! Command-line boundary for the gapfill imputation ensemble.
//!
//! Reads the input file, runs the core pipeline and writes the completed
//! series and reports. All file handles are scoped to the function that
//! opens them.

pub mod args;
pub mod input;
pub mod output;
pub mod report;

use anyhow::{Context, Result};
use gapfill_core::{ImputeError, PipelineOutput};
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;

pub use args::Cli;
pub use input::{decode_bytes, read_series, ReadOptions};

/// Exit code for an error chain: the [`ImputeError`] code when one is
/// present, 1 otherwise.
pub fn exit_code(err: &anyhow::Error) -> u8 {
    err.chain()
        .find_map(|e| e.downcast_ref::<ImputeError>())
        .map_or(1, ImputeError::exit_code)
}

fn read_options(cli: &Cli) -> Result<ReadOptions> {
    if !cli.delimiter.is_ascii() {
        return Err(ImputeError::InvalidParameter {
            param: "delimiter".to_string(),
            value: cli.delimiter.to_string(),
            reason: "must be a single ASCII character".to_string(),
        }
        .into());
    }
    Ok(ReadOptions {
        date_column: cli.date_column.clone(),
        value_column: cli.value_column.clone(),
        delimiter: cli.delimiter as u8,
    })
}

fn create(path: &Path) -> Result<BufWriter<File>> {
    let file =
        File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    Ok(BufWriter::new(file))
}

/// Run the whole tool for parsed arguments.
pub fn run(cli: &Cli) -> Result<PipelineOutput> {
    let config = cli.config();
    config.validate()?;
    let options = read_options(cli)?;

    let bytes =
        fs::read(&cli.input).with_context(|| format!("failed to read {}", cli.input.display()))?;
    let (text, encoding) = decode_bytes(&bytes)?;
    tracing::info!(path = %cli.input.display(), encoding = encoding.name(), "input decoded");

    let series = read_series(&text, &options)?;
    let output = gapfill_core::run(&series, &config)?;

    match &cli.output {
        Some(path) => {
            let mut writer = create(path)?;
            output::write_completed(&mut writer, &output)?;
            writer.flush()?;
            tracing::info!(path = %path.display(), rows = output.completed().len(), "completed series written");
        }
        None => output::write_completed(io::stdout().lock(), &output)?,
    }

    let text_report = report::render_text(&output);
    match &cli.report {
        Some(path) => fs::write(path, text_report)
            .with_context(|| format!("failed to write {}", path.display()))?,
        None => io::stderr().write_all(text_report.as_bytes())?,
    }

    if let Some(path) = &cli.json_report {
        let mut writer = create(path)?;
        report::write_json(&mut writer, &output)?;
        writer.flush()?;
    }

    Ok(output)
}
