use clap::Parser;
use gapfill_cli::{exit_code, run, Cli};
use std::process::ExitCode;

fn main() -> ExitCode {
    // stdout may carry the completed CSV, so logs go to stderr
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gapfill_core=info,gapfill_cli=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match run(&cli) {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {:#}", err);
            ExitCode::from(exit_code(&err))
        }
    }
}
