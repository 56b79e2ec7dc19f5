mod application;
mod presentation;

use std::process::ExitCode;

use clap::Parser;
use presentation::cli::Cli;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match application::run(cli) {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "splitpack failed");
            ExitCode::FAILURE
        }
    }
}
