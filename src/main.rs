//! Chili conformance CLI
//!
//! Runs the conformance scenarios against a chili runner binary.

use std::io::Write;
use std::process::ExitCode;

use clap::Parser;

use chili_conformance::cli::Cli;
use chili_conformance::{Harness, Result};

const EXIT_FAILED: u8 = 1;
const EXIT_FATAL: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    // Logs go to stderr; stdout carries the scenario lines.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(&cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(EXIT_FAILED),
        Err(e) => {
            tracing::error!(error = %e, "conformance run aborted");
            eprintln!("error: {}", e);
            ExitCode::from(EXIT_FATAL)
        }
    }
}

/// Returns whether every selected scenario passed.
async fn run(cli: &Cli) -> Result<bool> {
    let harness = Harness::new(cli.harness_config()?)?;
    let mut stdout = std::io::stdout().lock();

    if cli.list {
        harness.list(&mut stdout)?;
        return Ok(true);
    }

    let summary = harness.run(&mut stdout).await?;

    if cli.json {
        writeln!(stdout, "{}", serde_json::to_string_pretty(&summary)?)?;
    }

    Ok(summary.passed())
}
