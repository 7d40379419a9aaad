//! namewright: preview-then-commit bulk renamer.
//!
//! Thin binary entry point. All logic lives in the `namewright-core`
//! and `namewright-cli` crates.
use clap::Parser;
use std::process::ExitCode;

fn main() -> anyhow::Result<ExitCode> {
    let cli = namewright_cli::Cli::parse();

    // Logs go to stderr so stdout stays clean for previews and JSON.
    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!("namewright starting");

    namewright_cli::run(cli)
}
