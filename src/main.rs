//! pdfworks - split, merge, rotate, compress and convert PDF documents.

use clap::Parser;
use std::process;

use pdfworks::cli::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries results.
    let default_level = if cli.global.verbose { "pdfworks=debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("PDFWORKS_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    if let Err(err) = pdfworks::run(cli).await {
        eprintln!("Error: {err}");
        process::exit(err.exit_code());
    }
}
