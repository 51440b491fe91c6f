//! Fabula CLI binary.
//!
//! Operator access to the usage gate:
//! - Check, record, acquire and refund feature uses
//! - Inspect and reset a user's monthly usage
//! - Print the effective allowance table

use clap::Parser;

mod cli;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use cli::{Cli, run_command};

    let cli = Cli::parse();

    let log_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let outcome = run_command(&cli).await?;
    if !outcome.success() {
        std::process::exit(1);
    }

    Ok(())
}
