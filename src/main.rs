//! churnprep: Churn Feature Preparation CLI Tool
//!
//! Splits a customer table, fits the preparation recipe on the training rows
//! and writes numeric matrices, or scores classifier predictions.

use anyhow::Result;
use clap::Parser;

use churnprep::cli::{run_evaluate, run_prepare, Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();

    match &cli.command {
        Commands::Prepare(args) => run_prepare(args),
        Commands::Evaluate(args) => run_evaluate(args),
    }
}
