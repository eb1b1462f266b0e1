//! Trial Simulator CLI
//!
//! Writes a synthetic clinical trial CSV for the analytics API.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;
use trial_simulator::{write_csv_file, GeneratorConfig, TrialDataGenerator};

#[derive(Parser, Debug)]
#[command(name = "trial-simulator")]
#[command(about = "Generate a synthetic clinical trial dataset")]
struct Args {
    /// Number of patient records
    #[arg(short, long, default_value = "40")]
    records: usize,

    /// RNG seed
    #[arg(short, long, default_value = "42")]
    seed: u64,

    /// Output CSV path
    #[arg(short, long, default_value = "data/clinical_trials.csv")]
    output: PathBuf,

    /// First possible enrollment date (YYYY-MM-DD)
    #[arg(long, default_value = "2024-01-01")]
    start: NaiveDate,

    /// Last possible enrollment date (YYYY-MM-DD)
    #[arg(long, default_value = "2024-06-30")]
    end: NaiveDate,

    /// Probability of replacing each non-ID cell with a null marker
    #[arg(long, default_value = "0.0")]
    null_rate: f64,

    /// Comma-separated trial sites
    #[arg(long, value_delimiter = ',')]
    sites: Vec<String>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("trial_simulator=info".parse()?))
        .init();

    let args = Args::parse();

    let defaults = GeneratorConfig::default();
    let config = GeneratorConfig {
        records: args.records,
        seed: args.seed,
        sites: if args.sites.is_empty() {
            defaults.sites.clone()
        } else {
            args.sites
        },
        start_date: args.start,
        end_date: args.end,
        null_rate: args.null_rate,
        ..defaults
    };

    info!(
        "Generating {} records (seed {}, {} sites, {} to {})",
        config.records,
        config.seed,
        config.sites.len(),
        config.start_date,
        config.end_date
    );

    let mut generator = TrialDataGenerator::new(config)?;
    let records = generator.generate();

    write_csv_file(&records, &args.output)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;

    info!("Wrote {} records to {}", records.len(), args.output.display());
    Ok(())
}
