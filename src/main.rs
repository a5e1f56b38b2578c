//! harvest-ml - Main entry point
//!
//! Runs the whole analysis report over a delimited clinical dataset.

use clap::Parser;
use harvest_ml::data::load_csv;
use harvest_ml::{report, run_analysis, RunConfig};

/// Cross-validated model selection and tuning for stem-cell collection
/// outcome data
#[derive(Parser, Debug)]
#[command(name = "harvest", version, about)]
struct Cli {
    /// Path to the input CSV file
    data: String,

    /// Outcome column name
    #[arg(long, default_value = "poor_recovery")]
    outcome: String,

    /// Seed for every pseudo-random stream
    #[arg(long, default_value_t = 100)]
    seed: u64,

    /// Fraction of records assigned to the training subset
    #[arg(long, default_value_t = 0.75)]
    train_fraction: f64,

    /// Number of cross-validation folds
    #[arg(long, default_value_t = 10)]
    folds: usize,

    /// Probability threshold for the final confusion matrix
    #[arg(long, default_value_t = 0.5)]
    threshold: f64,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "harvest=info".into()),
        )
        .init();

    let cli = Cli::parse();

    let config = RunConfig::new()
        .with_outcome(cli.outcome.clone())
        .with_seed(cli.seed)
        .with_train_fraction(cli.train_fraction)
        .with_folds(cli.folds)
        .with_threshold(cli.threshold);

    let dataset = load_csv(&cli.data, &config.outcome_column)?;
    let analysis = run_analysis(&dataset, &config)?;
    report::render(&analysis);

    Ok(())
}
