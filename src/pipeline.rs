//! End-to-end analysis driver
//!
//! Strict batch sequence: split, screen the three candidate families by
//! cross-validated ROC-AUC, grid-search the winning family, refit the best
//! combination on the full training subset, score the untouched test
//! subset. Parallelism lives inside the fold and grid evaluations; the
//! stages themselves run in order.

use crate::config::RunConfig;
use crate::data::{ColumnSummary, Dataset};
use crate::error::Result;
use crate::evaluation::{cross_validate, finalize, grid_search, FinalReport, TuningEntry};
use crate::metrics::CvScores;
use crate::split::{stratified_kfold, train_test_split};
use crate::training::{FittedModel, ModelSpec};
use tracing::info;

/// One screened candidate family with its fold scores
#[derive(Debug, Clone)]
pub struct ComparisonEntry {
    pub spec: ModelSpec,
    pub scores: CvScores,
}

/// The full output of one analysis run
#[derive(Debug)]
pub struct AnalysisReport {
    pub n_records: usize,
    pub n_train: usize,
    pub n_test: usize,
    pub positive_fraction: f64,
    pub column_summaries: Vec<ColumnSummary>,
    /// Candidate families ranked by mean cross-validated AUC
    pub comparison: Vec<ComparisonEntry>,
    /// Grid cells of the winning family, ranked
    pub tuning: Vec<TuningEntry>,
    pub final_report: FinalReport,
    /// The one model that persists past evaluation
    pub final_model: FittedModel,
}

/// Run the whole report
pub fn run_analysis(dataset: &Dataset, config: &RunConfig) -> Result<AnalysisReport> {
    let column_summaries = dataset.summaries()?;
    let positive_fraction = dataset.positive_fraction()?;

    let (train, test) = train_test_split(dataset, config.train_fraction, config.seed)?;
    info!(
        train = train.n_records(),
        test = test.n_records(),
        "stratified split complete"
    );

    let folds = stratified_kfold(&train, config.folds, config.seed)?;

    // Screening pass: same folds, same seed for every family
    let mut comparison: Vec<ComparisonEntry> = config
        .candidates
        .iter()
        .map(|spec| {
            let scores = cross_validate(spec, &train, &folds, config.recipe_neighbors, config.seed)?;
            info!(
                family = spec.family(),
                mean_auc = scores.mean,
                std = scores.std,
                "screened candidate"
            );
            Ok(ComparisonEntry {
                spec: spec.clone(),
                scores,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    comparison.sort_by(|a, b| {
        b.scores
            .mean
            .partial_cmp(&a.scores.mean)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.spec.complexity_key().cmp(&b.spec.complexity_key()))
    });

    let winner = &comparison[0].spec;
    info!(family = winner.family(), "tuning the winning family");

    let tuning = grid_search(
        config.grid_for(winner),
        &train,
        &folds,
        config.recipe_neighbors,
        config.seed,
    )?;
    let best = tuning[0].spec.clone();

    let (final_model, final_report) = finalize(
        &best,
        &train,
        &test,
        config.recipe_neighbors,
        config.threshold,
        config.seed,
    )?;

    Ok(AnalysisReport {
        n_records: dataset.n_records(),
        n_train: train.n_records(),
        n_test: test.n_records(),
        positive_fraction,
        column_summaries,
        comparison,
        tuning,
        final_report,
        final_model,
    })
}
