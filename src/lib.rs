//! harvest-ml - Cross-validated model selection for stem-cell collection outcomes
//!
//! This crate implements a single batch analysis pipeline over a small
//! clinical dataset of stem-cell collection events:
//!
//! 1. Load a delimited tabular file and coerce column types
//! 2. Partition records into stratified train/test subsets and k folds
//! 3. Fit a leakage-safe preprocessing recipe (k-NN imputation + dummy
//!    encoding) per fold
//! 4. Cross-validate three classifier families on ROC-AUC
//! 5. Grid-search hyperparameters of the best family
//! 6. Refit on the full training subset and score the held-out test subset
//!
//! # Modules
//!
//! - [`data`] - Dataset schema, loading, column statistics
//! - [`split`] - Stratified train/test split and k-fold generation
//! - [`preprocessing`] - Fit-once apply-many imputation and encoding recipe
//! - [`training`] - Random forest, k-NN, and gradient boosting candidates
//! - [`metrics`] - ROC-AUC, confusion matrix, fold-score aggregation
//! - [`evaluation`] - Cross-validation evaluator, grid tuner, final scoring
//! - [`report`] - Terminal rendering of the analysis report
//! - [`config`] - Run configuration
//! - [`pipeline`] - End-to-end driver

pub mod error;

pub mod config;
pub mod data;
pub mod evaluation;
pub mod metrics;
pub mod pipeline;
pub mod preprocessing;
pub mod report;
pub mod split;
pub mod training;

pub use config::RunConfig;
pub use error::{HarvestError, Result};
pub use pipeline::{run_analysis, AnalysisReport};
