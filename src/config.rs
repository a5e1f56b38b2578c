//! Run configuration

use crate::evaluation::TuningGrid;
use crate::training::{GradientBoostedParams, KnnParams, ModelSpec, RandomForestParams};
use serde::{Deserialize, Serialize};

/// Configuration for one analysis run
///
/// Every stage draws its seed from `seed`, so a run is reproducible from
/// this struct plus the input file alone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Outcome column name
    pub outcome_column: String,
    /// Fraction of records assigned to the training subset
    pub train_fraction: f64,
    /// Number of cross-validation folds
    pub folds: usize,
    /// Neighbor count for recipe imputation
    pub recipe_neighbors: usize,
    /// Probability threshold for the final confusion matrix
    pub threshold: f64,
    /// Seed for every pseudo-random stream
    pub seed: u64,
    /// Model candidates compared in the screening pass
    pub candidates: Vec<ModelSpec>,
    /// Hyperparameter grid per family, used for whichever family wins
    pub forest_grid: TuningGrid,
    pub knn_grid: TuningGrid,
    pub boosted_grid: TuningGrid,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            outcome_column: "poor_recovery".to_string(),
            train_fraction: 0.75,
            folds: 10,
            recipe_neighbors: 5,
            threshold: 0.5,
            seed: 100,
            candidates: vec![
                ModelSpec::RandomForest(RandomForestParams::default()),
                ModelSpec::Knn(KnnParams::default()),
                ModelSpec::GradientBoosted(GradientBoostedParams::default()),
            ],
            forest_grid: TuningGrid::RandomForest {
                trees: vec![100, 300, 500],
                mtry: vec![2, 4, 6],
                min_node: vec![2, 5, 10],
            },
            knn_grid: TuningGrid::Knn {
                k: vec![3, 5, 7, 9, 11],
            },
            boosted_grid: TuningGrid::GradientBoosted {
                trees: vec![50, 100, 200],
                learning_rate: vec![0.05, 0.1, 0.3],
                tree_depth: vec![2, 3, 4],
            },
        }
    }
}

impl RunConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set the outcome column
    pub fn with_outcome(mut self, outcome: impl Into<String>) -> Self {
        self.outcome_column = outcome.into();
        self
    }

    /// Builder method to set the seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Builder method to set the train fraction
    pub fn with_train_fraction(mut self, fraction: f64) -> Self {
        self.train_fraction = fraction;
        self
    }

    /// Builder method to set the fold count
    pub fn with_folds(mut self, folds: usize) -> Self {
        self.folds = folds;
        self
    }

    /// Builder method to set the confusion-matrix threshold
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// The tuning grid matching a candidate's family
    pub fn grid_for(&self, spec: &ModelSpec) -> &TuningGrid {
        match spec {
            ModelSpec::RandomForest(_) => &self.forest_grid,
            ModelSpec::Knn(_) => &self.knn_grid,
            ModelSpec::GradientBoosted(_) => &self.boosted_grid,
        }
    }
}
