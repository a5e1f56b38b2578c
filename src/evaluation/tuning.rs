//! Exhaustive grid search
//!
//! Brute force over the cartesian product of the candidate hyperparameter
//! values: every combination is cross-validated with the same fold set and
//! seed, then ranked. No early stopping or pruning, and no combination is
//! ever skipped on failure — a failed fit aborts the run, since dropping a
//! combination would corrupt the ranking.

use super::cross_validate;
use crate::data::Dataset;
use crate::error::Result;
use crate::metrics::CvScores;
use crate::split::FoldSet;
use crate::training::{GradientBoostedParams, KnnParams, ModelSpec, RandomForestParams};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::info;

/// Candidate hyperparameter values for one model family
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TuningGrid {
    RandomForest {
        trees: Vec<usize>,
        mtry: Vec<usize>,
        min_node: Vec<usize>,
    },
    Knn {
        k: Vec<usize>,
    },
    GradientBoosted {
        trees: Vec<usize>,
        learning_rate: Vec<f64>,
        tree_depth: Vec<usize>,
    },
}

impl TuningGrid {
    /// Materialize the cartesian product as concrete model candidates
    pub fn combinations(&self) -> Vec<ModelSpec> {
        match self {
            TuningGrid::RandomForest {
                trees,
                mtry,
                min_node,
            } => {
                let mut out = Vec::with_capacity(trees.len() * mtry.len() * min_node.len());
                for &t in trees {
                    for &m in mtry {
                        for &n in min_node {
                            out.push(ModelSpec::RandomForest(RandomForestParams {
                                trees: t,
                                mtry: Some(m),
                                min_node: n,
                            }));
                        }
                    }
                }
                out
            }
            TuningGrid::Knn { k } => k
                .iter()
                .map(|&k| ModelSpec::Knn(KnnParams { k }))
                .collect(),
            TuningGrid::GradientBoosted {
                trees,
                learning_rate,
                tree_depth,
            } => {
                let mut out =
                    Vec::with_capacity(trees.len() * learning_rate.len() * tree_depth.len());
                for &t in trees {
                    for &lr in learning_rate {
                        for &d in tree_depth {
                            out.push(ModelSpec::GradientBoosted(GradientBoostedParams {
                                trees: t,
                                learning_rate: lr,
                                tree_depth: d,
                                ..Default::default()
                            }));
                        }
                    }
                }
                out
            }
        }
    }
}

/// One evaluated grid cell
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TuningEntry {
    pub spec: ModelSpec,
    pub scores: CvScores,
}

impl TuningEntry {
    /// Ranking order: higher mean first; ties prefer lower spread, then the
    /// simpler model (fewer trees or neighbors, fewer features per split)
    pub fn ordering(&self, other: &Self) -> Ordering {
        other
            .scores
            .mean
            .partial_cmp(&self.scores.mean)
            .unwrap_or(Ordering::Equal)
            .then(
                self.scores
                    .std
                    .partial_cmp(&other.scores.std)
                    .unwrap_or(Ordering::Equal),
            )
            .then(self.spec.complexity_key().cmp(&other.spec.complexity_key()))
    }
}

/// Cross-validate every combination in the grid and rank the results
pub fn grid_search(
    grid: &TuningGrid,
    train: &Dataset,
    folds: &FoldSet,
    neighbors: usize,
    seed: u64,
) -> Result<Vec<TuningEntry>> {
    let combinations = grid.combinations();
    info!(
        combinations = combinations.len(),
        folds = folds.k(),
        "starting grid search"
    );

    let mut entries: Vec<TuningEntry> = combinations
        .into_par_iter()
        .map(|spec| {
            let scores = cross_validate(&spec, train, folds, neighbors, seed)?;
            Ok(TuningEntry { spec, scores })
        })
        .collect::<Result<Vec<_>>>()?;

    entries.sort_by(|a, b| a.ordering(b));
    Ok(entries)
}
