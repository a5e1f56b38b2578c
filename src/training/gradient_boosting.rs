//! Gradient-boosted trees for binary classification
//!
//! Logistic boosting: start from the base-rate log odds, then repeatedly
//! fit shallow regression trees to the probability residuals and fold them
//! in with shrinkage.

use super::decision_tree::DecisionTree;
use crate::error::{HarvestError, Result};
use ndarray::{Array1, Array2, Axis};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};

/// Gradient boosting hyperparameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GradientBoostedParams {
    /// Number of boosting rounds
    pub trees: usize,
    /// Shrinkage applied to each tree's contribution
    pub learning_rate: f64,
    /// Depth of each residual tree
    pub tree_depth: usize,
    /// Row fraction sampled per round
    pub subsample: f64,
}

impl Default for GradientBoostedParams {
    fn default() -> Self {
        Self {
            trees: 100,
            learning_rate: 0.1,
            tree_depth: 3,
            subsample: 0.8,
        }
    }
}

/// Trained boosted ensemble
#[derive(Debug, Clone)]
pub struct GradientBoostedModel {
    params: GradientBoostedParams,
    initial_log_odds: f64,
    trees: Vec<DecisionTree>,
}

impl GradientBoostedModel {
    /// Fit the boosted ensemble
    pub fn fit(
        params: &GradientBoostedParams,
        x: &Array2<f64>,
        y: &Array1<f64>,
        seed: u64,
    ) -> Result<GradientBoostedModel> {
        if params.trees == 0 {
            return Err(HarvestError::InvalidParameter {
                name: "trees".to_string(),
                value: "0".to_string(),
                reason: "boosting needs at least one round".to_string(),
            });
        }
        if !(params.learning_rate > 0.0) {
            return Err(HarvestError::InvalidParameter {
                name: "learning_rate".to_string(),
                value: params.learning_rate.to_string(),
                reason: "must be positive".to_string(),
            });
        }
        if !(params.subsample > 0.0 && params.subsample <= 1.0) {
            return Err(HarvestError::InvalidParameter {
                name: "subsample".to_string(),
                value: params.subsample.to_string(),
                reason: "must be in (0, 1]".to_string(),
            });
        }

        let n_samples = x.nrows();
        let p = (y.mean().unwrap_or(0.5)).clamp(1e-10, 1.0 - 1e-10);
        let initial_log_odds = (p / (1.0 - p)).ln();

        let mut log_odds = Array1::from_elem(n_samples, initial_log_odds);
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
        let mut trees = Vec::with_capacity(params.trees);

        for round in 0..params.trees {
            let residuals: Array1<f64> = y
                .iter()
                .zip(log_odds.iter())
                .map(|(yi, &lo)| yi - sigmoid(lo))
                .collect();

            let sample_indices = subsample_indices(n_samples, params.subsample, &mut rng);
            let x_sub = x.select(Axis(0), &sample_indices);
            let r_sub: Array1<f64> =
                Array1::from_vec(sample_indices.iter().map(|&i| residuals[i]).collect());

            let mut tree = DecisionTree::new_regressor().with_max_depth(params.tree_depth);
            // Residual trees share the run's seed stream, offset per round
            let mut tree_rng = ChaCha8Rng::seed_from_u64(seed.wrapping_add(round as u64));
            tree.fit(&x_sub, &r_sub, &mut tree_rng)?;

            let contribution = tree.predict(x)?;
            for (lo, c) in log_odds.iter_mut().zip(contribution.iter()) {
                *lo += params.learning_rate * c;
            }

            trees.push(tree);
        }

        Ok(GradientBoostedModel {
            params: *params,
            initial_log_odds,
            trees,
        })
    }

    /// Positive-class probability via the accumulated log odds
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let mut log_odds = Array1::from_elem(x.nrows(), self.initial_log_odds);

        for tree in &self.trees {
            let contribution = tree.predict(x)?;
            for (lo, c) in log_odds.iter_mut().zip(contribution.iter()) {
                *lo += self.params.learning_rate * c;
            }
        }

        Ok(log_odds.mapv(sigmoid))
    }
}

fn sigmoid(v: f64) -> f64 {
    1.0 / (1.0 + (-v).exp())
}

fn subsample_indices(n: usize, fraction: f64, rng: &mut Xoshiro256PlusPlus) -> Vec<usize> {
    let sample_size = ((n as f64) * fraction).ceil() as usize;
    let mut indices: Vec<usize> = (0..n).collect();
    indices.shuffle(rng);
    indices.truncate(sample_size.max(1));
    indices.sort_unstable();
    indices
}
