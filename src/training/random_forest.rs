//! Random forest classifier

use super::decision_tree::DecisionTree;
use crate::error::{HarvestError, Result};
use ndarray::{Array1, Array2, Axis};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Random forest hyperparameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RandomForestParams {
    /// Number of trees
    pub trees: usize,
    /// Features considered per split; `None` means sqrt(n_features)
    pub mtry: Option<usize>,
    /// Minimum records per leaf
    pub min_node: usize,
}

impl Default for RandomForestParams {
    fn default() -> Self {
        Self {
            trees: 500,
            mtry: None,
            min_node: 10,
        }
    }
}

/// Trained forest: bagged classification trees plus aggregate importances
#[derive(Debug, Clone)]
pub struct RandomForestModel {
    trees: Vec<DecisionTree>,
    feature_importances: Vec<f64>,
}

impl RandomForestModel {
    /// Fit a forest of bootstrap trees
    ///
    /// Each tree gets its own generator derived from the run seed, so the
    /// forest is reproducible while trees stay independent enough to build
    /// in parallel.
    pub fn fit(
        params: &RandomForestParams,
        x: &Array2<f64>,
        y: &Array1<f64>,
        seed: u64,
    ) -> Result<RandomForestModel> {
        if params.trees == 0 {
            return Err(HarvestError::InvalidParameter {
                name: "trees".to_string(),
                value: "0".to_string(),
                reason: "forest needs at least one tree".to_string(),
            });
        }

        let n_samples = x.nrows();
        let n_features = x.ncols();
        let mtry = params
            .mtry
            .unwrap_or_else(|| (n_features as f64).sqrt().ceil() as usize)
            .clamp(1, n_features);

        let trees: Vec<DecisionTree> = (0..params.trees)
            .into_par_iter()
            .map(|tree_idx| {
                let mut rng = ChaCha8Rng::seed_from_u64(seed.wrapping_add(tree_idx as u64));

                // Bootstrap sample
                let sample_indices: Vec<usize> =
                    (0..n_samples).map(|_| rng.gen_range(0..n_samples)).collect();
                let x_boot = x.select(Axis(0), &sample_indices);
                let y_boot: Array1<f64> =
                    Array1::from_vec(sample_indices.iter().map(|&i| y[i]).collect());

                let mut tree = DecisionTree::new_classifier()
                    .with_min_samples_leaf(params.min_node)
                    .with_max_features(mtry);
                tree.fit(&x_boot, &y_boot, &mut rng)?;
                Ok(tree)
            })
            .collect::<Result<Vec<_>>>()?;

        let feature_importances = aggregate_importances(&trees, n_features);

        Ok(RandomForestModel {
            trees,
            feature_importances,
        })
    }

    /// Positive-class probability: fraction of trees voting positive
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let votes: Vec<Array1<f64>> = self
            .trees
            .par_iter()
            .map(|tree| tree.predict(x))
            .collect::<Result<Vec<_>>>()?;

        let n_trees = votes.len() as f64;
        let probs: Vec<f64> = (0..x.nrows())
            .map(|i| votes.iter().map(|v| v[i]).sum::<f64>() / n_trees)
            .collect();

        Ok(Array1::from_vec(probs))
    }

    /// Normalized mean impurity-reduction importance per feature
    pub fn feature_importances(&self) -> &[f64] {
        &self.feature_importances
    }
}

fn aggregate_importances(trees: &[DecisionTree], n_features: usize) -> Vec<f64> {
    let mut total = vec![0.0; n_features];
    for tree in trees {
        if let Some(imp) = tree.feature_importances() {
            for (slot, &v) in total.iter_mut().zip(imp.iter()) {
                *slot += v;
            }
        }
    }

    let sum: f64 = total.iter().sum();
    if sum > 0.0 {
        for v in &mut total {
            *v /= sum;
        }
    }
    total
}
