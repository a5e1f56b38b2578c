//! Model candidates
//!
//! Three interchangeable binary classifier families behind one fit/predict
//! surface: random forest, k-nearest-neighbor, and gradient-boosted trees.
//! A [`ModelSpec`] is a family plus its hyperparameters; fitting is the
//! only way to obtain a [`FittedModel`], so predicting on unfitted state is
//! unrepresentable at this level. All candidates consume the purely numeric
//! design matrix produced by the preprocessing recipe and emit both hard
//! class labels and positive-class probabilities.

pub mod decision_tree;
pub mod gradient_boosting;
pub mod knn;
pub mod random_forest;

pub use decision_tree::{Criterion, DecisionTree, TreeNode};
pub use gradient_boosting::{GradientBoostedModel, GradientBoostedParams};
pub use knn::{KnnModel, KnnParams};
pub use random_forest::{RandomForestModel, RandomForestParams};

use crate::error::{HarvestError, Result};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A model family with its hyperparameter set, not yet trained
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ModelSpec {
    RandomForest(RandomForestParams),
    Knn(KnnParams),
    GradientBoosted(GradientBoostedParams),
}

impl ModelSpec {
    /// Human-readable family name
    pub fn family(&self) -> &'static str {
        match self {
            ModelSpec::RandomForest(_) => "random forest",
            ModelSpec::Knn(_) => "k-nearest-neighbor",
            ModelSpec::GradientBoosted(_) => "gradient-boosted trees",
        }
    }

    /// Train a fresh model instance on a transformed training subset
    pub fn fit(&self, x: &Array2<f64>, y: &Array1<f64>, seed: u64) -> Result<FittedModel> {
        validate_training_input(x, y)?;
        match self {
            ModelSpec::RandomForest(params) => {
                Ok(FittedModel::RandomForest(RandomForestModel::fit(params, x, y, seed)?))
            }
            ModelSpec::Knn(params) => Ok(FittedModel::Knn(KnnModel::fit(params, x, y)?)),
            ModelSpec::GradientBoosted(params) => Ok(FittedModel::GradientBoosted(
                GradientBoostedModel::fit(params, x, y, seed)?,
            )),
        }
    }

    /// Ordering key for the tuner's simplicity tie-break: smaller is simpler
    pub fn complexity_key(&self) -> (u64, u64, u64) {
        match self {
            ModelSpec::RandomForest(p) => (
                p.trees as u64,
                p.mtry.unwrap_or(0) as u64,
                p.min_node as u64,
            ),
            ModelSpec::Knn(p) => (p.k as u64, 0, 0),
            ModelSpec::GradientBoosted(p) => {
                (p.trees as u64, p.tree_depth as u64, (p.learning_rate * 1e6) as u64)
            }
        }
    }
}

impl fmt::Display for ModelSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelSpec::RandomForest(p) => write!(
                f,
                "trees={} mtry={} min_node={}",
                p.trees,
                p.mtry.map_or("sqrt".to_string(), |m| m.to_string()),
                p.min_node
            ),
            ModelSpec::Knn(p) => write!(f, "k={}", p.k),
            ModelSpec::GradientBoosted(p) => write!(
                f,
                "trees={} learn_rate={} depth={}",
                p.trees, p.learning_rate, p.tree_depth
            ),
        }
    }
}

/// A trained model instance
#[derive(Debug, Clone)]
pub enum FittedModel {
    RandomForest(RandomForestModel),
    Knn(KnnModel),
    GradientBoosted(GradientBoostedModel),
}

impl FittedModel {
    /// Positive-class probability per row
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        match self {
            FittedModel::RandomForest(m) => m.predict_proba(x),
            FittedModel::Knn(m) => m.predict_proba(x),
            FittedModel::GradientBoosted(m) => m.predict_proba(x),
        }
    }

    /// Hard class labels at a probability threshold
    pub fn predict(&self, x: &Array2<f64>, threshold: f64) -> Result<Array1<f64>> {
        let probs = self.predict_proba(x)?;
        Ok(probs.mapv(|p| if p >= threshold { 1.0 } else { 0.0 }))
    }

    /// Per-feature importance scores, where the family defines them
    pub fn feature_importances(&self) -> Option<&[f64]> {
        match self {
            FittedModel::RandomForest(m) => Some(m.feature_importances()),
            FittedModel::Knn(_) | FittedModel::GradientBoosted(_) => None,
        }
    }
}

/// One scored record of the final test subset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prediction {
    pub actual: bool,
    pub predicted: bool,
    pub probability: f64,
}

fn validate_training_input(x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
    if x.nrows() != y.len() {
        return Err(HarvestError::ShapeError {
            expected: format!("y length = {}", x.nrows()),
            actual: format!("y length = {}", y.len()),
        });
    }
    if x.nrows() == 0 {
        return Err(HarvestError::InsufficientData(
            "cannot fit on an empty training subset".to_string(),
        ));
    }
    if y.iter().any(|&v| v != 0.0 && v != 1.0) {
        return Err(HarvestError::DataError(
            "outcome labels must be 0 or 1".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn separable() -> (Array2<f64>, Array1<f64>) {
        let x = array![
            [0.0, 0.1],
            [0.2, 0.0],
            [0.1, 0.2],
            [0.3, 0.1],
            [5.0, 5.1],
            [5.2, 5.0],
            [5.1, 5.2],
            [5.3, 5.1],
        ];
        let y = array![0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0];
        (x, y)
    }

    #[test]
    fn test_every_family_fits_and_scores() {
        let (x, y) = separable();
        let specs = [
            ModelSpec::RandomForest(RandomForestParams {
                trees: 20,
                mtry: None,
                min_node: 1,
            }),
            ModelSpec::Knn(KnnParams { k: 3 }),
            ModelSpec::GradientBoosted(GradientBoostedParams {
                trees: 20,
                ..Default::default()
            }),
        ];

        for spec in specs {
            let model = spec.fit(&x, &y, 42).unwrap();
            let probs = model.predict_proba(&x).unwrap();
            assert_eq!(probs.len(), 8);
            assert!(probs.iter().all(|p| (0.0..=1.0).contains(p)), "{}", spec.family());

            let labels = model.predict(&x, 0.5).unwrap();
            let correct = labels
                .iter()
                .zip(y.iter())
                .filter(|(p, a)| (*p - *a).abs() < 0.5)
                .count();
            assert!(correct >= 6, "{} got {}/8", spec.family(), correct);
        }
    }

    #[test]
    fn test_importances_only_for_forest() {
        let (x, y) = separable();

        let forest = ModelSpec::RandomForest(RandomForestParams {
            trees: 10,
            mtry: None,
            min_node: 1,
        })
        .fit(&x, &y, 1)
        .unwrap();
        assert!(forest.feature_importances().is_some());

        let knn = ModelSpec::Knn(KnnParams { k: 3 }).fit(&x, &y, 1).unwrap();
        assert!(knn.feature_importances().is_none());
    }

    #[test]
    fn test_shape_mismatch_rejected() {
        let x = array![[1.0], [2.0]];
        let y = array![0.0];
        let result = ModelSpec::Knn(KnnParams { k: 1 }).fit(&x, &y, 0);
        assert!(matches!(result, Err(HarvestError::ShapeError { .. })));
    }

    #[test]
    fn test_nonbinary_labels_rejected() {
        let x = array![[1.0], [2.0]];
        let y = array![0.0, 2.0];
        let result = ModelSpec::Knn(KnnParams { k: 1 }).fit(&x, &y, 0);
        assert!(result.is_err());
    }
}
