//! CART learner shared by the forest and boosting ensembles

use crate::error::{HarvestError, Result};
use ndarray::{Array1, Array2};
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Decision tree node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TreeNode {
    /// Leaf with prediction value (majority class or mean residual)
    Leaf { value: f64, n_samples: usize },
    /// Internal split on `feature_idx <= threshold`
    Split {
        feature_idx: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
        n_samples: usize,
    },
}

/// Impurity criterion
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Criterion {
    /// Gini impurity over binary class labels
    Gini,
    /// Variance of continuous targets (residual trees)
    Variance,
}

/// Accumulated child statistics for one side of a candidate split
#[derive(Debug, Clone, Copy, Default)]
struct SideStats {
    count: usize,
    sum: f64,
    sq_sum: f64,
    positives: usize,
}

impl SideStats {
    fn push(&mut self, y: f64) {
        self.count += 1;
        self.sum += y;
        self.sq_sum += y * y;
        if y > 0.5 {
            self.positives += 1;
        }
    }

    fn impurity(&self, criterion: Criterion) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        let n = self.count as f64;
        match criterion {
            Criterion::Gini => {
                let p = self.positives as f64 / n;
                2.0 * p * (1.0 - p)
            }
            Criterion::Variance => self.sq_sum / n - (self.sum / n).powi(2),
        }
    }
}

/// Decision tree model
///
/// Feature subsampling at each split is driven by the caller-supplied
/// seeded generator, so identical seeds reproduce identical trees.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    root: Option<TreeNode>,
    pub max_depth: Option<usize>,
    pub min_samples_leaf: usize,
    pub max_features: Option<usize>,
    pub criterion: Criterion,
    n_features: usize,
    feature_importances: Option<Vec<f64>>,
}

impl DecisionTree {
    /// Classification tree (Gini, majority-class leaves)
    pub fn new_classifier() -> Self {
        Self {
            root: None,
            max_depth: None,
            min_samples_leaf: 1,
            max_features: None,
            criterion: Criterion::Gini,
            n_features: 0,
            feature_importances: None,
        }
    }

    /// Regression tree (variance, mean leaves) for residual fitting
    pub fn new_regressor() -> Self {
        Self {
            root: None,
            max_depth: None,
            min_samples_leaf: 1,
            max_features: None,
            criterion: Criterion::Variance,
            n_features: 0,
            feature_importances: None,
        }
    }

    /// Set maximum depth
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Set minimum samples in leaf
    pub fn with_min_samples_leaf(mut self, min_samples: usize) -> Self {
        self.min_samples_leaf = min_samples.max(1);
        self
    }

    /// Set number of features considered per split
    pub fn with_max_features(mut self, max_features: usize) -> Self {
        self.max_features = Some(max_features.max(1));
        self
    }

    /// Fit the tree to training data
    pub fn fit(
        &mut self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        rng: &mut ChaCha8Rng,
    ) -> Result<&mut Self> {
        let n_samples = x.nrows();
        if n_samples != y.len() {
            return Err(HarvestError::ShapeError {
                expected: format!("y length = {}", n_samples),
                actual: format!("y length = {}", y.len()),
            });
        }
        if n_samples == 0 {
            return Err(HarvestError::InsufficientData(
                "cannot fit a tree on zero samples".to_string(),
            ));
        }

        self.n_features = x.ncols();
        let mut importances = vec![0.0; self.n_features];

        let indices: Vec<usize> = (0..n_samples).collect();
        self.root = Some(self.build_tree(x, y, &indices, 0, &mut importances, rng));

        let total: f64 = importances.iter().sum();
        if total > 0.0 {
            for imp in &mut importances {
                *imp /= total;
            }
        }
        self.feature_importances = Some(importances);

        Ok(self)
    }

    fn build_tree(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        indices: &[usize],
        depth: usize,
        importances: &mut [f64],
        rng: &mut ChaCha8Rng,
    ) -> TreeNode {
        let n_samples = indices.len();

        let should_stop = n_samples < 2 * self.min_samples_leaf
            || self.max_depth.map_or(false, |d| depth >= d)
            || self.is_pure(y, indices);

        if should_stop {
            return TreeNode::Leaf {
                value: self.leaf_value(y, indices),
                n_samples,
            };
        }

        let Some((feature_idx, threshold, gain)) = self.find_best_split(x, y, indices, rng) else {
            return TreeNode::Leaf {
                value: self.leaf_value(y, indices),
                n_samples,
            };
        };

        let (left_indices, right_indices): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .partition(|&&i| x[[i, feature_idx]] <= threshold);

        if left_indices.len() < self.min_samples_leaf
            || right_indices.len() < self.min_samples_leaf
        {
            return TreeNode::Leaf {
                value: self.leaf_value(y, indices),
                n_samples,
            };
        }

        importances[feature_idx] += n_samples as f64 * gain;

        let left = Box::new(self.build_tree(x, y, &left_indices, depth + 1, importances, rng));
        let right = Box::new(self.build_tree(x, y, &right_indices, depth + 1, importances, rng));

        TreeNode::Split {
            feature_idx,
            threshold,
            left,
            right,
            n_samples,
        }
    }

    /// Scan a seeded random feature subset for the impurity-minimizing split
    fn find_best_split(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        indices: &[usize],
        rng: &mut ChaCha8Rng,
    ) -> Option<(usize, f64, f64)> {
        let n_features = x.ncols();
        let n_to_try = self.max_features.unwrap_or(n_features).min(n_features);

        let mut candidates: Vec<usize> = (0..n_features).collect();
        if n_to_try < n_features {
            candidates.shuffle(rng);
            candidates.truncate(n_to_try);
            candidates.sort_unstable();
        }

        let mut parent = SideStats::default();
        for &i in indices {
            parent.push(y[i]);
        }
        let parent_impurity = parent.impurity(self.criterion);
        let n = indices.len() as f64;

        let mut best: Option<(usize, f64, f64)> = None;

        for &feature_idx in &candidates {
            let mut values: Vec<f64> = indices.iter().map(|&i| x[[i, feature_idx]]).collect();
            values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
            values.dedup();

            for window in values.windows(2) {
                let threshold = (window[0] + window[1]) / 2.0;

                let mut left = SideStats::default();
                let mut right = SideStats::default();
                for &i in indices {
                    if x[[i, feature_idx]] <= threshold {
                        left.push(y[i]);
                    } else {
                        right.push(y[i]);
                    }
                }

                if left.count < self.min_samples_leaf || right.count < self.min_samples_leaf {
                    continue;
                }

                let weighted = (left.count as f64 * left.impurity(self.criterion)
                    + right.count as f64 * right.impurity(self.criterion))
                    / n;
                let gain = parent_impurity - weighted;

                let better = match best {
                    None => gain > 1e-12,
                    Some((_, _, best_gain)) => gain > best_gain,
                };
                if better {
                    best = Some((feature_idx, threshold, gain));
                }
            }
        }

        best
    }

    fn is_pure(&self, y: &Array1<f64>, indices: &[usize]) -> bool {
        let Some(&first_idx) = indices.first() else {
            return true;
        };
        let first = y[first_idx];
        indices.iter().all(|&i| (y[i] - first).abs() < 1e-12)
    }

    fn leaf_value(&self, y: &Array1<f64>, indices: &[usize]) -> f64 {
        if indices.is_empty() {
            return 0.0;
        }
        match self.criterion {
            Criterion::Gini => {
                let positives = indices.iter().filter(|&&i| y[i] > 0.5).count();
                if 2 * positives >= indices.len() {
                    1.0
                } else {
                    0.0
                }
            }
            Criterion::Variance => {
                indices.iter().map(|&i| y[i]).sum::<f64>() / indices.len() as f64
            }
        }
    }

    /// Make predictions
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let root = self.root.as_ref().ok_or(HarvestError::ModelNotFitted)?;

        let predictions: Vec<f64> = (0..x.nrows())
            .map(|i| {
                let row = x.row(i);
                Self::predict_sample(root, row.as_slice().unwrap_or(&[]))
            })
            .collect();

        Ok(Array1::from_vec(predictions))
    }

    fn predict_sample(node: &TreeNode, sample: &[f64]) -> f64 {
        match node {
            TreeNode::Leaf { value, .. } => *value,
            TreeNode::Split {
                feature_idx,
                threshold,
                left,
                right,
                ..
            } => {
                if sample[*feature_idx] <= *threshold {
                    Self::predict_sample(left, sample)
                } else {
                    Self::predict_sample(right, sample)
                }
            }
        }
    }

    /// Normalized per-feature importance (impurity reduction)
    pub fn feature_importances(&self) -> Option<&[f64]> {
        self.feature_importances.as_deref()
    }
}
