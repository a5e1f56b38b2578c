//! k-nearest-neighbor classifier

use crate::error::{HarvestError, Result};
use ndarray::{Array1, Array2};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// k-NN hyperparameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KnnParams {
    /// Number of neighbors in the vote
    pub k: usize,
}

impl Default for KnnParams {
    fn default() -> Self {
        Self { k: 5 }
    }
}

/// Max-heap entry; distance ties resolve toward the lower training index
/// so the neighbor set is deterministic
#[derive(PartialEq)]
struct DistLabel(f64, usize, f64);

impl Eq for DistLabel {}

impl PartialOrd for DistLabel {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DistLabel {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0
            .partial_cmp(&other.0)
            .unwrap_or(Ordering::Equal)
            .then(self.1.cmp(&other.1))
    }
}

/// Trained k-NN model: the transformed training subset itself
#[derive(Debug, Clone)]
pub struct KnnModel {
    k: usize,
    x_train: Array2<f64>,
    y_train: Array1<f64>,
}

impl KnnModel {
    /// Store the training data; k is clamped to the subset size
    pub fn fit(params: &KnnParams, x: &Array2<f64>, y: &Array1<f64>) -> Result<KnnModel> {
        if params.k == 0 {
            return Err(HarvestError::InvalidParameter {
                name: "k".to_string(),
                value: "0".to_string(),
                reason: "neighbor count must be positive".to_string(),
            });
        }

        Ok(KnnModel {
            k: params.k.min(x.nrows()),
            x_train: x.clone(),
            y_train: y.clone(),
        })
    }

    /// Positive-class probability: positive fraction of the k nearest votes
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let probs: Vec<f64> = (0..x.nrows())
            .into_par_iter()
            .map(|i| {
                let row = x.row(i);
                let neighbors = self.find_k_nearest(row.as_slice().unwrap_or(&[]));
                let positives = neighbors.iter().filter(|&&(_, label)| label > 0.5).count();
                positives as f64 / neighbors.len().max(1) as f64
            })
            .collect();

        Ok(Array1::from_vec(probs))
    }

    /// Find k nearest training rows with a max-heap: O(n log k)
    fn find_k_nearest(&self, point: &[f64]) -> Vec<(f64, f64)> {
        let mut heap: BinaryHeap<DistLabel> = BinaryHeap::with_capacity(self.k + 1);

        for (i, row) in self.x_train.rows().into_iter().enumerate() {
            let dist = euclidean(point, row.as_slice().unwrap_or(&[]));
            let entry = DistLabel(dist, i, self.y_train[i]);
            if heap.len() < self.k {
                heap.push(entry);
            } else if let Some(top) = heap.peek() {
                if entry < *top {
                    heap.pop();
                    heap.push(entry);
                }
            }
        }

        heap.into_iter().map(|DistLabel(d, _, label)| (d, label)).collect()
    }
}

fn euclidean(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(ai, bi)| {
            let d = ai - bi;
            d * d
        })
        .sum::<f64>()
        .sqrt()
}
