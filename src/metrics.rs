//! Discrimination and classification metrics

use crate::error::{HarvestError, Result};
use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// Area under the ROC curve
///
/// Rank-based (Mann-Whitney) formulation with midrank tie handling: the
/// probability that a randomly chosen positive is scored above a randomly
/// chosen negative, counting ties as half. Undefined when the labels
/// contain a single class; that case is an error rather than a placeholder
/// value, since a silent default would bias any ranking built on top.
pub fn roc_auc(labels: &Array1<f64>, scores: &Array1<f64>) -> Result<f64> {
    if labels.len() != scores.len() {
        return Err(HarvestError::ShapeError {
            expected: format!("scores length = {}", labels.len()),
            actual: format!("scores length = {}", scores.len()),
        });
    }

    let n_pos = labels.iter().filter(|&&v| v > 0.5).count();
    let n_neg = labels.len() - n_pos;
    if n_pos == 0 || n_neg == 0 {
        return Err(HarvestError::UndefinedMetric(format!(
            "ROC-AUC needs both classes, got {} positive / {} negative",
            n_pos, n_neg
        )));
    }
    if scores.iter().any(|v| v.is_nan()) {
        return Err(HarvestError::UndefinedMetric(
            "scores contain NaN".to_string(),
        ));
    }

    // Midranks: ties share the average of the ranks they span
    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| {
        scores[a]
            .partial_cmp(&scores[b])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut ranks = vec![0.0; scores.len()];
    let mut i = 0;
    while i < order.len() {
        let mut j = i;
        while j + 1 < order.len() && scores[order[j + 1]] == scores[order[i]] {
            j += 1;
        }
        let midrank = (i + j) as f64 / 2.0 + 1.0;
        for &idx in &order[i..=j] {
            ranks[idx] = midrank;
        }
        i = j + 1;
    }

    let pos_rank_sum: f64 = labels
        .iter()
        .zip(ranks.iter())
        .filter(|(&label, _)| label > 0.5)
        .map(|(_, &rank)| rank)
        .sum();

    let n_pos = n_pos as f64;
    let n_neg = n_neg as f64;
    Ok((pos_rank_sum - n_pos * (n_pos + 1.0) / 2.0) / (n_pos * n_neg))
}

/// Confusion matrix at a probability threshold
///
/// A record counts as predicted-positive when its score is at least the
/// threshold, so lowering the threshold can only move records from the
/// negative predictions into the positive ones.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    pub threshold: f64,
    pub true_positives: usize,
    pub false_positives: usize,
    pub true_negatives: usize,
    pub false_negatives: usize,
}

impl ConfusionMatrix {
    /// Count outcomes against scores at the given threshold
    pub fn at_threshold(labels: &Array1<f64>, scores: &Array1<f64>, threshold: f64) -> Result<Self> {
        if labels.len() != scores.len() {
            return Err(HarvestError::ShapeError {
                expected: format!("scores length = {}", labels.len()),
                actual: format!("scores length = {}", scores.len()),
            });
        }

        let mut matrix = ConfusionMatrix {
            threshold,
            true_positives: 0,
            false_positives: 0,
            true_negatives: 0,
            false_negatives: 0,
        };

        for (&label, &score) in labels.iter().zip(scores.iter()) {
            let actual = label > 0.5;
            let predicted = score >= threshold;
            match (actual, predicted) {
                (true, true) => matrix.true_positives += 1,
                (false, true) => matrix.false_positives += 1,
                (false, false) => matrix.true_negatives += 1,
                (true, false) => matrix.false_negatives += 1,
            }
        }

        Ok(matrix)
    }

    /// Total records counted
    pub fn total(&self) -> usize {
        self.true_positives + self.false_positives + self.true_negatives + self.false_negatives
    }

    pub fn accuracy(&self) -> f64 {
        if self.total() == 0 {
            return 0.0;
        }
        (self.true_positives + self.true_negatives) as f64 / self.total() as f64
    }

    /// True positive rate
    pub fn sensitivity(&self) -> f64 {
        let actual_pos = self.true_positives + self.false_negatives;
        if actual_pos == 0 {
            return 0.0;
        }
        self.true_positives as f64 / actual_pos as f64
    }

    /// True negative rate
    pub fn specificity(&self) -> f64 {
        let actual_neg = self.true_negatives + self.false_positives;
        if actual_neg == 0 {
            return 0.0;
        }
        self.true_negatives as f64 / actual_neg as f64
    }
}

/// Aggregated fold-level metric values
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CvScores {
    pub per_fold: Vec<f64>,
    pub mean: f64,
    pub std: f64,
}

impl CvScores {
    /// Aggregate per-fold AUC values into mean and standard deviation
    pub fn from_fold_aucs(per_fold: Vec<f64>) -> Self {
        let n = per_fold.len() as f64;
        let mean = per_fold.iter().sum::<f64>() / n;
        let variance = per_fold.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / n;
        let std = variance.sqrt();
        Self { per_fold, mean, std }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_perfect_ranking() {
        let labels = array![0.0, 0.0, 1.0, 1.0];
        let scores = array![0.1, 0.2, 0.8, 0.9];
        assert_eq!(roc_auc(&labels, &scores).unwrap(), 1.0);
    }

    #[test]
    fn test_inverted_ranking() {
        let labels = array![1.0, 1.0, 0.0, 0.0];
        let scores = array![0.1, 0.2, 0.8, 0.9];
        assert_eq!(roc_auc(&labels, &scores).unwrap(), 0.0);
    }

    #[test]
    fn test_ties_count_half() {
        let labels = array![0.0, 1.0];
        let scores = array![0.5, 0.5];
        assert_eq!(roc_auc(&labels, &scores).unwrap(), 0.5);
    }

    #[test]
    fn test_partial_ranking() {
        let labels = array![0.0, 1.0, 0.0, 1.0];
        let scores = array![0.1, 0.4, 0.35, 0.8];
        // Pairs: (0.4 vs 0.1) ✓, (0.4 vs 0.35) ✓, (0.8 vs both) ✓✓ -> 4/4
        assert_eq!(roc_auc(&labels, &scores).unwrap(), 1.0);

        let scores = array![0.5, 0.4, 0.35, 0.8];
        // 0.4 beats 0.35 but loses to 0.5; 0.8 beats both -> 3/4
        assert_eq!(roc_auc(&labels, &scores).unwrap(), 0.75);
    }

    #[test]
    fn test_single_class_is_undefined() {
        let labels = array![1.0, 1.0, 1.0];
        let scores = array![0.1, 0.5, 0.9];
        assert!(matches!(
            roc_auc(&labels, &scores),
            Err(HarvestError::UndefinedMetric(_))
        ));
    }

    #[test]
    fn test_confusion_matrix_counts() {
        let labels = array![1.0, 1.0, 0.0, 0.0, 1.0];
        let scores = array![0.9, 0.3, 0.8, 0.1, 0.6];
        let m = ConfusionMatrix::at_threshold(&labels, &scores, 0.5).unwrap();

        assert_eq!(m.true_positives, 2);
        assert_eq!(m.false_negatives, 1);
        assert_eq!(m.false_positives, 1);
        assert_eq!(m.true_negatives, 1);
        assert_eq!(m.total(), 5);
        assert!((m.accuracy() - 0.6).abs() < 1e-12);
        assert!((m.sensitivity() - 2.0 / 3.0).abs() < 1e-12);
        assert!((m.specificity() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_threshold_monotonicity() {
        let labels = array![1.0, 1.0, 0.0, 0.0, 1.0, 0.0];
        let scores = array![0.9, 0.3, 0.8, 0.1, 0.06, 0.04];

        let high = ConfusionMatrix::at_threshold(&labels, &scores, 0.5).unwrap();
        let low = ConfusionMatrix::at_threshold(&labels, &scores, 0.05).unwrap();

        assert!(low.true_positives >= high.true_positives);
        assert!(low.false_positives >= high.false_positives);
    }

    #[test]
    fn test_cv_scores_aggregation() {
        let scores = CvScores::from_fold_aucs(vec![0.8, 0.9, 1.0]);
        assert!((scores.mean - 0.9).abs() < 1e-12);
        assert!(scores.std > 0.0);
        assert_eq!(scores.per_fold.len(), 3);
    }
}
