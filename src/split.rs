//! Stratified splitting and fold generation
//!
//! Both partitions are keyed on the outcome label so that class proportions
//! are approximately preserved, and both are driven by an explicitly seeded
//! generator so that the same seed always reproduces the same partition.

use crate::data::Dataset;
use crate::error::{HarvestError, Result};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::BTreeMap;

/// A single fold's train/validation index pair
#[derive(Debug, Clone)]
pub struct FoldSplit {
    pub fold_idx: usize,
    /// Training complement: every train-subset record outside the fold
    pub train_indices: Vec<usize>,
    /// Held-out fold
    pub test_indices: Vec<usize>,
}

/// A label-stratified partition of the training subset into k folds
#[derive(Debug, Clone)]
pub struct FoldSet {
    folds: Vec<Vec<usize>>,
}

impl FoldSet {
    /// Number of folds
    pub fn k(&self) -> usize {
        self.folds.len()
    }

    /// Raw fold membership
    pub fn folds(&self) -> &[Vec<usize>] {
        &self.folds
    }

    /// Materialize every (complement, fold) pair
    pub fn splits(&self) -> Vec<FoldSplit> {
        (0..self.folds.len())
            .map(|fold_idx| {
                let test_indices = self.folds[fold_idx].clone();
                let train_indices: Vec<usize> = self
                    .folds
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| *i != fold_idx)
                    .flat_map(|(_, f)| f.iter().copied())
                    .collect();
                FoldSplit {
                    fold_idx,
                    train_indices,
                    test_indices,
                }
            })
            .collect()
    }
}

/// Group record indices by outcome label, in label order
fn indices_by_class(dataset: &Dataset) -> Result<BTreeMap<i64, Vec<usize>>> {
    let labels = dataset.labels()?;
    let mut by_class: BTreeMap<i64, Vec<usize>> = BTreeMap::new();
    for (i, &label) in labels.iter().enumerate() {
        by_class.entry(label as i64).or_default().push(i);
    }
    Ok(by_class)
}

/// Stratified train/test split
///
/// Shuffles within each outcome class and assigns a proportional share of
/// each class to the training subset. Guarantees train ∪ test covers the
/// whole dataset with no overlap; per-class proportions match the source
/// up to rounding. Subset row order follows the original dataset.
pub fn train_test_split(
    dataset: &Dataset,
    train_fraction: f64,
    seed: u64,
) -> Result<(Dataset, Dataset)> {
    if !(train_fraction > 0.0 && train_fraction < 1.0) {
        return Err(HarvestError::InvalidParameter {
            name: "train_fraction".to_string(),
            value: train_fraction.to_string(),
            reason: "must be in (0, 1)".to_string(),
        });
    }

    let by_class = indices_by_class(dataset)?;
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    let mut train_indices = Vec::new();
    let mut test_indices = Vec::new();

    for indices in by_class.values() {
        let mut shuffled = indices.clone();
        shuffled.shuffle(&mut rng);

        let mut n_train = (indices.len() as f64 * train_fraction).round() as usize;
        // Keep at least one record on each side when the class allows it
        if indices.len() >= 2 {
            n_train = n_train.clamp(1, indices.len() - 1);
        } else {
            n_train = n_train.min(indices.len());
        }

        train_indices.extend_from_slice(&shuffled[..n_train]);
        test_indices.extend_from_slice(&shuffled[n_train..]);
    }

    if train_indices.is_empty() || test_indices.is_empty() {
        return Err(HarvestError::InsufficientData(
            "stratified split produced an empty train or test subset".to_string(),
        ));
    }

    train_indices.sort_unstable();
    test_indices.sort_unstable();

    Ok((dataset.take(&train_indices)?, dataset.take(&test_indices)?))
}

/// Label-stratified k-fold partition
///
/// Each class is shuffled and dealt round-robin across folds; a single
/// cursor carries over between classes so overall fold sizes stay within
/// one record of each other. Fails when any class has fewer than k members,
/// since the stratified folds would be empty for that class.
pub fn stratified_kfold(dataset: &Dataset, k: usize, seed: u64) -> Result<FoldSet> {
    if k < 2 {
        return Err(HarvestError::InvalidParameter {
            name: "k".to_string(),
            value: k.to_string(),
            reason: "must be at least 2".to_string(),
        });
    }

    let by_class = indices_by_class(dataset)?;
    for (class, indices) in &by_class {
        if indices.len() < k {
            return Err(HarvestError::InsufficientData(format!(
                "class {} has {} records, fewer than k = {}",
                class,
                indices.len(),
                k
            )));
        }
    }

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut folds: Vec<Vec<usize>> = vec![Vec::new(); k];
    let mut cursor = 0usize;

    for indices in by_class.values() {
        let mut shuffled = indices.clone();
        shuffled.shuffle(&mut rng);
        for idx in shuffled {
            folds[cursor % k].push(idx);
            cursor += 1;
        }
    }

    for fold in &mut folds {
        fold.sort_unstable();
    }

    Ok(FoldSet { folds })
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;

    fn labeled_dataset(n_pos: usize, n_neg: usize) -> Dataset {
        let n = n_pos + n_neg;
        let x: Vec<f64> = (0..n).map(|i| i as f64).collect();
        let y: Vec<bool> = (0..n).map(|i| i < n_pos).collect();
        let df = df!(
            "x" => &x,
            "poor_recovery" => &y,
        )
        .unwrap();
        Dataset::from_dataframe(df, "poor_recovery").unwrap()
    }

    #[test]
    fn test_split_completeness() {
        let ds = labeled_dataset(20, 80);
        let (train, test) = train_test_split(&ds, 0.8, 42).unwrap();

        assert_eq!(train.n_records() + test.n_records(), 100);
        assert_eq!(train.n_records(), 80);
        assert_eq!(test.n_records(), 20);
    }

    #[test]
    fn test_split_stratification() {
        let ds = labeled_dataset(20, 80);
        let (train, test) = train_test_split(&ds, 0.8, 42).unwrap();

        let train_pos = train.labels().unwrap().sum();
        let test_pos = test.labels().unwrap().sum();
        assert_eq!(train_pos as usize, 16);
        assert_eq!(test_pos as usize, 4);
    }

    #[test]
    fn test_split_reproducible() {
        let ds = labeled_dataset(30, 70);
        let (train_a, _) = train_test_split(&ds, 0.75, 7).unwrap();
        let (train_b, _) = train_test_split(&ds, 0.75, 7).unwrap();

        assert_eq!(
            train_a.labels().unwrap().to_vec(),
            train_b.labels().unwrap().to_vec()
        );
        assert_eq!(train_a.n_records(), train_b.n_records());
    }

    #[test]
    fn test_split_rejects_bad_fraction() {
        let ds = labeled_dataset(10, 10);
        assert!(train_test_split(&ds, 0.0, 1).is_err());
        assert!(train_test_split(&ds, 1.0, 1).is_err());
    }

    #[test]
    fn test_kfold_coverage() {
        let ds = labeled_dataset(20, 60);
        let folds = stratified_kfold(&ds, 10, 42).unwrap();

        assert_eq!(folds.k(), 10);

        let mut all: Vec<usize> = folds.folds().iter().flatten().copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..80).collect::<Vec<_>>());

        for fold in folds.folds() {
            assert!(fold.len() == 8, "fold size {}", fold.len());
        }
    }

    #[test]
    fn test_kfold_complements() {
        let ds = labeled_dataset(10, 30);
        let folds = stratified_kfold(&ds, 4, 1).unwrap();

        for split in folds.splits() {
            assert_eq!(split.train_indices.len() + split.test_indices.len(), 40);
            for idx in &split.test_indices {
                assert!(!split.train_indices.contains(idx));
            }
        }
    }

    #[test]
    fn test_kfold_insufficient_class() {
        let ds = labeled_dataset(3, 40);
        let result = stratified_kfold(&ds, 5, 42);
        assert!(matches!(result, Err(HarvestError::InsufficientData(_))));
    }

    #[test]
    fn test_kfold_rejects_k_below_two() {
        let ds = labeled_dataset(10, 10);
        assert!(stratified_kfold(&ds, 1, 42).is_err());
    }
}
