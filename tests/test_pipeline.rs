//! Integration tests: split → recipe → train → score over a synthetic
//! dataset with a known class balance and missingness pattern

use harvest_ml::data::Dataset;
use harvest_ml::evaluation::{finalize, grid_search, TuningGrid};
use harvest_ml::metrics::{roc_auc, ConfusionMatrix};
use harvest_ml::preprocessing::Recipe;
use harvest_ml::split::{stratified_kfold, train_test_split};
use harvest_ml::training::{ModelSpec, RandomForestParams};
use harvest_ml::{run_analysis, RunConfig};
use polars::prelude::*;

/// 100 records, 80/20 outcome split, 5 predictors: 2 numeric with 5%
/// missing values, 3 categorical with 3 levels each. Only the marker
/// carries signal, with enough class overlap to keep ranking imperfect.
fn synthetic_dataset() -> Dataset {
    let n = 100;
    let mut marker = Vec::with_capacity(n);
    let mut platelets = Vec::with_capacity(n);
    let mut mobilizer = Vec::with_capacity(n);
    let mut donor_type = Vec::with_capacity(n);
    let mut site = Vec::with_capacity(n);
    let mut outcome = Vec::with_capacity(n);

    for i in 0..n {
        let positive = i % 5 == 0; // 20 of 100

        // Classes overlap on the marker so ranking stays imperfect
        marker.push(if i % 20 == 3 {
            None
        } else if positive {
            Some(8.0 + (i % 8) as f64)
        } else {
            Some(5.0 + (i % 9) as f64)
        });

        platelets.push(if i % 20 == 11 {
            None
        } else {
            Some(150.0 + ((i * 13) % 80) as f64)
        });

        mobilizer.push(["gcsf", "chemo", "plerixafor"][i % 3]);
        donor_type.push(["autologous", "sibling", "unrelated"][i % 3]);
        site.push(["a", "b", "c"][(i * 7) % 3]);

        outcome.push(positive);
    }

    let df = df!(
        "marker" => &marker,
        "platelets" => &platelets,
        "mobilizer" => &mobilizer,
        "donor_type" => &donor_type,
        "site" => &site,
        "poor_recovery" => &outcome,
    )
    .unwrap();
    Dataset::from_dataframe(df, "poor_recovery").unwrap()
}

#[test]
fn test_split_sizes_and_proportions() {
    let ds = synthetic_dataset();
    let (train, test) = train_test_split(&ds, 0.8, 100).unwrap();

    assert_eq!(train.n_records(), 80);
    assert_eq!(test.n_records(), 20);

    // Class proportions within two records of 80/20
    let train_pos = train.labels().unwrap().sum() as i64;
    let test_pos = test.labels().unwrap().sum() as i64;
    assert!((train_pos - 16).abs() <= 2, "train positives {}", train_pos);
    assert!((test_pos - 4).abs() <= 2, "test positives {}", test_pos);
}

#[test]
fn test_fold_sizes() {
    let ds = synthetic_dataset();
    let (train, _) = train_test_split(&ds, 0.8, 100).unwrap();
    let folds = stratified_kfold(&train, 10, 100).unwrap();

    assert_eq!(folds.k(), 10);
    for fold in folds.folds() {
        let size = fold.len() as i64;
        assert!((size - 8).abs() <= 1, "fold size {}", size);
    }

    // Every training record lands in exactly one fold
    let mut all: Vec<usize> = folds.folds().iter().flatten().copied().collect();
    all.sort_unstable();
    all.dedup();
    assert_eq!(all.len(), 80);
}

#[test]
fn test_forest_scores_test_subset() {
    let ds = synthetic_dataset();
    let (train, test) = train_test_split(&ds, 0.8, 100).unwrap();

    let spec = ModelSpec::RandomForest(RandomForestParams {
        trees: 100,
        mtry: Some(2),
        min_node: 5,
    });

    let recipe = Recipe::new(5).fit(&train).unwrap();
    let train_design = recipe.apply(&train).unwrap();
    let test_design = recipe.apply(&test).unwrap();

    assert!(!train_design.x.iter().any(|v| v.is_nan()));
    assert!(!test_design.x.iter().any(|v| v.is_nan()));
    assert_eq!(train_design.columns, test_design.columns);

    let model = spec.fit(&train_design.x, &train_design.y, 100).unwrap();
    let probs = model.predict_proba(&test_design.x).unwrap();
    let auc = roc_auc(&test_design.y, &probs).unwrap();

    assert!(auc.is_finite());
    assert!(auc > 0.0 && auc < 1.0, "AUC {}", auc);
    // The marker carries real signal, so the model ranks above chance
    assert!(auc > 0.5, "AUC {}", auc);
}

#[test]
fn test_threshold_sensitivity_monotone() {
    let ds = synthetic_dataset();
    let (train, test) = train_test_split(&ds, 0.8, 100).unwrap();

    let spec = ModelSpec::RandomForest(RandomForestParams {
        trees: 100,
        mtry: Some(2),
        min_node: 5,
    });
    let recipe = Recipe::new(5).fit(&train).unwrap();
    let train_design = recipe.apply(&train).unwrap();
    let test_design = recipe.apply(&test).unwrap();
    let model = spec.fit(&train_design.x, &train_design.y, 100).unwrap();
    let probs = model.predict_proba(&test_design.x).unwrap();

    let mut prev = ConfusionMatrix::at_threshold(&test_design.y, &probs, 0.5).unwrap();
    for threshold in [0.4, 0.3, 0.2, 0.1, 0.05] {
        let next = ConfusionMatrix::at_threshold(&test_design.y, &probs, threshold).unwrap();
        assert!(next.true_positives >= prev.true_positives);
        assert!(next.false_positives >= prev.false_positives);
        prev = next;
    }
}

#[test]
fn test_tuner_ranking_reproducible() {
    let ds = synthetic_dataset();
    let (train, _) = train_test_split(&ds, 0.8, 100).unwrap();
    let folds = stratified_kfold(&train, 5, 100).unwrap();

    let grid = TuningGrid::RandomForest {
        trees: vec![25, 50],
        mtry: vec![2, 4],
        min_node: vec![5],
    };

    let a = grid_search(&grid, &train, &folds, 5, 100).unwrap();
    let b = grid_search(&grid, &train, &folds, 5, 100).unwrap();

    assert_eq!(a.len(), 4);
    for (ea, eb) in a.iter().zip(b.iter()) {
        assert_eq!(ea.spec, eb.spec);
        assert_eq!(ea.scores.per_fold, eb.scores.per_fold);
    }
}

#[test]
fn test_finalize_on_synthetic_data() {
    let ds = synthetic_dataset();
    let (train, test) = train_test_split(&ds, 0.8, 100).unwrap();

    let spec = ModelSpec::RandomForest(RandomForestParams {
        trees: 100,
        mtry: Some(2),
        min_node: 5,
    });
    let (_, report) = finalize(&spec, &train, &test, 5, 0.5, 100).unwrap();

    assert_eq!(report.predictions.len(), 20);
    assert_eq!(report.confusion.total(), 20);
    assert!(report.test_auc > 0.0 && report.test_auc <= 1.0);

    let importances = report.feature_importances.expect("forest has importances");
    // One importance entry per design column, ranked descending
    for pair in importances.windows(2) {
        assert!(pair[0].1 >= pair[1].1);
    }
    let total: f64 = importances.iter().map(|(_, v)| v).sum();
    assert!((total - 1.0).abs() < 1e-9);
}

#[test]
fn test_full_report_runs() {
    let ds = synthetic_dataset();
    let config = RunConfig {
        folds: 5,
        recipe_neighbors: 5,
        train_fraction: 0.8,
        seed: 100,
        forest_grid: TuningGrid::RandomForest {
            trees: vec![25, 50],
            mtry: vec![2],
            min_node: vec![5],
        },
        knn_grid: TuningGrid::Knn { k: vec![3, 5] },
        boosted_grid: TuningGrid::GradientBoosted {
            trees: vec![25],
            learning_rate: vec![0.1],
            tree_depth: vec![2, 3],
        },
        candidates: vec![
            ModelSpec::RandomForest(RandomForestParams {
                trees: 25,
                mtry: Some(2),
                min_node: 5,
            }),
            ModelSpec::Knn(harvest_ml::training::KnnParams { k: 5 }),
            ModelSpec::GradientBoosted(harvest_ml::training::GradientBoostedParams {
                trees: 25,
                ..Default::default()
            }),
        ],
        ..Default::default()
    };

    let report = run_analysis(&ds, &config).unwrap();

    assert_eq!(report.n_records, 100);
    assert_eq!(report.comparison.len(), 3);
    assert!(report.comparison[0].scores.mean >= report.comparison[1].scores.mean);
    assert!(!report.tuning.is_empty());
    assert!(report.final_report.test_auc > 0.0);

    // The missingness table reflects the 5% gaps in both numeric columns
    let marker_summary = report
        .column_summaries
        .iter()
        .find(|s| s.name == "marker")
        .unwrap();
    assert_eq!(marker_summary.null_count, 5);
}
