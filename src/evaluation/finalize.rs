//! Final evaluation on the held-out test subset

use crate::data::Dataset;
use crate::error::Result;
use crate::metrics::{roc_auc, ConfusionMatrix};
use crate::preprocessing::Recipe;
use crate::training::{FittedModel, ModelSpec, Prediction};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Everything the report needs from the final fit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinalReport {
    pub spec: ModelSpec,
    pub test_auc: f64,
    pub confusion: ConfusionMatrix,
    pub predictions: Vec<Prediction>,
    /// (column name, importance) ranked descending; present when the
    /// family defines importances
    pub feature_importances: Option<Vec<(String, f64)>>,
}

/// Refit the chosen candidate on the entire training subset and score the
/// untouched test subset once
///
/// The recipe is fit on the full training subset (not per-fold) and applied
/// to both subsets; the test subset never influences imputation or encoding
/// state.
pub fn finalize(
    spec: &ModelSpec,
    train: &Dataset,
    test: &Dataset,
    neighbors: usize,
    threshold: f64,
    seed: u64,
) -> Result<(FittedModel, FinalReport)> {
    let recipe = Recipe::new(neighbors).fit(train)?;
    let train_design = recipe.apply(train)?;
    let test_design = recipe.apply(test)?;

    let model = spec.fit(&train_design.x, &train_design.y, seed)?;
    let probs = model.predict_proba(&test_design.x)?;

    let test_auc = roc_auc(&test_design.y, &probs)?;
    let confusion = ConfusionMatrix::at_threshold(&test_design.y, &probs, threshold)?;

    let predictions: Vec<Prediction> = test_design
        .y
        .iter()
        .zip(probs.iter())
        .map(|(&actual, &probability)| Prediction {
            actual: actual > 0.5,
            predicted: probability >= threshold,
            probability,
        })
        .collect();

    let feature_importances = model.feature_importances().map(|importances| {
        let mut ranked: Vec<(String, f64)> = train_design
            .columns
            .iter()
            .cloned()
            .zip(importances.iter().copied())
            .collect();
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        ranked
    });

    info!(
        family = spec.family(),
        test_auc,
        accuracy = confusion.accuracy(),
        "final evaluation complete"
    );

    let report = FinalReport {
        spec: spec.clone(),
        test_auc,
        confusion,
        predictions,
        feature_importances,
    };
    Ok((model, report))
}
