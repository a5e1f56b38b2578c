//! Preprocessing recipe
//!
//! A [`Recipe`] is a fit-once, apply-many transformation: k-NN imputation
//! of missing predictor values followed by reference-dropped dummy encoding
//! of categorical predictors. Fitting derives all state (imputation
//! reference pool, standardization statistics, category levels, output
//! column set) from the fitting subset alone; applying to any other subset
//! reuses that state unchanged. This is the leakage boundary: a fold's
//! validation data never influences the transformation it is scored under.

mod encode;
mod impute;

use encode::DummyEncoder;
use impute::KnnImputer;

use crate::data::{ColumnType, Dataset, Schema};
use crate::error::{HarvestError, Result};
use ndarray::{Array1, Array2};
use polars::prelude::*;

/// Predictor columns of one subset, split by semantic type
///
/// Numeric columns (continuous and boolean) carry `NaN` for missing values;
/// categorical columns carry `None`. Column order follows the schema.
#[derive(Debug, Clone)]
pub(crate) struct RawTable {
    pub numeric: Vec<(String, Vec<f64>)>,
    pub categorical: Vec<(String, Vec<Option<String>>)>,
    pub n_rows: usize,
}

impl RawTable {
    /// Extract predictor columns named by `schema` from `df`
    ///
    /// Fails with [`HarvestError::SchemaMismatch`] if any expected predictor
    /// column is absent.
    pub(crate) fn extract(df: &DataFrame, schema: &Schema) -> Result<RawTable> {
        let mut numeric = Vec::new();
        let mut categorical = Vec::new();

        for spec in schema.predictors() {
            let column = df
                .column(&spec.name)
                .map_err(|_| HarvestError::SchemaMismatch {
                    column: spec.name.clone(),
                })?;
            let series = column.as_materialized_series();

            match spec.dtype {
                ColumnType::Continuous | ColumnType::Boolean => {
                    let ca = series
                        .cast(&DataType::Float64)
                        .map_err(|e| HarvestError::DataError(e.to_string()))?;
                    let values: Vec<f64> = ca
                        .f64()
                        .map_err(|e| HarvestError::DataError(e.to_string()))?
                        .into_iter()
                        .map(|v| v.unwrap_or(f64::NAN))
                        .collect();
                    numeric.push((spec.name.clone(), values));
                }
                ColumnType::Categorical => {
                    let ca = series
                        .str()
                        .map_err(|e| HarvestError::DataError(e.to_string()))?;
                    let values: Vec<Option<String>> = ca
                        .into_iter()
                        .map(|v| v.map(|s| s.to_string()))
                        .collect();
                    categorical.push((spec.name.clone(), values));
                }
            }
        }

        Ok(RawTable {
            numeric,
            categorical,
            n_rows: df.height(),
        })
    }
}

/// Fully imputed predictor columns (no missing values remain)
#[derive(Debug, Clone)]
pub(crate) struct CompleteTable {
    pub numeric: Vec<(String, Vec<f64>)>,
    pub categorical: Vec<(String, Vec<String>)>,
    pub n_rows: usize,
}

/// A transformed subset: design matrix, its column names, outcome labels
#[derive(Debug, Clone)]
pub struct Design {
    pub columns: Vec<String>,
    pub x: Array2<f64>,
    pub y: Array1<f64>,
}

/// Unfitted recipe specification
#[derive(Debug, Clone, Copy)]
pub struct Recipe {
    neighbors: usize,
}

impl Recipe {
    /// Create a recipe with the given imputation neighbor count
    pub fn new(neighbors: usize) -> Self {
        Self {
            neighbors: neighbors.max(1),
        }
    }

    /// Fit the recipe on a training subset
    pub fn fit(&self, data: &Dataset) -> Result<FittedRecipe> {
        let schema = data.schema().clone();
        let table = RawTable::extract(data.frame(), &schema)?;

        let imputer = KnnImputer::fit(&table, self.neighbors)?;
        let encoder = DummyEncoder::fit(&table);

        Ok(FittedRecipe {
            schema,
            imputer,
            encoder,
        })
    }
}

impl Default for Recipe {
    fn default() -> Self {
        Self::new(5)
    }
}

/// Immutable fitted recipe, passed explicitly to every apply call
#[derive(Debug, Clone)]
pub struct FittedRecipe {
    schema: Schema,
    imputer: KnnImputer,
    encoder: DummyEncoder,
}

impl FittedRecipe {
    /// Transform a subset with the state derived at fit time
    ///
    /// The output column set and order are identical for every call,
    /// regardless of which categories or missingness patterns appear in
    /// the applied subset.
    pub fn apply(&self, data: &Dataset) -> Result<Design> {
        let table = RawTable::extract(data.frame(), &self.schema)?;
        let complete = self.imputer.transform(&table)?;
        let (columns, x) = self.encoder.transform(&complete)?;
        let y = data.labels()?;
        Ok(Design { columns, x, y })
    }

    /// The frozen output column names
    pub fn output_columns(&self) -> Vec<String> {
        self.encoder.output_columns()
    }
}
