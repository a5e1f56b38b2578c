//! Dataset schema and access
//!
//! A [`Dataset`] is an immutable, schema-checked wrapper over a Polars
//! DataFrame: one row per stem-cell collection event, ~24 predictor fields
//! and one binary outcome label (`poor_recovery`). Loaded once, never
//! mutated; splits and folds are derived as row-index subsets.

mod loader;

pub use loader::load_csv;

use crate::error::{HarvestError, Result};
use ndarray::Array1;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Semantic type of a predictor column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnType {
    Continuous,
    Categorical,
    Boolean,
}

/// One column of the dataset schema
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    pub dtype: ColumnType,
}

/// Fixed schema: ordered predictor columns plus the outcome column name
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schema {
    predictors: Vec<ColumnSpec>,
    outcome: String,
}

impl Schema {
    /// Build a schema explicitly
    pub fn new(predictors: Vec<ColumnSpec>, outcome: impl Into<String>) -> Self {
        Self {
            predictors,
            outcome: outcome.into(),
        }
    }

    /// Infer predictor types from DataFrame dtypes
    ///
    /// Numeric columns map to `Continuous`, boolean to `Boolean`, string to
    /// `Categorical`. The outcome column is excluded from the predictors.
    pub fn infer(df: &DataFrame, outcome: &str) -> Result<Self> {
        if df.column(outcome).is_err() {
            return Err(HarvestError::DataError(format!(
                "outcome column '{}' not found",
                outcome
            )));
        }

        let mut predictors = Vec::new();
        for column in df.get_columns() {
            let name = column.name().to_string();
            if name == outcome {
                continue;
            }
            let dtype = match column.dtype() {
                DataType::Boolean => ColumnType::Boolean,
                DataType::String => ColumnType::Categorical,
                dt if dt.is_primitive_numeric() => ColumnType::Continuous,
                dt => {
                    return Err(HarvestError::DataError(format!(
                        "unsupported dtype {:?} for column '{}'",
                        dt, name
                    )))
                }
            };
            predictors.push(ColumnSpec { name, dtype });
        }

        Ok(Self {
            predictors,
            outcome: outcome.to_string(),
        })
    }

    /// Ordered predictor specs
    pub fn predictors(&self) -> &[ColumnSpec] {
        &self.predictors
    }

    /// Outcome column name
    pub fn outcome(&self) -> &str {
        &self.outcome
    }
}

/// Per-column summary consumed by the report's missingness table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnSummary {
    pub name: String,
    pub dtype: ColumnType,
    pub count: usize,
    pub null_count: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub levels: Option<Vec<String>>,
}

/// Immutable collection of records with a fixed schema
///
/// Invariants checked at construction: every schema column is present,
/// the outcome column has no missing values and is boolean-like.
#[derive(Debug, Clone)]
pub struct Dataset {
    df: DataFrame,
    schema: Schema,
}

impl Dataset {
    /// Wrap a DataFrame under a schema, validating the invariants
    pub fn new(df: DataFrame, schema: Schema) -> Result<Self> {
        for spec in schema.predictors() {
            if df.column(&spec.name).is_err() {
                return Err(HarvestError::SchemaMismatch {
                    column: spec.name.clone(),
                });
            }
        }

        let outcome = df
            .column(schema.outcome())
            .map_err(|_| HarvestError::DataError(format!(
                "outcome column '{}' not found",
                schema.outcome()
            )))?;
        if outcome.null_count() > 0 {
            return Err(HarvestError::DataError(format!(
                "outcome column '{}' has {} missing values; missing outcomes are not permitted",
                schema.outcome(),
                outcome.null_count()
            )));
        }
        // Force the boolean-like check up front so downstream code can rely on it
        outcome_to_binary(outcome.as_materialized_series())?;

        Ok(Self { df, schema })
    }

    /// Wrap a DataFrame, inferring the schema from its dtypes
    pub fn from_dataframe(df: DataFrame, outcome: &str) -> Result<Self> {
        let schema = Schema::infer(&df, outcome)?;
        Self::new(df, schema)
    }

    /// Number of records
    pub fn n_records(&self) -> usize {
        self.df.height()
    }

    /// Underlying DataFrame
    pub fn frame(&self) -> &DataFrame {
        &self.df
    }

    /// Schema
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Outcome labels as 0.0/1.0
    pub fn labels(&self) -> Result<Array1<f64>> {
        let outcome = self
            .df
            .column(self.schema.outcome())
            .map_err(|e| HarvestError::DataError(e.to_string()))?;
        let values = outcome_to_binary(outcome.as_materialized_series())?;
        Ok(Array1::from_vec(values))
    }

    /// Fraction of positive outcome labels
    pub fn positive_fraction(&self) -> Result<f64> {
        let labels = self.labels()?;
        if labels.is_empty() {
            return Ok(0.0);
        }
        Ok(labels.sum() / labels.len() as f64)
    }

    /// Row subset by index, preserving the schema
    pub fn take(&self, indices: &[usize]) -> Result<Dataset> {
        let idx = IdxCa::from_vec(
            "idx".into(),
            indices.iter().map(|&i| i as IdxSize).collect(),
        );
        let df = self
            .df
            .take(&idx)
            .map_err(|e| HarvestError::DataError(e.to_string()))?;
        Ok(Dataset {
            df,
            schema: self.schema.clone(),
        })
    }

    /// Per-column summaries for the report
    pub fn summaries(&self) -> Result<Vec<ColumnSummary>> {
        let mut out = Vec::with_capacity(self.schema.predictors().len());
        for spec in self.schema.predictors() {
            let column = self
                .df
                .column(&spec.name)
                .map_err(|_| HarvestError::SchemaMismatch {
                    column: spec.name.clone(),
                })?;
            let series = column.as_materialized_series();

            let mut summary = ColumnSummary {
                name: spec.name.clone(),
                dtype: spec.dtype,
                count: series.len(),
                null_count: series.null_count(),
                mean: None,
                std: None,
                levels: None,
            };

            match spec.dtype {
                ColumnType::Continuous | ColumnType::Boolean => {
                    let ca = series
                        .cast(&DataType::Float64)
                        .map_err(|e| HarvestError::DataError(e.to_string()))?;
                    let ca = ca.f64().map_err(|e| HarvestError::DataError(e.to_string()))?;
                    summary.mean = ca.mean();
                    summary.std = ca.std(1);
                }
                ColumnType::Categorical => {
                    let ca = series
                        .str()
                        .map_err(|e| HarvestError::DataError(e.to_string()))?;
                    let mut levels: Vec<String> = ca
                        .into_iter()
                        .flatten()
                        .map(|s| s.to_string())
                        .collect();
                    levels.sort();
                    levels.dedup();
                    summary.levels = Some(levels);
                }
            }

            out.push(summary);
        }
        Ok(out)
    }
}

/// Coerce a boolean-like outcome series into 0.0/1.0 values
pub(crate) fn outcome_to_binary(series: &Series) -> Result<Vec<f64>> {
    match series.dtype() {
        DataType::Boolean => {
            let ca = series
                .bool()
                .map_err(|e| HarvestError::DataError(e.to_string()))?;
            ca.into_iter()
                .map(|v| {
                    v.map(|b| if b { 1.0 } else { 0.0 })
                        .ok_or_else(|| HarvestError::DataError("missing outcome value".to_string()))
                })
                .collect()
        }
        DataType::String => {
            let ca = series
                .str()
                .map_err(|e| HarvestError::DataError(e.to_string()))?;
            ca.into_iter()
                .map(|v| {
                    let v = v.ok_or_else(|| {
                        HarvestError::DataError("missing outcome value".to_string())
                    })?;
                    match v.to_ascii_lowercase().as_str() {
                        "true" | "yes" | "1" | "poor" => Ok(1.0),
                        "false" | "no" | "0" | "good" => Ok(0.0),
                        other => Err(HarvestError::DataError(format!(
                            "outcome value '{}' is not boolean-like",
                            other
                        ))),
                    }
                })
                .collect()
        }
        dt if dt.is_primitive_numeric() => {
            let ca = series
                .cast(&DataType::Float64)
                .map_err(|e| HarvestError::DataError(e.to_string()))?;
            let ca = ca.f64().map_err(|e| HarvestError::DataError(e.to_string()))?;
            ca.into_iter()
                .map(|v| {
                    let v = v.ok_or_else(|| {
                        HarvestError::DataError("missing outcome value".to_string())
                    })?;
                    if v == 0.0 || v == 1.0 {
                        Ok(v)
                    } else {
                        Err(HarvestError::DataError(format!(
                            "outcome value {} is not binary",
                            v
                        )))
                    }
                })
                .collect()
        }
        dt => Err(HarvestError::DataError(format!(
            "outcome dtype {:?} is not boolean-like",
            dt
        ))),
    }
}
