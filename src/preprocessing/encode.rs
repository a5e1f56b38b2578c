//! Reference-dropped dummy encoding

use super::{CompleteTable, RawTable};
use crate::error::{HarvestError, Result};
use ndarray::Array2;

/// Dummy (one-hot, n-1) encoder with a fit-frozen output column set
///
/// Each categorical predictor expands to one indicator column per observed
/// level except the first, which is dropped as the reference. Levels unseen
/// at fit time encode as all-zero rows. Numeric predictors pass through
/// ahead of the indicators, in schema order.
#[derive(Debug, Clone)]
pub struct DummyEncoder {
    numeric_names: Vec<String>,
    /// Per categorical column: (name, sorted observed levels)
    levels: Vec<(String, Vec<String>)>,
}

impl DummyEncoder {
    /// Record the observed levels of every categorical predictor
    pub(crate) fn fit(table: &RawTable) -> DummyEncoder {
        let numeric_names = table.numeric.iter().map(|(n, _)| n.clone()).collect();

        let levels = table
            .categorical
            .iter()
            .map(|(name, values)| {
                let mut observed: Vec<String> =
                    values.iter().flatten().cloned().collect();
                observed.sort();
                observed.dedup();
                (name.clone(), observed)
            })
            .collect();

        DummyEncoder {
            numeric_names,
            levels,
        }
    }

    /// The frozen output column names: numerics, then indicators
    pub(crate) fn output_columns(&self) -> Vec<String> {
        let mut out = self.numeric_names.clone();
        for (name, levels) in &self.levels {
            for level in levels.iter().skip(1) {
                out.push(format!("{}_{}", name, level));
            }
        }
        out
    }

    /// Encode an imputed table into a numeric design matrix
    pub(crate) fn transform(&self, table: &CompleteTable) -> Result<(Vec<String>, Array2<f64>)> {
        if table.numeric.len() != self.numeric_names.len()
            || table.categorical.len() != self.levels.len()
        {
            return Err(HarvestError::ShapeError {
                expected: format!(
                    "{} numeric + {} categorical predictors",
                    self.numeric_names.len(),
                    self.levels.len()
                ),
                actual: format!(
                    "{} numeric + {} categorical predictors",
                    table.numeric.len(),
                    table.categorical.len()
                ),
            });
        }

        let columns = self.output_columns();
        let n_rows = table.n_rows;
        let mut x = Array2::zeros((n_rows, columns.len()));

        for (j, (_, values)) in table.numeric.iter().enumerate() {
            for (row, &v) in values.iter().enumerate() {
                x[[row, j]] = v;
            }
        }

        let mut col = self.numeric_names.len();
        for ((_, levels), (_, values)) in self.levels.iter().zip(table.categorical.iter()) {
            for level in levels.iter().skip(1) {
                for (row, v) in values.iter().enumerate() {
                    if v == level {
                        x[[row, col]] = 1.0;
                    }
                }
                col += 1;
            }
        }

        Ok((columns, x))
    }
}
