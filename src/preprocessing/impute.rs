//! k-NN imputation against a fitted reference pool

use super::{CompleteTable, RawTable};
use crate::error::{HarvestError, Result};
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::collections::BTreeMap;

/// Max-heap entry for partial neighbor selection; distance ties resolve
/// toward the lower pool index so neighbor sets are deterministic
#[derive(Debug, Clone, Copy)]
struct DistanceIdx(f64, usize);

impl PartialEq for DistanceIdx {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0 && self.1 == other.1
    }
}

impl Eq for DistanceIdx {}

impl PartialOrd for DistanceIdx {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DistanceIdx {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0
            .partial_cmp(&other.0)
            .unwrap_or(Ordering::Equal)
            .then(self.1.cmp(&other.1))
    }
}

/// k-NN imputer
///
/// Fitting stores the complete-predictor rows of the fitting subset as the
/// reference pool, plus per-column standardization statistics and fallback
/// values. Transforming any subset imputes its missing cells from that
/// pool; the applied subset's own rows are never used as neighbors.
#[derive(Debug, Clone)]
pub struct KnnImputer {
    neighbors: usize,
    /// Per numeric column: (mean, std) over the fitting subset's observed values
    numeric_stats: Vec<(f64, f64)>,
    /// Per categorical column: most frequent observed level
    categorical_modes: Vec<String>,
    /// Complete rows: raw numeric values
    pool_numeric: Vec<Vec<f64>>,
    /// Complete rows: categorical levels
    pool_categorical: Vec<Vec<String>>,
}

impl KnnImputer {
    /// Fit on the training subset's predictor table
    pub(crate) fn fit(table: &RawTable, neighbors: usize) -> Result<KnnImputer> {
        let mut numeric_stats = Vec::with_capacity(table.numeric.len());
        for (name, values) in &table.numeric {
            let observed: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
            if observed.is_empty() {
                return Err(HarvestError::DataError(format!(
                    "column '{}' has no observed values to fit on",
                    name
                )));
            }
            let mean = observed.iter().sum::<f64>() / observed.len() as f64;
            let var = observed.iter().map(|v| (v - mean).powi(2)).sum::<f64>()
                / (observed.len() as f64 - 1.0).max(1.0);
            let std = var.sqrt();
            numeric_stats.push((mean, if std > 1e-12 { std } else { 1.0 }));
        }

        let mut categorical_modes = Vec::with_capacity(table.categorical.len());
        for (name, values) in &table.categorical {
            let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
            for v in values.iter().flatten() {
                *counts.entry(v.as_str()).or_insert(0) += 1;
            }
            // BTreeMap iteration order makes the lexicographically first
            // level win exact count ties
            let mode = counts
                .iter()
                .max_by_key(|(_, &count)| count)
                .map(|(level, _)| level.to_string())
                .ok_or_else(|| {
                    HarvestError::DataError(format!(
                        "column '{}' has no observed values to fit on",
                        name
                    ))
                })?;
            categorical_modes.push(mode);
        }

        // Reference pool: rows complete across every predictor field
        let mut pool_numeric = Vec::new();
        let mut pool_categorical = Vec::new();
        for row in 0..table.n_rows {
            let numeric_row: Vec<f64> = table.numeric.iter().map(|(_, v)| v[row]).collect();
            if numeric_row.iter().any(|v| v.is_nan()) {
                continue;
            }
            let categorical_row: Option<Vec<String>> = table
                .categorical
                .iter()
                .map(|(_, v)| v[row].clone())
                .collect();
            let Some(categorical_row) = categorical_row else {
                continue;
            };
            pool_numeric.push(numeric_row);
            pool_categorical.push(categorical_row);
        }

        if pool_numeric.is_empty() {
            return Err(HarvestError::InsufficientData(
                "no complete rows available as an imputation reference pool".to_string(),
            ));
        }

        Ok(KnnImputer {
            neighbors: neighbors.max(1),
            numeric_stats,
            categorical_modes,
            pool_numeric,
            pool_categorical,
        })
    }

    /// Distance between a query row and one pool row
    ///
    /// Mean over comparable fields of squared standardized numeric
    /// differences and categorical mismatch indicators; fields missing in
    /// the query are skipped. Infinite when nothing is comparable.
    fn distance(&self, query_numeric: &[f64], query_categorical: &[Option<&str>], pool_idx: usize) -> f64 {
        let mut accum = 0.0f64;
        let mut count = 0usize;

        let pool_numeric = &self.pool_numeric[pool_idx];
        for (j, &q) in query_numeric.iter().enumerate() {
            if q.is_nan() {
                continue;
            }
            let (_, std) = self.numeric_stats[j];
            let d = (q - pool_numeric[j]) / std;
            accum += d * d;
            count += 1;
        }

        let pool_categorical = &self.pool_categorical[pool_idx];
        for (j, q) in query_categorical.iter().enumerate() {
            let Some(q) = q else { continue };
            if *q != pool_categorical[j] {
                accum += 1.0;
            }
            count += 1;
        }

        if count == 0 {
            return f64::INFINITY;
        }
        (accum / count as f64).sqrt()
    }

    /// Find the k nearest pool rows for a query
    fn find_neighbors(&self, query_numeric: &[f64], query_categorical: &[Option<&str>]) -> Vec<usize> {
        let k = self.neighbors;
        let mut heap: BinaryHeap<DistanceIdx> = BinaryHeap::with_capacity(k + 1);

        for pool_idx in 0..self.pool_numeric.len() {
            let dist = self.distance(query_numeric, query_categorical, pool_idx);
            if !dist.is_finite() {
                continue;
            }
            let entry = DistanceIdx(dist, pool_idx);
            if heap.len() < k {
                heap.push(entry);
            } else if let Some(&top) = heap.peek() {
                if entry < top {
                    heap.pop();
                    heap.push(entry);
                }
            }
        }

        heap.into_iter().map(|DistanceIdx(_, i)| i).collect()
    }

    /// Impute every missing cell of `table` from the fitted pool
    pub(crate) fn transform(&self, table: &RawTable) -> Result<CompleteTable> {
        if table.numeric.len() != self.numeric_stats.len()
            || table.categorical.len() != self.categorical_modes.len()
        {
            return Err(HarvestError::ShapeError {
                expected: format!(
                    "{} numeric + {} categorical predictors",
                    self.numeric_stats.len(),
                    self.categorical_modes.len()
                ),
                actual: format!(
                    "{} numeric + {} categorical predictors",
                    table.numeric.len(),
                    table.categorical.len()
                ),
            });
        }

        let mut numeric: Vec<(String, Vec<f64>)> = table
            .numeric
            .iter()
            .map(|(name, values)| (name.clone(), values.clone()))
            .collect();
        let mut categorical: Vec<(String, Vec<String>)> = table
            .categorical
            .iter()
            .map(|(name, values)| {
                let filled: Vec<String> = values
                    .iter()
                    .map(|v| v.clone().unwrap_or_default())
                    .collect();
                (name.clone(), filled)
            })
            .collect();

        for row in 0..table.n_rows {
            let query_numeric: Vec<f64> = table.numeric.iter().map(|(_, v)| v[row]).collect();
            let query_categorical: Vec<Option<&str>> = table
                .categorical
                .iter()
                .map(|(_, v)| v[row].as_deref())
                .collect();

            let missing_numeric: Vec<usize> = query_numeric
                .iter()
                .enumerate()
                .filter(|(_, v)| v.is_nan())
                .map(|(j, _)| j)
                .collect();
            let missing_categorical: Vec<usize> = query_categorical
                .iter()
                .enumerate()
                .filter(|(_, v)| v.is_none())
                .map(|(j, _)| j)
                .collect();

            if missing_numeric.is_empty() && missing_categorical.is_empty() {
                continue;
            }

            let neighbors = self.find_neighbors(&query_numeric, &query_categorical);

            for &j in &missing_numeric {
                numeric[j].1[row] = self.impute_numeric(&neighbors, j);
            }
            for &j in &missing_categorical {
                categorical[j].1[row] = self.impute_categorical(&neighbors, j);
            }
        }

        Ok(CompleteTable {
            numeric,
            categorical,
            n_rows: table.n_rows,
        })
    }

    /// Neighbor mean, falling back to the fitted column mean
    fn impute_numeric(&self, neighbors: &[usize], col: usize) -> f64 {
        if neighbors.is_empty() {
            return self.numeric_stats[col].0;
        }
        let sum: f64 = neighbors.iter().map(|&i| self.pool_numeric[i][col]).sum();
        sum / neighbors.len() as f64
    }

    /// Neighbor mode, falling back to the fitted column mode
    fn impute_categorical(&self, neighbors: &[usize], col: usize) -> String {
        if neighbors.is_empty() {
            return self.categorical_modes[col].clone();
        }
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for &i in neighbors {
            *counts.entry(self.pool_categorical[i][col].as_str()).or_insert(0) += 1;
        }
        counts
            .iter()
            .max_by_key(|(_, &count)| count)
            .map(|(level, _)| level.to_string())
            .unwrap_or_else(|| self.categorical_modes[col].clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(
        numeric: Vec<(&str, Vec<f64>)>,
        categorical: Vec<(&str, Vec<Option<&str>>)>,
    ) -> RawTable {
        let n_rows = numeric
            .first()
            .map(|(_, v)| v.len())
            .or_else(|| categorical.first().map(|(_, v)| v.len()))
            .unwrap_or(0);
        RawTable {
            numeric: numeric
                .into_iter()
                .map(|(n, v)| (n.to_string(), v))
                .collect(),
            categorical: categorical
                .into_iter()
                .map(|(n, v)| (n.to_string(), v.into_iter().map(|o| o.map(String::from)).collect()))
                .collect(),
            n_rows,
        }
    }

    #[test]
    fn test_numeric_imputation_uses_neighbors() {
        let t = table(
            vec![
                ("a", vec![1.0, 2.0, 3.0, 4.0, f64::NAN]),
                ("b", vec![10.0, 20.0, 30.0, 40.0, 12.0]),
            ],
            vec![],
        );

        let imputer = KnnImputer::fit(&t, 2).unwrap();
        let complete = imputer.transform(&t).unwrap();

        let imputed = complete.numeric[0].1[4];
        assert!(!imputed.is_nan());
        // b = 12 sits closest to rows 0 and 1, so a lands between 1 and 2
        assert!(imputed >= 1.0 && imputed <= 2.0, "imputed {}", imputed);
    }

    #[test]
    fn test_categorical_imputation_uses_neighbor_mode() {
        let t = table(
            vec![("a", vec![1.0, 1.1, 9.0, 9.1, 1.05])],
            vec![(
                "grp",
                vec![Some("low"), Some("low"), Some("high"), Some("high"), None],
            )],
        );

        let imputer = KnnImputer::fit(&t, 2).unwrap();
        let complete = imputer.transform(&t).unwrap();
        assert_eq!(complete.categorical[0].1[4], "low");
    }

    #[test]
    fn test_pool_never_includes_applied_rows() {
        let fit_table = table(
            vec![("a", vec![1.0, 2.0, 3.0]), ("b", vec![1.0, 2.0, 3.0])],
            vec![],
        );
        let imputer = KnnImputer::fit(&fit_table, 3).unwrap();

        // The applied subset's own complete row (100, 100) must not pull
        // the imputed value away from the fitted pool's range
        let apply_table = table(
            vec![("a", vec![100.0, f64::NAN]), ("b", vec![100.0, 2.0])],
            vec![],
        );
        let complete = imputer.transform(&apply_table).unwrap();
        let imputed = complete.numeric[0].1[1];
        assert!((1.0..=3.0).contains(&imputed), "imputed {}", imputed);
    }

    #[test]
    fn test_no_complete_rows_is_insufficient_data() {
        let t = table(
            vec![("a", vec![f64::NAN, 1.0]), ("b", vec![1.0, f64::NAN])],
            vec![],
        );
        let result = KnnImputer::fit(&t, 3);
        assert!(matches!(result, Err(HarvestError::InsufficientData(_))));
    }

    #[test]
    fn test_all_missing_row_falls_back_to_fitted_stats() {
        let t = table(
            vec![("a", vec![1.0, 2.0, 3.0])],
            vec![("grp", vec![Some("x"), Some("x"), Some("y")])],
        );
        let imputer = KnnImputer::fit(&t, 2).unwrap();

        let apply_table = table(vec![("a", vec![f64::NAN])], vec![("grp", vec![None])]);
        let complete = imputer.transform(&apply_table).unwrap();

        assert_eq!(complete.numeric[0].1[0], 2.0);
        assert_eq!(complete.categorical[0].1[0], "x");
    }
}
