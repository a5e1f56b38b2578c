//! Tabular file loading

use crate::data::Dataset;
use crate::error::{HarvestError, Result};
use polars::prelude::*;
use std::fs::File;
use tracing::info;

/// Load a delimited tabular file into a [`Dataset`]
///
/// The file must carry a header row naming every column; the named outcome
/// column must be boolean-like and fully populated. Column types are
/// inferred from the parsed dtypes (numeric, string, boolean).
pub fn load_csv(path: &str, outcome: &str) -> Result<Dataset> {
    let file = File::open(path).map_err(|e| {
        HarvestError::DataError(format!("cannot open '{}': {}", path, e))
    })?;

    let reader = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(100))
        .into_reader_with_file_handle(file);

    let df = reader
        .finish()
        .map_err(|e| HarvestError::DataError(e.to_string()))?;

    info!(
        rows = df.height(),
        columns = df.width(),
        "loaded dataset from {}",
        path
    );

    Dataset::from_dataframe(df, outcome)
}
