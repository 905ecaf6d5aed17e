//! Feature schema: the column order shared by training and serving.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::error::DatasetError;
use super::table::RawTable;
use super::value::RawValue;

/// File name of the persisted schema inside the models directory.
pub const SCHEMA_FILE_NAME: &str = "preprocessor_meta.json";

/// Ordered numeric and categorical input columns plus the derived
/// post-encoding feature names.
///
/// `numeric_cols ++ cat_cols` is the exact column order the fitted pipeline
/// consumes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSchema {
    pub numeric_cols: Vec<String>,
    pub cat_cols: Vec<String>,
    #[serde(default)]
    pub feature_names: Vec<String>,
}

impl FeatureSchema {
    pub fn new(numeric_cols: Vec<String>, cat_cols: Vec<String>) -> Self {
        Self {
            numeric_cols,
            cat_cols,
            feature_names: Vec::new(),
        }
    }

    /// Partition table columns by type, keeping file order.
    ///
    /// A column is numeric when every present cell is numeric; an all-missing
    /// column counts as numeric.
    pub fn derive(table: &RawTable) -> Self {
        let mut numeric_cols = Vec::new();
        let mut cat_cols = Vec::new();
        for (idx, name) in table.headers().iter().enumerate() {
            let numeric = table
                .column(idx)
                .all(|value| matches!(value, RawValue::Number(_) | RawValue::Missing));
            if numeric {
                numeric_cols.push(name.clone());
            } else {
                cat_cols.push(name.clone());
            }
        }
        Self::new(numeric_cols, cat_cols)
    }

    /// Input columns in pipeline order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.numeric_cols
            .iter()
            .chain(self.cat_cols.iter())
            .map(String::as_str)
    }

    pub fn column_count(&self) -> usize {
        self.numeric_cols.len() + self.cat_cols.len()
    }

    pub fn with_feature_names(mut self, feature_names: Vec<String>) -> Self {
        self.feature_names = feature_names;
        self
    }

    /// Reject duplicate or overlapping column names.
    pub fn validate(&self) -> Result<(), DatasetError> {
        let columns: Vec<&str> = self.columns().collect();
        for (idx, name) in columns.iter().enumerate() {
            if columns[..idx].contains(name) {
                return Err(DatasetError::InvalidSchema(format!(
                    "column {name} listed more than once"
                )));
            }
        }
        Ok(())
    }

    pub fn load_json(path: &Path) -> Result<Self, DatasetError> {
        let bytes = std::fs::read(path).map_err(|source| DatasetError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let schema: Self = serde_json::from_slice(&bytes).map_err(|source| DatasetError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        schema.validate()?;
        Ok(schema)
    }

    pub fn save_json(&self, path: &Path) -> Result<(), DatasetError> {
        let bytes = serde_json::to_vec_pretty(self).map_err(|source| DatasetError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        std::fs::write(path, bytes).map_err(|source| DatasetError::Write {
            path: path.to_path_buf(),
            source,
        })
    }
}
