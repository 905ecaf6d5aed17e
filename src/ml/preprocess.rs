//! Shared preprocessing: standardized numeric columns followed by one-hot
//! encoded categorical columns.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::error::{ModelError, PredictError};
use crate::dataset::{FeatureSchema, Fields, RawValue};

/// Encoded features stay finite `f32` even for extreme inputs.
const F32_LIMIT: f64 = f32::MAX as f64;

/// Fitted scaling for one numeric column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericColumn {
    pub name: String,
    pub mean: f64,
    /// Population standard deviation, or `1.0` for constant columns.
    pub scale: f64,
}

/// Fitted category list for one categorical column, sorted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoricalColumn {
    pub name: String,
    pub categories: Vec<String>,
}

/// Column transformer fitted on the training split.
///
/// Missing numeric cells are imputed with the training mean (zero after
/// scaling). Missing or unseen categories encode as an all-zero block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preprocessor {
    pub numeric: Vec<NumericColumn>,
    pub categorical: Vec<CategoricalColumn>,
}

impl Preprocessor {
    /// Fit scaling and category lists over the given rows.
    pub fn fit<R: Fields>(schema: &FeatureSchema, rows: &[R]) -> Result<Self, ModelError> {
        if rows.is_empty() {
            return Err(ModelError::EmptyTrainingSet);
        }
        let mut numeric = Vec::with_capacity(schema.numeric_cols.len());
        for name in &schema.numeric_cols {
            let mut values = Vec::with_capacity(rows.len());
            for row in rows {
                let cell = lookup(row, name)?;
                if let Some(value) = numeric_value(name, cell)? {
                    values.push(value);
                }
            }
            let (mean, scale) = mean_and_scale(&values);
            numeric.push(NumericColumn {
                name: name.clone(),
                mean,
                scale,
            });
        }

        let mut categorical = Vec::with_capacity(schema.cat_cols.len());
        for name in &schema.cat_cols {
            let mut seen = BTreeSet::new();
            for row in rows {
                if let Some(key) = lookup(row, name)?.category_key() {
                    seen.insert(key);
                }
            }
            categorical.push(CategoricalColumn {
                name: name.clone(),
                categories: seen.into_iter().collect(),
            });
        }
        Ok(Self {
            numeric,
            categorical,
        })
    }

    /// Input schema this transformer consumes, with encoded feature names.
    pub fn schema(&self) -> FeatureSchema {
        FeatureSchema::new(
            self.numeric.iter().map(|col| col.name.clone()).collect(),
            self.categorical.iter().map(|col| col.name.clone()).collect(),
        )
        .with_feature_names(self.feature_names())
    }

    /// Numeric names, then `{column}_{category}` for every category.
    pub fn feature_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.numeric.iter().map(|col| col.name.clone()).collect();
        for col in &self.categorical {
            for category in &col.categories {
                names.push(format!("{}_{}", col.name, category));
            }
        }
        names
    }

    pub fn feature_len(&self) -> usize {
        self.numeric.len()
            + self
                .categorical
                .iter()
                .map(|col| col.categories.len())
                .sum::<usize>()
    }

    /// Encode one record. Every schema column must exist in the record,
    /// though its cell may be missing.
    pub fn transform<R: Fields + ?Sized>(&self, row: &R) -> Result<Vec<f32>, PredictError> {
        let mut out = Vec::with_capacity(self.feature_len());
        for col in &self.numeric {
            let value = numeric_value(&col.name, lookup(row, &col.name)?)?;
            let scaled = match value {
                Some(value) => (value - col.mean) / col.scale,
                None => 0.0,
            };
            out.push(scaled.clamp(-F32_LIMIT, F32_LIMIT) as f32);
        }
        for col in &self.categorical {
            let key = lookup(row, &col.name)?.category_key();
            let hit = key
                .as_deref()
                .and_then(|key| col.categories.binary_search_by(|c| c.as_str().cmp(key)).ok());
            for idx in 0..col.categories.len() {
                out.push(if Some(idx) == hit { 1.0 } else { 0.0 });
            }
        }
        Ok(out)
    }

    /// Encode many rows.
    pub fn transform_all<R: Fields>(&self, rows: &[R]) -> Result<Vec<Vec<f32>>, PredictError> {
        rows.iter().map(|row| self.transform(row)).collect()
    }

    pub fn validate(&self) -> Result<(), String> {
        for col in &self.numeric {
            if !col.mean.is_finite() || !col.scale.is_finite() || col.scale <= 0.0 {
                return Err(format!("invalid scaling for column {}", col.name));
            }
        }
        for col in &self.categorical {
            if col.categories.windows(2).any(|pair| pair[0] >= pair[1]) {
                return Err(format!("categories for column {} are not sorted", col.name));
            }
        }
        self.schema()
            .validate()
            .map_err(|err| err.to_string())
    }
}

fn lookup<'a, R: Fields + ?Sized>(row: &'a R, column: &str) -> Result<&'a RawValue, PredictError> {
    row.field(column).ok_or_else(|| PredictError::MissingColumn {
        column: column.to_string(),
    })
}

fn numeric_value(column: &str, cell: &RawValue) -> Result<Option<f64>, PredictError> {
    match cell {
        RawValue::Missing => Ok(None),
        RawValue::Number(value) => Ok(Some(*value)),
        RawValue::Text(text) if text.trim().is_empty() => Ok(None),
        RawValue::Text(text) => cell.as_number().map(Some).ok_or_else(|| PredictError::NotNumeric {
            column: column.to_string(),
            value: text.clone(),
        }),
    }
}

fn mean_and_scale(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 1.0);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    let std = variance.sqrt();
    let scale = if std > f64::EPSILON * mean.abs().max(1.0) {
        std
    } else {
        1.0
    };
    (mean, scale)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{RawRecord, RawTable};

    fn fitted() -> Preprocessor {
        let table = RawTable::parse_csv(
            "tenure,MonthlyCharges,Contract,gender\n1,10,Month-to-month,Male\n3,30,Two year,Female\n5,50,Month-to-month,Male\n",
        )
        .unwrap();
        let schema = FeatureSchema::derive(&table);
        let rows: Vec<_> = (0..table.len()).map(|i| table.row(i)).collect();
        Preprocessor::fit(&schema, &rows).unwrap()
    }

    fn record(pairs: &[(&str, RawValue)]) -> RawRecord {
        let mut record = RawRecord::new();
        for (name, value) in pairs {
            record.insert(*name, value.clone());
        }
        record
    }

    #[test]
    fn fit_computes_scaling_and_sorted_categories() {
        let pre = fitted();
        assert_eq!(pre.numeric[0].mean, 3.0);
        assert!((pre.numeric[0].scale - (8.0f64 / 3.0).sqrt()).abs() < 1e-12);
        assert_eq!(pre.categorical[0].categories, ["Month-to-month", "Two year"]);
        assert_eq!(
            pre.feature_names(),
            [
                "tenure",
                "MonthlyCharges",
                "Contract_Month-to-month",
                "Contract_Two year",
                "gender_Female",
                "gender_Male"
            ]
        );
        assert_eq!(pre.feature_len(), 6);
        pre.validate().unwrap();
    }

    #[test]
    fn transform_scales_and_one_hot_encodes() {
        let pre = fitted();
        let row = record(&[
            ("gender", RawValue::Text("Female".into())),
            ("Contract", RawValue::Text("Two year".into())),
            ("MonthlyCharges", RawValue::Number(30.0)),
            ("tenure", RawValue::Number(3.0)),
        ]);
        assert_eq!(pre.transform(&row).unwrap(), vec![0.0, 0.0, 0.0, 1.0, 1.0, 0.0]);
    }

    #[test]
    fn missing_and_unknown_values_encode_as_zero() {
        let pre = fitted();
        let row = record(&[
            ("tenure", RawValue::Missing),
            ("MonthlyCharges", RawValue::Text("30".into())),
            ("Contract", RawValue::Text("Lifetime".into())),
            ("gender", RawValue::Missing),
        ]);
        assert_eq!(pre.transform(&row).unwrap(), vec![0.0; 6]);
    }

    #[test]
    fn huge_numbers_clamp_to_finite_features() {
        let pre = fitted();
        let row = record(&[
            ("tenure", RawValue::Number(1e300)),
            ("MonthlyCharges", RawValue::Number(-1e300)),
            ("Contract", RawValue::Missing),
            ("gender", RawValue::Missing),
        ]);
        let features = pre.transform(&row).unwrap();
        assert_eq!(features[0], f32::MAX);
        assert_eq!(features[1], -f32::MAX);
        assert!(features.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn transform_errors() {
        let pre = fitted();
        let partial = record(&[("tenure", RawValue::Number(1.0))]);
        assert_eq!(
            pre.transform(&partial).unwrap_err(),
            PredictError::MissingColumn {
                column: "MonthlyCharges".into()
            }
        );
        let bad = record(&[
            ("tenure", RawValue::Text("twelve".into())),
            ("MonthlyCharges", RawValue::Number(1.0)),
            ("Contract", RawValue::Missing),
            ("gender", RawValue::Missing),
        ]);
        assert!(matches!(
            pre.transform(&bad).unwrap_err(),
            PredictError::NotNumeric { .. }
        ));
    }

    #[test]
    fn constant_column_keeps_unit_scale() {
        assert_eq!(mean_and_scale(&[2.0, 2.0, 2.0]), (2.0, 1.0));
        assert_eq!(mean_and_scale(&[]), (0.0, 1.0));
    }
}
