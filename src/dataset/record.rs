//! Single-row records and the request-to-row mapping used at serving time.

use serde_json::{Map, Value};

use super::schema::FeatureSchema;
use super::value::{RawValue, UnsupportedValue};

/// Anything that can look up a cell by column name.
///
/// `None` means the column does not exist at all, which is different from a
/// present-but-missing cell.
pub trait Fields {
    fn field(&self, column: &str) -> Option<&RawValue>;
}

/// Owned single-row record with a fixed column order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRecord {
    columns: Vec<String>,
    values: Vec<RawValue>,
}

impl RawRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a column, replacing the value if it already exists.
    pub fn insert(&mut self, column: impl Into<String>, value: RawValue) {
        let column = column.into();
        match self.columns.iter().position(|existing| *existing == column) {
            Some(idx) => self.values[idx] = value,
            None => {
                self.columns.push(column);
                self.values.push(value);
            }
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RawValue)> {
        self.columns
            .iter()
            .map(String::as_str)
            .zip(self.values.iter())
    }

    /// Build the row for a prediction request.
    ///
    /// With a schema, the record holds exactly the schema columns in
    /// numeric-then-categorical order and absent keys become missing. Without
    /// one, the JSON object is used verbatim.
    pub fn from_json(
        body: &Map<String, Value>,
        schema: Option<&FeatureSchema>,
    ) -> Result<Self, UnsupportedValue> {
        let mut record = Self::new();
        match schema {
            Some(schema) => {
                for column in schema.columns() {
                    let value = match body.get(column) {
                        Some(value) => RawValue::from_json(column, value)?,
                        None => RawValue::Missing,
                    };
                    record.insert(column, value);
                }
            }
            None => {
                for (column, value) in body {
                    record.insert(column.as_str(), RawValue::from_json(column, value)?);
                }
            }
        }
        Ok(record)
    }
}

impl Fields for RawRecord {
    fn field(&self, column: &str) -> Option<&RawValue> {
        let idx = self.columns.iter().position(|existing| existing == column)?;
        Some(&self.values[idx])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema() -> FeatureSchema {
        FeatureSchema::new(
            vec!["tenure".into(), "MonthlyCharges".into()],
            vec!["gender".into(), "Contract".into()],
        )
    }

    fn object(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn schema_order_wins_over_key_order() {
        let schema = schema();
        let a = object(json!({"Contract": "One year", "tenure": 5, "gender": "Male"}));
        let b = object(json!({"gender": "Male", "tenure": 5, "Contract": "One year"}));
        let ra = RawRecord::from_json(&a, Some(&schema)).unwrap();
        let rb = RawRecord::from_json(&b, Some(&schema)).unwrap();
        assert_eq!(ra, rb);
        assert_eq!(ra.columns(), ["tenure", "MonthlyCharges", "gender", "Contract"]);
    }

    #[test]
    fn absent_and_extra_keys_with_schema() {
        let schema = schema();
        let body = object(json!({"_model": "tree", "unknown": 1, "tenure": 3}));
        let record = RawRecord::from_json(&body, Some(&schema)).unwrap();
        assert_eq!(record.len(), 4);
        assert_eq!(record.field("MonthlyCharges"), Some(&RawValue::Missing));
        assert_eq!(record.field("tenure"), Some(&RawValue::Number(3.0)));
        assert_eq!(record.field("_model"), None);
    }

    #[test]
    fn verbatim_without_schema() {
        let body = object(json!({"tenure": 3, "gender": "Female"}));
        let record = RawRecord::from_json(&body, None).unwrap();
        assert_eq!(record.len(), 2);
        assert_eq!(record.field("gender"), Some(&RawValue::Text("Female".into())));
        assert_eq!(record.field("Contract"), None);
    }

    #[test]
    fn nested_values_are_rejected() {
        let body = object(json!({"tenure": {"months": 3}}));
        let err = RawRecord::from_json(&body, Some(&schema())).unwrap_err();
        assert_eq!(err.column, "tenure");
    }

    #[test]
    fn insert_replaces_existing_column() {
        let mut record = RawRecord::new();
        record.insert("a", RawValue::Number(1.0));
        record.insert("a", RawValue::Number(2.0));
        assert_eq!(record.len(), 1);
        assert_eq!(record.iter().next(), Some(("a", &RawValue::Number(2.0))));
    }
}
