//! Raw cell values shared by CSV ingest and JSON prediction requests.

use std::fmt;

use serde_json::Value;
use thiserror::Error;

/// A single untyped cell: numeric, text, or missing.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Number(f64),
    Text(String),
    Missing,
}

/// A JSON value that has no tabular representation.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("Field {column} has unsupported JSON type {kind}")]
pub struct UnsupportedValue {
    pub column: String,
    pub kind: &'static str,
}

/// Cell spellings read as missing, matching the usual CSV NA markers.
const NA_TOKENS: &[&str] = &[
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

impl RawValue {
    /// Interpret a CSV cell. Blank cells and NA markers are missing; anything
    /// that parses as a finite float is numeric.
    pub fn parse_cell(cell: &str) -> Self {
        let trimmed = cell.trim();
        if trimmed.is_empty() || NA_TOKENS.contains(&trimmed) {
            return Self::Missing;
        }
        match trimmed.parse::<f64>() {
            Ok(value) if value.is_finite() => Self::Number(value),
            _ => Self::Text(cell.to_string()),
        }
    }

    /// Map a request field onto a cell. Booleans become 1/0; arrays and
    /// objects are rejected.
    pub fn from_json(column: &str, value: &Value) -> Result<Self, UnsupportedValue> {
        match value {
            Value::Null => Ok(Self::Missing),
            Value::Bool(flag) => Ok(Self::Number(if *flag { 1.0 } else { 0.0 })),
            Value::Number(number) => Ok(number
                .as_f64()
                .filter(|value| value.is_finite())
                .map(Self::Number)
                .unwrap_or(Self::Missing)),
            Value::String(text) => Ok(Self::Text(text.clone())),
            Value::Array(_) => Err(UnsupportedValue {
                column: column.to_string(),
                kind: "array",
            }),
            Value::Object(_) => Err(UnsupportedValue {
                column: column.to_string(),
                kind: "object",
            }),
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }

    /// Numeric view of the value; text is parsed leniently.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(value) => Some(*value),
            Self::Text(text) => text.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
            Self::Missing => None,
        }
    }

    /// Category key used by one-hot encoding. Integral numbers render without
    /// a fractional part so `1` and `1.0` share a category.
    pub fn category_key(&self) -> Option<String> {
        match self {
            Self::Text(text) => Some(text.clone()),
            Self::Number(value) => Some(format_number(*value)),
            Self::Missing => None,
        }
    }
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(value) => f.write_str(&format_number(*value)),
            Self::Text(text) => f.write_str(text),
            Self::Missing => Ok(()),
        }
    }
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}
