//! Preprocessor + classifier, fitted together and persisted as one JSON file.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::error::{ModelError, PredictError};
use super::logistic::LogisticModel;
use super::preprocess::Preprocessor;
use super::tree::DecisionTree;
use crate::dataset::Fields;

/// Current on-disk pipeline format.
pub const PIPELINE_FORMAT_VERSION: i64 = 1;

/// The two served model families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    Logistic,
    Tree,
}

impl ModelKind {
    pub const ALL: [ModelKind; 2] = [ModelKind::Logistic, ModelKind::Tree];

    /// Parse the `_model` request selector.
    pub fn from_selector(value: &str) -> Option<Self> {
        match value {
            "logistic" => Some(Self::Logistic),
            "tree" => Some(Self::Tree),
            _ => None,
        }
    }

    pub fn selector(self) -> &'static str {
        match self {
            Self::Logistic => "logistic",
            Self::Tree => "tree",
        }
    }

    /// Name used in reports and the metrics summary.
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Logistic => "LogisticRegression",
            Self::Tree => "DecisionTree",
        }
    }

    pub fn file_name(self) -> &'static str {
        match self {
            Self::Logistic => "logistic_pipeline.json",
            Self::Tree => "tree_pipeline.json",
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.selector())
    }
}

/// Fitted classifier behind the shared preprocessor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Classifier {
    Logistic(LogisticModel),
    Tree(DecisionTree),
}

impl Classifier {
    pub fn kind(&self) -> ModelKind {
        match self {
            Self::Logistic(_) => ModelKind::Logistic,
            Self::Tree(_) => ModelKind::Tree,
        }
    }

    pub fn feature_len(&self) -> usize {
        match self {
            Self::Logistic(model) => model.feature_len,
            Self::Tree(tree) => tree.feature_len,
        }
    }

    pub fn predict_proba(&self, features: &[f32]) -> f32 {
        match self {
            Self::Logistic(model) => model.predict_proba(features),
            Self::Tree(tree) => tree.predict_proba(features),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        match self {
            Self::Logistic(model) => model.validate(),
            Self::Tree(tree) => tree.validate(),
        }
    }
}

/// Versioned, immutable pipeline loaded read-only by the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pipeline {
    pub format_version: i64,
    pub preprocessor: Preprocessor,
    pub classifier: Classifier,
}

impl Pipeline {
    pub fn new(preprocessor: Preprocessor, classifier: Classifier) -> Result<Self, ModelError> {
        let pipeline = Self {
            format_version: PIPELINE_FORMAT_VERSION,
            preprocessor,
            classifier,
        };
        pipeline.validate().map_err(ModelError::Invalid)?;
        Ok(pipeline)
    }

    pub fn kind(&self) -> ModelKind {
        self.classifier.kind()
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.format_version != PIPELINE_FORMAT_VERSION {
            return Err(format!(
                "Unsupported format_version {} (expected {})",
                self.format_version, PIPELINE_FORMAT_VERSION
            ));
        }
        self.preprocessor.validate()?;
        self.classifier.validate()?;
        let expected = self.preprocessor.feature_len();
        if self.classifier.feature_len() != expected {
            return Err(format!(
                "classifier expects {} features but preprocessor yields {}",
                self.classifier.feature_len(),
                expected
            ));
        }
        Ok(())
    }

    /// Churn probability for one record.
    pub fn predict_proba<R: Fields + ?Sized>(&self, record: &R) -> Result<f64, PredictError> {
        let features = self.preprocessor.transform(record)?;
        self.predict_features(&features)
    }

    /// Churn probability for an already encoded feature vector.
    pub fn predict_features(&self, features: &[f32]) -> Result<f64, PredictError> {
        let expected = self.classifier.feature_len();
        if features.len() != expected {
            return Err(PredictError::FeatureLength {
                expected,
                found: features.len(),
            });
        }
        let probability = f64::from(self.classifier.predict_proba(features));
        if !probability.is_finite() {
            return Err(PredictError::NonFinite);
        }
        Ok(probability)
    }

    pub fn load_json(path: &Path) -> Result<Self, ModelError> {
        let bytes = std::fs::read(path).map_err(|source| ModelError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let pipeline: Self = serde_json::from_slice(&bytes).map_err(|source| ModelError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        pipeline.validate().map_err(ModelError::Invalid)?;
        Ok(pipeline)
    }

    pub fn save_json(&self, path: &Path) -> Result<(), ModelError> {
        let bytes = serde_json::to_vec_pretty(self).map_err(|source| ModelError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        std::fs::write(path, bytes).map_err(|source| ModelError::Write {
            path: path.to_path_buf(),
            source,
        })
    }
}
