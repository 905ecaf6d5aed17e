//! Evaluation artifacts written by the trainer.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub mod canvas;
pub mod roc;
pub mod tree_plot;

pub use roc::write_roc_plot;
pub use tree_plot::{describe_tree, write_tree_plot, write_tree_text};

pub const ROC_CURVES_FILE: &str = "roc_curves.png";
pub const DECISION_TREE_PNG_FILE: &str = "decision_tree.png";
pub const DECISION_TREE_TXT_FILE: &str = "decision_tree.txt";
pub const TOP_FEATURES_FILE: &str = "top_features.txt";
pub const MODEL_SUMMARY_FILE: &str = "model_summary.csv";

/// Number of features listed in the top-features report.
pub const TOP_FEATURES_LIMIT: usize = 10;

/// Errors raised while writing artifacts.
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("Failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to encode image {path}: {source}")]
    Image {
        path: PathBuf,
        source: image::ImageError,
    },
    #[error("Nothing to plot: {0}")]
    Empty(String),
    #[error("Invalid tree: {0}")]
    Invalid(String),
}

/// One row of the metrics summary.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryRow {
    pub model: String,
    pub accuracy: f32,
    pub f1: f32,
    pub auc: f32,
}

/// Create `dir` and its parents.
pub fn ensure_dir(dir: &Path) -> Result<(), ArtifactError> {
    std::fs::create_dir_all(dir).map_err(|source| ArtifactError::CreateDir {
        path: dir.to_path_buf(),
        source,
    })
}

pub(crate) fn write_text(path: &Path, text: &str) -> Result<(), ArtifactError> {
    std::fs::write(path, text).map_err(|source| ArtifactError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// `model,accuracy,f1,auc` with one row per model.
pub fn format_summary_csv(rows: &[SummaryRow]) -> String {
    let mut out = String::from("model,accuracy,f1,auc\n");
    for row in rows {
        let _ = writeln!(
            out,
            "{},{:.6},{:.6},{:.6}",
            row.model, row.accuracy, row.f1, row.auc
        );
    }
    out
}

pub fn write_summary_csv(path: &Path, rows: &[SummaryRow]) -> Result<(), ArtifactError> {
    write_text(path, &format_summary_csv(rows))
}

/// Highest `limit` importances as `(feature name, importance)`.
///
/// Ties keep feature order. Zero importances are included when fewer than
/// `limit` features were used by the tree.
pub fn top_features(
    importances: &[f32],
    feature_names: &[String],
    limit: usize,
) -> Vec<(String, f32)> {
    let mut order: Vec<usize> = (0..importances.len()).collect();
    order.sort_by(|&a, &b| importances[b].total_cmp(&importances[a]).then(a.cmp(&b)));
    order
        .into_iter()
        .take(limit)
        .map(|idx| {
            let name = feature_names
                .get(idx)
                .cloned()
                .unwrap_or_else(|| format!("feature_{idx}"));
            (name, importances[idx])
        })
        .collect()
}

/// One `name\tvalue` line per feature.
pub fn write_top_features(path: &Path, features: &[(String, f32)]) -> Result<(), ArtifactError> {
    let mut out = String::new();
    for (name, value) in features {
        let _ = writeln!(out, "{name}\t{value}");
    }
    write_text(path, &out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn summary_csv_has_header_and_rows() {
        let rows = vec![
            SummaryRow {
                model: "LogisticRegression".into(),
                accuracy: 0.8,
                f1: 0.5,
                auc: 0.75,
            },
            SummaryRow {
                model: "DecisionTree".into(),
                accuracy: 0.7,
                f1: 0.25,
                auc: 0.5,
            },
        ];
        let text = format_summary_csv(&rows);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "model,accuracy,f1,auc");
        assert!(lines[1].starts_with("LogisticRegression,0.8"));
        assert_eq!(lines[2], "DecisionTree,0.700000,0.250000,0.500000");
    }

    #[test]
    fn top_features_sorted_and_limited() {
        let names: Vec<String> = ["a", "b", "c", "d"].iter().map(|s| s.to_string()).collect();
        let top = top_features(&[0.1, 0.5, 0.0, 0.4], &names, 3);
        assert_eq!(
            top,
            vec![("b".to_string(), 0.5), ("d".to_string(), 0.4), ("a".to_string(), 0.1)]
        );
        let padded = top_features(&[0.0, 1.0], &names[..2], 10);
        assert_eq!(padded.len(), 2);
        assert_eq!(padded[1].0, "a");
    }

    #[test]
    fn top_features_file_is_tab_separated() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(TOP_FEATURES_FILE);
        write_top_features(&path, &[("tenure".into(), 0.5), ("Contract_Two year".into(), 0.25)])
            .unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "tenure\t0.5\nContract_Two year\t0.25\n");
    }

    #[test]
    fn ensure_dir_creates_nested() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        ensure_dir(&nested).unwrap();
        assert!(nested.is_dir());
    }
}
