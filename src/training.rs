//! Offline training run: CSV in, pipelines, schema, and evaluation artifacts out.

use std::path::PathBuf;

use thiserror::Error;
use tracing::info;

use crate::artifacts::{
    self, ArtifactError, DECISION_TREE_PNG_FILE, DECISION_TREE_TXT_FILE, MODEL_SUMMARY_FILE,
    ROC_CURVES_FILE, SummaryRow, TOP_FEATURES_FILE, TOP_FEATURES_LIMIT,
};
use crate::config::Settings;
use crate::dataset::clean::{CleaningReport, clean, extract_target};
use crate::dataset::{
    DatasetError, FeatureSchema, RawTable, SCHEMA_FILE_NAME, TableRow, stratified_split,
};
use crate::ml::logistic::train_logistic;
use crate::ml::metrics::{ConfusionMatrix, RocCurve, accuracy, binary_f1, roc_curve};
use crate::ml::tree::train_tree;
use crate::ml::{
    Classifier, ModelError, ModelKind, Pipeline, PredictError, Prediction, Preprocessor, TrainSet,
};

/// Features echoed to the log after training.
const LOGGED_TOP_FEATURES: usize = 5;

/// Errors that abort a training run.
#[derive(Debug, Error)]
pub enum TrainError {
    #[error(transparent)]
    Dataset(#[from] DatasetError),
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error(transparent)]
    Predict(#[from] PredictError),
    #[error(transparent)]
    Artifact(#[from] ArtifactError),
}

/// Test-split metrics for one pipeline.
#[derive(Debug, Clone)]
pub struct ModelEvaluation {
    pub kind: ModelKind,
    pub accuracy: f32,
    pub f1: f32,
    pub auc: f32,
    pub confusion: ConfusionMatrix,
    pub roc: RocCurve,
}

impl ModelEvaluation {
    fn summary_row(&self) -> SummaryRow {
        SummaryRow {
            model: self.kind.display_name().to_string(),
            accuracy: self.accuracy,
            f1: self.f1,
            auc: self.auc,
        }
    }
}

/// Outcome of [`run_training`].
#[derive(Debug, Clone)]
pub struct TrainingReport {
    pub rows: usize,
    pub cleaning: CleaningReport,
    pub schema: FeatureSchema,
    pub train_rows: usize,
    pub test_rows: usize,
    pub evaluations: Vec<ModelEvaluation>,
    pub top_features: Vec<(String, f32)>,
    pub models_dir: PathBuf,
    pub artifacts_dir: PathBuf,
}

/// Train, persist, and evaluate both pipelines.
pub fn run_training(settings: &Settings) -> Result<TrainingReport, TrainError> {
    let paths = &settings.paths;
    let mut table = RawTable::load_csv(&paths.dataset)?;
    let (rows, columns) = table.shape();
    info!(path = %paths.dataset.display(), rows, columns, "Loaded dataset");

    let cleaning = clean(&mut table);
    info!(
        dropped_id = cleaning.dropped_id,
        coerced_missing = cleaning.coerced_missing,
        imputed_from_product = cleaning.imputed_from_product,
        imputed_from_median = cleaning.imputed_from_median,
        "Cleaned dataset"
    );
    let labels = extract_target(&mut table)?;
    let schema = FeatureSchema::derive(&table);
    info!(
        numeric = schema.numeric_cols.len(),
        categorical = schema.cat_cols.len(),
        "Derived feature schema"
    );

    let split = stratified_split(
        &labels,
        settings.training.test_fraction,
        settings.training.seed,
    )?;
    info!(
        train = split.train.len(),
        test = split.test.len(),
        "Stratified split"
    );
    let train_rows: Vec<TableRow<'_>> = split.train.iter().map(|&i| table.row(i)).collect();
    let test_rows: Vec<TableRow<'_>> = split.test.iter().map(|&i| table.row(i)).collect();

    let preprocessor = Preprocessor::fit(&schema, &train_rows)?;
    let train_set = TrainSet {
        x: preprocessor.transform_all(&train_rows)?,
        y: select(&labels, &split.train),
    };
    let test_x = preprocessor.transform_all(&test_rows)?;
    let test_y = select(&labels, &split.test);
    info!(features = preprocessor.feature_len(), "Fitted preprocessor");

    let logistic = train_logistic(&train_set, &settings.training.logistic)?;
    let tree = train_tree(&train_set, &settings.training.tree)?;
    info!(
        depth = tree.depth(),
        leaves = tree.leaf_count(),
        "Trained decision tree"
    );
    let importances = tree.importances.clone();
    let pipelines = [
        Pipeline::new(preprocessor.clone(), Classifier::Logistic(logistic))?,
        Pipeline::new(preprocessor.clone(), Classifier::Tree(tree))?,
    ];

    artifacts::ensure_dir(&paths.models_dir)?;
    artifacts::ensure_dir(&paths.artifacts_dir)?;
    for pipeline in &pipelines {
        let path = paths.models_dir.join(pipeline.kind().file_name());
        pipeline.save_json(&path)?;
        info!(model = %pipeline.kind(), path = %path.display(), "Saved pipeline");
    }
    let persisted_schema = preprocessor.schema();
    persisted_schema.save_json(&paths.models_dir.join(SCHEMA_FILE_NAME))?;

    let mut evaluations = Vec::with_capacity(pipelines.len());
    for pipeline in &pipelines {
        let evaluation = evaluate(pipeline, &test_x, &test_y)?;
        info!(
            model = evaluation.kind.display_name(),
            accuracy = evaluation.accuracy,
            f1 = evaluation.f1,
            auc = evaluation.auc,
            "Evaluated on test split"
        );
        evaluations.push(evaluation);
    }

    let feature_names = preprocessor.feature_names();
    let top_features = artifacts::top_features(&importances, &feature_names, TOP_FEATURES_LIMIT);
    for (rank, (name, value)) in top_features.iter().take(LOGGED_TOP_FEATURES).enumerate() {
        info!(rank = rank + 1, feature = %name, importance = value, "Top tree feature");
    }

    write_artifacts(settings, &pipelines, &evaluations, &top_features, &feature_names)?;

    Ok(TrainingReport {
        rows,
        cleaning,
        schema: persisted_schema,
        train_rows: split.train.len(),
        test_rows: split.test.len(),
        evaluations,
        top_features,
        models_dir: paths.models_dir.clone(),
        artifacts_dir: paths.artifacts_dir.clone(),
    })
}

/// Score the test split and derive all metrics for one pipeline.
pub fn evaluate(
    pipeline: &Pipeline,
    features: &[Vec<f32>],
    labels: &[u8],
) -> Result<ModelEvaluation, PredictError> {
    let mut scores = Vec::with_capacity(features.len());
    let mut predicted = Vec::with_capacity(features.len());
    for row in features {
        let prediction = Prediction::from_probability(pipeline.predict_features(row)?)?;
        scores.push(prediction.probability as f32);
        predicted.push(prediction.prediction);
    }
    let confusion = ConfusionMatrix::from_binary(labels, &predicted);
    let roc = roc_curve(labels, &scores);
    Ok(ModelEvaluation {
        kind: pipeline.kind(),
        accuracy: accuracy(&confusion),
        f1: binary_f1(&confusion),
        auc: roc.auc(),
        confusion,
        roc,
    })
}

fn write_artifacts(
    settings: &Settings,
    pipelines: &[Pipeline],
    evaluations: &[ModelEvaluation],
    top_features: &[(String, f32)],
    feature_names: &[String],
) -> Result<(), ArtifactError> {
    let dir = &settings.paths.artifacts_dir;
    let curves: Vec<(&str, &RocCurve)> = evaluations
        .iter()
        .map(|eval| (eval.kind.display_name(), &eval.roc))
        .collect();
    artifacts::write_roc_plot(&dir.join(ROC_CURVES_FILE), &curves)?;

    for pipeline in pipelines {
        if let Classifier::Tree(tree) = &pipeline.classifier {
            artifacts::write_tree_plot(&dir.join(DECISION_TREE_PNG_FILE), tree)?;
            artifacts::write_tree_text(&dir.join(DECISION_TREE_TXT_FILE), tree, feature_names)?;
        }
    }
    artifacts::write_top_features(&dir.join(TOP_FEATURES_FILE), top_features)?;
    let rows: Vec<SummaryRow> = evaluations.iter().map(ModelEvaluation::summary_row).collect();
    artifacts::write_summary_csv(&dir.join(MODEL_SUMMARY_FILE), &rows)?;
    info!(dir = %dir.display(), "Wrote evaluation artifacts");
    Ok(())
}

fn select(labels: &[u8], indices: &[usize]) -> Vec<u8> {
    indices.iter().map(|&i| labels[i]).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::logistic::LogisticModel;
    use crate::ml::preprocess::NumericColumn;

    fn one_feature_pipeline(weight: f32) -> Pipeline {
        Pipeline::new(
            Preprocessor {
                numeric: vec![NumericColumn {
                    name: "tenure".into(),
                    mean: 0.0,
                    scale: 1.0,
                }],
                categorical: Vec::new(),
            },
            Classifier::Logistic(LogisticModel {
                feature_len: 1,
                weights: vec![weight],
                bias: 0.0,
            }),
        )
        .unwrap()
    }

    #[test]
    fn evaluate_scores_perfect_separation() {
        let x = vec![vec![-2.0], vec![-1.0], vec![1.0], vec![2.0]];
        let y = vec![0, 0, 1, 1];
        let eval = evaluate(&one_feature_pipeline(3.0), &x, &y).unwrap();
        assert_eq!(eval.kind, ModelKind::Logistic);
        assert_eq!(eval.accuracy, 1.0);
        assert_eq!(eval.f1, 1.0);
        assert_eq!(eval.auc, 1.0);
        assert_eq!(eval.confusion.get(1, 1), 2);
    }

    #[test]
    fn evaluate_rejects_wrong_width() {
        let err = evaluate(&one_feature_pipeline(1.0), &[vec![0.0, 1.0]], &[0]).unwrap_err();
        assert!(matches!(err, PredictError::FeatureLength { .. }));
    }

    #[test]
    fn select_picks_indices() {
        assert_eq!(select(&[0, 1, 1, 0], &[1, 3]), vec![1, 0]);
    }
}
