use std::path::Path;

use tracing::{info, warn};

use crate::dataset::{FeatureSchema, SCHEMA_FILE_NAME};
use crate::ml::{ModelKind, Pipeline};

/// Load state of one model, fixed for the life of the process.
#[derive(Debug, Clone)]
pub enum ModelSlot {
    Loaded(Pipeline),
    /// Why the model could not be loaded.
    Unavailable(String),
}

impl ModelSlot {
    pub fn pipeline(&self) -> Option<&Pipeline> {
        match self {
            Self::Loaded(pipeline) => Some(pipeline),
            Self::Unavailable(_) => None,
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded(_))
    }
}

/// Read-only state shared by all request handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    logistic: ModelSlot,
    tree: ModelSlot,
    schema: Option<FeatureSchema>,
}

impl AppState {
    pub fn new(logistic: ModelSlot, tree: ModelSlot, schema: Option<FeatureSchema>) -> Self {
        Self {
            logistic,
            tree,
            schema,
        }
    }

    /// Load whatever artifacts exist in `models_dir`.
    ///
    /// Missing or broken files leave the corresponding slot unavailable
    /// instead of failing startup.
    pub fn load(models_dir: &Path) -> Self {
        let logistic = load_slot(models_dir, ModelKind::Logistic);
        let tree = load_slot(models_dir, ModelKind::Tree);

        let schema_path = models_dir.join(SCHEMA_FILE_NAME);
        let schema = if schema_path.is_file() {
            match FeatureSchema::load_json(&schema_path) {
                Ok(schema) => {
                    info!(
                        path = %schema_path.display(),
                        columns = schema.column_count(),
                        "Loaded feature schema"
                    );
                    Some(schema)
                }
                Err(err) => {
                    warn!(error = %err, "Feature schema failed to load; using request keys");
                    None
                }
            }
        } else {
            warn!(path = %schema_path.display(), "Feature schema not found; using request keys");
            None
        };
        Self::new(logistic, tree, schema)
    }

    pub fn slot(&self, kind: ModelKind) -> &ModelSlot {
        match kind {
            ModelKind::Logistic => &self.logistic,
            ModelKind::Tree => &self.tree,
        }
    }

    pub fn pipeline(&self, kind: ModelKind) -> Option<&Pipeline> {
        self.slot(kind).pipeline()
    }

    pub fn schema(&self) -> Option<&FeatureSchema> {
        self.schema.as_ref()
    }
}

fn load_slot(models_dir: &Path, kind: ModelKind) -> ModelSlot {
    let path = models_dir.join(kind.file_name());
    if !path.is_file() {
        warn!(model = %kind, path = %path.display(), "Model file not found");
        return ModelSlot::Unavailable(format!("{} not found", path.display()));
    }
    match Pipeline::load_json(&path) {
        Ok(pipeline) if pipeline.kind() == kind => {
            info!(model = %kind, path = %path.display(), "Loaded model");
            ModelSlot::Loaded(pipeline)
        }
        Ok(pipeline) => {
            warn!(model = %kind, found = %pipeline.kind(), "Model file holds the wrong model kind");
            ModelSlot::Unavailable(format!("{} holds a {} model", path.display(), pipeline.kind()))
        }
        Err(err) => {
            warn!(model = %kind, error = %err, "Failed to load model");
            ModelSlot::Unavailable(err.to_string())
        }
    }
}
