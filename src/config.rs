//! TOML settings for the trainer and the prediction service.
//!
//! Every field has a default matching the fixed layout of the project
//! (`data/Telco-Customer-Churn.csv`, `models/`, `artifacts/`, `0.0.0.0:5000`),
//! so a missing config file is not an error.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ml::logistic::TrainOptions as LogisticOptions;
use crate::ml::tree::TreeOptions;

/// Config file picked up from the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE_NAME: &str = "churnkit.toml";

/// Errors that may occur while loading settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the config file.
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Failed to parse TOML config.
    #[error("Invalid config at {path}: {source}")]
    ParseToml {
        path: PathBuf,
        source: toml::de::Error,
    },
    /// A value parsed but is out of range.
    #[error("Invalid config value {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

/// Top-level settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub paths: PathSettings,
    pub server: ServerSettings,
    pub training: TrainingSettings,
    pub logging: LoggingSettings,
}

/// Input and output locations, relative to the working directory unless absolute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathSettings {
    pub dataset: PathBuf,
    pub models_dir: PathBuf,
    pub artifacts_dir: PathBuf,
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            dataset: PathBuf::from("data").join("Telco-Customer-Churn.csv"),
            models_dir: PathBuf::from("models"),
            artifacts_dir: PathBuf::from("artifacts"),
        }
    }
}

/// Bind address of the prediction service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
        }
    }
}

impl ServerSettings {
    /// `host:port` string accepted by `TcpListener::bind`.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Split and model hyperparameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingSettings {
    pub test_fraction: f64,
    pub seed: u64,
    pub logistic: LogisticOptions,
    pub tree: TreeOptions,
}

impl Default for TrainingSettings {
    fn default() -> Self {
        Self {
            test_fraction: 0.3,
            seed: 42,
            logistic: LogisticOptions::default(),
            tree: TreeOptions::default(),
        }
    }
}

/// Log file placement; `None` uses `.churnkit/logs` under the config root.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub dir: Option<PathBuf>,
}

impl Settings {
    /// Load settings from an explicit path, or `./churnkit.toml` when present,
    /// or defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => Self::load_from(path),
            None => {
                let fallback = Path::new(DEFAULT_CONFIG_FILE_NAME);
                if fallback.is_file() {
                    Self::load_from(fallback)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Parse a TOML settings file. Missing sections fall back to defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let settings: Settings = toml::from_str(&text).map_err(|source| ConfigError::ParseToml {
            path: path.to_path_buf(),
            source,
        })?;
        settings.validate()?;
        Ok(settings)
    }

    /// Check ranges that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let fraction = self.training.test_fraction;
        if !(fraction > 0.0 && fraction < 1.0) {
            return Err(ConfigError::InvalidValue {
                field: "training.test_fraction",
                reason: format!("{fraction} is not in (0, 1)"),
            });
        }
        if self.training.tree.max_depth == 0 {
            return Err(ConfigError::InvalidValue {
                field: "training.tree.max_depth",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.training.logistic.learning_rate <= 0.0
            || !self.training.logistic.learning_rate.is_finite()
        {
            return Err(ConfigError::InvalidValue {
                field: "training.logistic.learning_rate",
                reason: "must be a positive number".to_string(),
            });
        }
        Ok(())
    }
}

/// Parse the `--config <file>` flag shared by both binaries.
///
/// Returns `Err` with help text for `-h`/`--help` and for unknown arguments.
pub fn parse_config_arg(args: &[String], help: &str) -> Result<Option<PathBuf>, String> {
    let mut config = None;
    let mut idx = 0usize;
    while idx < args.len() {
        match args[idx].as_str() {
            "-h" | "--help" => return Err(help.to_string()),
            "--config" => {
                idx += 1;
                let value = args
                    .get(idx)
                    .ok_or_else(|| "--config requires a value".to_string())?;
                config = Some(PathBuf::from(value));
            }
            unknown => return Err(format!("Unknown argument: {unknown}\n\n{help}")),
        }
        idx += 1;
    }
    Ok(config)
}
