//! Settings shared by the command-line tools.
//!
//! Settings come from a TOML file; every key is optional and falls back to
//! the defaults below. Command-line flags override whatever is loaded here.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::app_dirs;
use crate::ml::{ExplainOptions, TrainOptions};

/// Default filename looked up in the application directory.
pub const CONFIG_FILE_NAME: &str = "macadvisor.toml";

/// Errors that may occur while loading settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read a config file.
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
    /// No usable config directory found.
    #[error("No suitable config directory found")]
    NoConfigDir,
    /// Failed to create the config directory.
    #[error("Unable to create config directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Config keys (TOML): `dataset_path`, `model_path`, `generate`, `training`,
/// `explain`, `logging`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub dataset_path: PathBuf,
    pub model_path: PathBuf,
    pub generate: GenerateSettings,
    pub training: TrainingSettings,
    pub explain: ExplainSettings,
    pub logging: LoggingSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            dataset_path: PathBuf::from("mac_dataset.csv"),
            model_path: PathBuf::from("model.bin"),
            generate: GenerateSettings::default(),
            training: TrainingSettings::default(),
            explain: ExplainSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerateSettings {
    pub count: usize,
    pub seed: u64,
}

impl Default for GenerateSettings {
    fn default() -> Self {
        Self {
            count: 2000,
            seed: crate::dataset::synth::DEFAULT_SEED,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingSettings {
    pub test_fraction: f64,
    pub seed: u64,
    pub n_trees: usize,
    pub max_depth: Option<usize>,
}

impl Default for TrainingSettings {
    fn default() -> Self {
        let options = TrainOptions::default();
        Self {
            test_fraction: options.test_fraction,
            seed: options.seed,
            n_trees: options.n_trees,
            max_depth: options.max_depth,
        }
    }
}

impl From<&TrainingSettings> for TrainOptions {
    fn from(settings: &TrainingSettings) -> Self {
        TrainOptions {
            test_fraction: settings.test_fraction,
            seed: settings.seed,
            n_trees: settings.n_trees,
            max_depth: settings.max_depth,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplainSettings {
    pub sample_size: usize,
    pub repeats: usize,
    pub top_k: usize,
    pub seed: u64,
}

impl Default for ExplainSettings {
    fn default() -> Self {
        let options = ExplainOptions::default();
        Self {
            sample_size: options.sample_size,
            repeats: options.repeats,
            top_k: options.top_k,
            seed: options.seed,
        }
    }
}

impl From<&ExplainSettings> for ExplainOptions {
    fn from(settings: &ExplainSettings) -> Self {
        ExplainOptions {
            sample_size: settings.sample_size,
            repeats: settings.repeats,
            seed: settings.seed,
            top_k: settings.top_k,
        }
    }
}

/// `level` is an `EnvFilter` directive string; `RUST_LOG` takes precedence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
    /// Log files kept per tool.
    pub max_files: usize,
    /// Mirror log lines to stderr.
    pub console: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            max_files: 10,
            console: true,
        }
    }
}

/// Resolve the default settings path inside the application directory.
pub fn config_path() -> Result<PathBuf, ConfigError> {
    let dir = app_dirs::app_root_dir().map_err(|error| match error {
        app_dirs::AppDirError::NoBaseDir => ConfigError::NoConfigDir,
        app_dirs::AppDirError::CreateDir { path, source } => ConfigError::CreateDir { path, source },
    })?;
    Ok(dir.join(CONFIG_FILE_NAME))
}

/// Load `explicit` if given, else the app-directory file if present, else defaults.
pub fn load_or_default(explicit: Option<&Path>) -> Result<Settings, ConfigError> {
    if let Some(path) = explicit {
        return load_from(path);
    }
    let path = config_path()?;
    if path.is_file() {
        load_from(&path)
    } else {
        debug!("No settings file at {}; using defaults", path.display());
        Ok(Settings::default())
    }
}

/// Parse settings from a TOML file.
pub fn load_from(path: &Path) -> Result<Settings, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&text).map_err(|source| ConfigError::ParseToml {
        path: path.to_path_buf(),
        source,
    })
}
