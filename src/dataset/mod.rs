//! Workplace profile datasets: generation, CSV export and loading.

pub mod loader;
pub mod record;
pub mod synth;
mod writer;

use std::path::{Path, PathBuf};

use thiserror::Error;

pub use loader::{Frame, load_dataset};
pub use record::{FieldValue, Level, OsPreference, RawRecord, Record, Role};
pub use synth::{SampleSynthesizer, generate, heuristic_label, heuristic_score};
pub use writer::{write_dataset, write_records};

/// Errors raised while reading or writing dataset files.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    /// The header lacks required columns; nothing has been read past it.
    #[error("dataset{} is missing required columns: {}", display_path(.path), .missing.join(", "))]
    MissingColumns {
        path: Option<PathBuf>,
        missing: Vec<String>,
    },
    #[error("line {line}: invalid value {value:?} for column {column}")]
    InvalidValue {
        line: usize,
        column: String,
        value: String,
    },
    #[error("line {line}: expected {expected} cells, found {found}")]
    RowWidth {
        line: usize,
        expected: usize,
        found: usize,
    },
    #[error("dataset contains no rows")]
    Empty,
}

impl DatasetError {
    pub(crate) fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        DatasetError::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub(crate) fn invalid(line: usize, column: &str, value: &str) -> Self {
        DatasetError::InvalidValue {
            line,
            column: column.to_string(),
            value: value.to_string(),
        }
    }

    /// Attach the file path to errors produced while parsing a stream.
    pub(crate) fn with_path(self, file: &Path) -> Self {
        match self {
            DatasetError::Io { source, .. } => DatasetError::io(file, source),
            DatasetError::MissingColumns { missing, .. } => DatasetError::MissingColumns {
                path: Some(file.to_path_buf()),
                missing,
            },
            other => other,
        }
    }
}

fn display_path(path: &Option<PathBuf>) -> String {
    path.as_ref()
        .map(|path| format!(" {}", path.display()))
        .unwrap_or_default()
}
