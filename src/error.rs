use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TalkSenseError {
    // Datasets
    #[error("Dataset is empty: {0}")]
    EmptyDataset(String),

    #[error("Column not found: {0}")]
    MissingColumn(String),

    #[error("Length mismatch: {what} ({left} vs {right})")]
    LengthMismatch {
        what: &'static str,
        left: usize,
        right: usize,
    },

    // Training
    #[error("Need at least two distinct labels to train, found {0}")]
    SingleClass(usize),

    #[error("Dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    // Artifacts
    #[error("Vectorizer fingerprint mismatch: features {found:016x}, expected {expected:016x}")]
    FingerprintMismatch { expected: u64, found: u64 },

    #[error("Unsupported model artifact version {found} in {path:?} (supported: {supported})")]
    ArtifactVersion {
        path: PathBuf,
        found: u32,
        supported: u32,
    },

    // Configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    // Demo views
    #[error("Template error: {0}")]
    Template(String),

    // Pass-through from dependencies
    #[error("{path:?}: {source}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),

    #[error(transparent)]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    Candle(#[from] candle_core::Error),
}

pub type Result<T> = std::result::Result<T, TalkSenseError>;

impl TalkSenseError {
    pub(crate) fn file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        TalkSenseError::File {
            path: path.into(),
            source,
        }
    }
}

impl From<minijinja::Error> for TalkSenseError {
    fn from(value: minijinja::Error) -> Self {
        TalkSenseError::Template(value.to_string())
    }
}
