//! Layered settings: built-in defaults, then an optional TOML file, then
//! whatever the CLI overrides.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::classifier::TrainConfig;
use crate::error::{Result, TalkSenseError};
use crate::models::ModernBertSize;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub paths: PathSettings,
    pub features: FeatureSettings,
    pub training: TrainingSettings,
    pub embedding: EmbeddingSettings,
    pub zero_shot: ZeroShotSettings,
    pub server: ServerSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathSettings {
    pub raw_data: PathBuf,
    pub cleaned_data: PathBuf,
    /// Directory holding feature matrices, label files and the vectorizer.
    pub processed_dir: PathBuf,
    pub model: PathBuf,
    pub report: PathBuf,
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            raw_data: PathBuf::from("data/raw/talk_sense_tweets.csv"),
            cleaned_data: PathBuf::from("data/processed/cleaned_data.csv"),
            processed_dir: PathBuf::from("data/processed"),
            model: PathBuf::from("models/sentiment_model.json"),
            report: PathBuf::from("reports/metrics_report.md"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FeatureSettings {
    pub max_features: usize,
    pub test_size: f64,
    pub seed: u64,
    pub label_column: String,
}

impl Default for FeatureSettings {
    fn default() -> Self {
        Self {
            max_features: 5000,
            test_size: 0.2,
            seed: 42,
            label_column: "sentiment".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TrainingSettings {
    pub max_iter: usize,
    pub learning_rate: f64,
    pub weight_decay: f64,
    pub batch_size: usize,
    pub tolerance: f64,
    pub seed: u64,
}

impl Default for TrainingSettings {
    fn default() -> Self {
        let defaults = TrainConfig::default();
        Self {
            max_iter: defaults.max_iter,
            learning_rate: defaults.learning_rate,
            weight_decay: defaults.weight_decay,
            batch_size: defaults.batch_size,
            tolerance: defaults.tolerance,
            seed: defaults.seed,
        }
    }
}

impl TrainingSettings {
    pub fn train_config(&self) -> TrainConfig {
        TrainConfig {
            max_iter: self.max_iter,
            learning_rate: self.learning_rate,
            weight_decay: self.weight_decay,
            batch_size: self.batch_size,
            tolerance: self.tolerance,
            seed: self.seed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EmbeddingSettings {
    pub size: ModernBertSize,
    pub max_length: usize,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            size: ModernBertSize::Base,
            max_length: 128,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ZeroShotSettings {
    pub size: ModernBertSize,
}

impl Default for ZeroShotSettings {
    fn default() -> Self {
        Self {
            size: ModernBertSize::Large,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerSettings {
    pub bind: SocketAddr,
    /// Styled demo sessions kept in memory before the least recently used is dropped.
    pub max_sessions: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 8501)),
            max_sessions: 1024,
        }
    }
}

impl Settings {
    /// Reads settings from `path`, or returns the defaults when there is none.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let settings = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path)
                    .map_err(|e| TalkSenseError::file(path, e))?;
                tracing::debug!(?path, "loaded settings file");
                Self::from_toml_str(&raw)?
            }
            None => Self::default(),
        };
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.features.max_features == 0 {
            return Err(invalid("features.max_features must be at least 1"));
        }
        if !(self.features.test_size > 0.0 && self.features.test_size < 1.0) {
            return Err(invalid("features.test_size must be between 0 and 1"));
        }
        if self.features.label_column.trim().is_empty() {
            return Err(invalid("features.label_column cannot be empty"));
        }
        if self.training.max_iter == 0 {
            return Err(invalid("training.max_iter must be at least 1"));
        }
        if self.training.batch_size == 0 {
            return Err(invalid("training.batch_size must be at least 1"));
        }
        if !(self.training.learning_rate > 0.0) {
            return Err(invalid("training.learning_rate must be positive"));
        }
        if self.server.max_sessions == 0 {
            return Err(invalid("server.max_sessions must be at least 1"));
        }
        if self.embedding.max_length == 0 {
            return Err(invalid("embedding.max_length must be at least 1"));
        }
        Ok(())
    }
}

fn invalid(message: &str) -> TalkSenseError {
    TalkSenseError::Config(message.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.features.max_features, 5000);
        assert_eq!(settings.server.bind.port(), 8501);
        assert_eq!(settings.zero_shot.size, ModernBertSize::Large);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let settings = Settings::from_toml_str(
            r#"
            [features]
            max_features = 100

            [embedding]
            size = "large"
            "#,
        )
        .unwrap();
        assert_eq!(settings.features.max_features, 100);
        assert_eq!(settings.features.seed, 42);
        assert_eq!(settings.embedding.size, ModernBertSize::Large);
        assert_eq!(settings.paths, PathSettings::default());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(Settings::from_toml_str("[features]\nmax_feature = 1\n").is_err());
    }

    #[test]
    fn validate_rejects_bad_values() {
        let mut settings = Settings::default();
        settings.features.test_size = 1.0;
        let err = settings.validate().unwrap_err();
        assert!(err.to_string().contains("test_size"));

        let mut settings = Settings::default();
        settings.training.learning_rate = 0.0;
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.features.max_features = 0;
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.server.max_sessions = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("talksense.toml");
        std::fs::write(&path, "[server]\nbind = \"0.0.0.0:9000\"\n").unwrap();
        let settings = Settings::load(Some(&path)).unwrap();
        assert_eq!(settings.server.bind.port(), 9000);
        assert!(Settings::load(Some(&dir.path().join("missing.toml"))).is_err());
    }
}
