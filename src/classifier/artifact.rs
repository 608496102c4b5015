use std::path::Path;

use serde::{Deserialize, Serialize};

use super::logistic::LogisticRegression;
use crate::error::{Result, TalkSenseError};
use crate::features::{read_json, write_json, FeatureMatrix, TfidfVectorizer};
use crate::text::clean_text;

/// Version written into every saved [`SentimentModel`].
pub const FORMAT_VERSION: u32 = 1;

/// A trained classifier bundled with the vectorizer it was trained against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentModel {
    format_version: u32,
    vectorizer: TfidfVectorizer,
    classifier: LogisticRegression,
}

impl SentimentModel {
    pub fn new(vectorizer: TfidfVectorizer, classifier: LogisticRegression) -> Result<Self> {
        let model = Self {
            format_version: FORMAT_VERSION,
            vectorizer,
            classifier,
        };
        model.validate_pair()?;
        Ok(model)
    }

    fn validate_pair(&self) -> Result<()> {
        self.vectorizer.validate()?;
        self.classifier.validate()?;
        if self.classifier.dim() != self.vectorizer.dim() {
            return Err(TalkSenseError::DimensionMismatch {
                expected: self.vectorizer.dim(),
                got: self.classifier.dim(),
            });
        }
        Ok(())
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        write_json(path, self)?;
        tracing::info!(?path, classes = ?self.classifier.classes(), "saved sentiment model");
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let model: Self = read_json(path)?;
        if model.format_version != FORMAT_VERSION {
            return Err(TalkSenseError::ArtifactVersion {
                path: path.to_path_buf(),
                found: model.format_version,
                supported: FORMAT_VERSION,
            });
        }
        model.validate_pair()?;
        tracing::info!(?path, dim = model.vectorizer.dim(), "loaded sentiment model");
        Ok(model)
    }

    pub fn vectorizer(&self) -> &TfidfVectorizer {
        &self.vectorizer
    }

    pub fn classifier(&self) -> &LogisticRegression {
        &self.classifier
    }

    pub fn classes(&self) -> &[String] {
        self.classifier.classes()
    }

    /// Predicts labels for features built by this model's vectorizer.
    pub fn predict(&self, features: &FeatureMatrix) -> Result<Vec<String>> {
        features.ensure_fingerprint(self.vectorizer.fingerprint())?;
        Ok(self.classifier.predict_all(features))
    }

    /// Cleans and vectorizes raw text, then predicts its label.
    pub fn predict_text(&self, text: &str) -> &str {
        let row = self.vectorizer.transform(&clean_text(text));
        self.classifier.predict(&row)
    }
}
