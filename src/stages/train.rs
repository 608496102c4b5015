use std::path::Path;

use crate::classifier::{LogisticRegression, SentimentModel, TrainConfig};
use crate::dataset::read_labels;
use crate::error::Result;
use crate::features::{FeatureMatrix, TfidfVectorizer};

use super::{VECTORIZER_FILE, X_TRAIN_FILE, Y_TRAIN_FILE};

/// Trains on the featurized training split and saves the model artifact.
pub fn run(
    processed_dir: &Path,
    model_path: &Path,
    config: &TrainConfig,
) -> Result<SentimentModel> {
    let features = FeatureMatrix::load(processed_dir.join(X_TRAIN_FILE))?;
    let labels = read_labels(processed_dir.join(Y_TRAIN_FILE))?;
    let vectorizer = TfidfVectorizer::load(processed_dir.join(VECTORIZER_FILE))?;
    features.ensure_fingerprint(vectorizer.fingerprint())?;

    let classifier = LogisticRegression::fit(&features, &labels, config)?;
    tracing::info!(
        epochs = classifier.epochs(),
        classes = ?classifier.classes(),
        "trained classifier"
    );

    let model = SentimentModel::new(vectorizer, classifier)?;
    model.save(model_path)?;
    Ok(model)
}
