use std::path::Path;

use crate::core::config::FeatureSettings;
use crate::dataset::{train_test_split, write_labels, Table};
use crate::error::Result;
use crate::features::TfidfVectorizer;

use super::{
    labelled_texts, VECTORIZER_FILE, X_TEST_FILE, X_TRAIN_FILE, Y_TEST_FILE, Y_TRAIN_FILE,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeaturizeSummary {
    pub train_rows: usize,
    pub test_rows: usize,
    pub vocabulary: usize,
    pub fingerprint: u64,
}

fn pick(indices: &[usize], values: &[String]) -> Vec<String> {
    indices.iter().map(|&idx| values[idx].clone()).collect()
}

/// Splits the cleaned data, fits TF-IDF on the training part and writes both
/// feature matrices, both label files and the vectorizer into `processed_dir`.
pub fn run(
    cleaned: &Path,
    processed_dir: &Path,
    settings: &FeatureSettings,
) -> Result<FeaturizeSummary> {
    let table = Table::read_csv_with_header(cleaned)?;
    let (texts, labels) = labelled_texts(&table, &settings.label_column)?;

    let split = train_test_split(texts.len(), settings.test_size, settings.seed);
    let (train_texts, test_texts) = (pick(&split.train, &texts), pick(&split.test, &texts));
    let (train_labels, test_labels) = (pick(&split.train, &labels), pick(&split.test, &labels));

    let vectorizer = TfidfVectorizer::fit(&train_texts, settings.max_features)?;
    let x_train = vectorizer.transform_all(&train_texts);
    let x_test = vectorizer.transform_all(&test_texts);

    x_train.save(processed_dir.join(X_TRAIN_FILE))?;
    x_test.save(processed_dir.join(X_TEST_FILE))?;
    write_labels(processed_dir.join(Y_TRAIN_FILE), &settings.label_column, &train_labels)?;
    write_labels(processed_dir.join(Y_TEST_FILE), &settings.label_column, &test_labels)?;
    vectorizer.save(processed_dir.join(VECTORIZER_FILE))?;

    let summary = FeaturizeSummary {
        train_rows: x_train.len(),
        test_rows: x_test.len(),
        vocabulary: vectorizer.dim(),
        fingerprint: vectorizer.fingerprint(),
    };
    tracing::info!(?summary, dir = ?processed_dir, "wrote tf-idf features");
    Ok(summary)
}
