//! The batch stages. Each reads its inputs from disk, writes its outputs to
//! disk and shares nothing else with the other stages.
pub mod embed;
pub mod evaluate;
pub mod featurize;
pub mod preprocess;
pub mod train;

use crate::dataset::Table;
use crate::error::{Result, TalkSenseError};

/// Column added by the preprocessor and read by both feature extractors.
pub const CLEAN_TEXT_COLUMN: &str = "clean_text";

pub const X_TRAIN_FILE: &str = "X_train.json";
pub const X_TEST_FILE: &str = "X_test.json";
pub const Y_TRAIN_FILE: &str = "y_train.csv";
pub const Y_TEST_FILE: &str = "y_test.csv";
pub const VECTORIZER_FILE: &str = "tfidf_vectorizer.json";
pub const EMBEDDINGS_FILE: &str = "X_embeddings.npy";
pub const EMBEDDING_LABELS_FILE: &str = "y_labels.csv";

/// Cleaned texts and their labels, skipping rows whose cleaned text is blank.
pub(crate) fn labelled_texts(
    table: &Table,
    label_column: &str,
) -> Result<(Vec<String>, Vec<String>)> {
    let texts = table.column(CLEAN_TEXT_COLUMN)?;
    let labels = table.column(label_column)?;

    let (texts, labels): (Vec<String>, Vec<String>) = texts
        .into_iter()
        .zip(labels)
        .filter(|(text, _)| !text.trim().is_empty())
        .map(|(text, label)| (text.to_string(), label.to_string()))
        .unzip();

    if texts.is_empty() {
        return Err(TalkSenseError::EmptyDataset(format!(
            "no rows with non-blank `{CLEAN_TEXT_COLUMN}`"
        )));
    }
    tracing::info!(
        rows = texts.len(),
        dropped = table.len() - texts.len(),
        "loaded labelled texts"
    );
    Ok((texts, labels))
}
