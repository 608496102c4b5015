//! Bag-of-words features: TF-IDF vectorizer and sparse feature matrices.
mod sparse;
mod tfidf;

pub use sparse::{FeatureMatrix, SparseVector};
pub use tfidf::{tokenize, TfidfVectorizer};

pub(crate) use sparse::{read_json, write_json};
