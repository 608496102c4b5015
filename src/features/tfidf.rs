use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use xxhash_rust::xxh3::xxh3_64;

use super::sparse::{read_json, write_json, FeatureMatrix, SparseVector};
use crate::error::{Result, TalkSenseError};

fn token_pattern() -> &'static Regex {
    static TOKEN: OnceLock<Regex> = OnceLock::new();
    TOKEN.get_or_init(|| Regex::new(r"\b\w\w+\b").expect("static token pattern"))
}

/// Lowercases and splits into word tokens of two or more characters.
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    token_pattern()
        .find_iter(&lowered)
        .map(|m| m.as_str().to_string())
        .collect()
}

#[derive(Serialize, Deserialize)]
struct StoredTfidf {
    max_features: usize,
    vocabulary: Vec<String>,
    idf: Vec<f32>,
}

/// TF-IDF bag-of-words with smoothed idf and L2-normalized rows.
///
/// The vocabulary is kept in alphabetical order; a term's position is its
/// feature index. Fit once on training text and reuse for everything else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "StoredTfidf", into = "StoredTfidf")]
pub struct TfidfVectorizer {
    max_features: usize,
    vocabulary: Vec<String>,
    idf: Vec<f32>,
    index: HashMap<String, u32>,
}

impl From<StoredTfidf> for TfidfVectorizer {
    fn from(stored: StoredTfidf) -> Self {
        let index = stored
            .vocabulary
            .iter()
            .enumerate()
            .map(|(idx, term)| (term.clone(), idx as u32))
            .collect();
        Self {
            max_features: stored.max_features,
            vocabulary: stored.vocabulary,
            idf: stored.idf,
            index,
        }
    }
}

impl From<TfidfVectorizer> for StoredTfidf {
    fn from(vectorizer: TfidfVectorizer) -> Self {
        Self {
            max_features: vectorizer.max_features,
            vocabulary: vectorizer.vocabulary,
            idf: vectorizer.idf,
        }
    }
}

impl TfidfVectorizer {
    /// Learns vocabulary and idf weights from `documents`.
    ///
    /// When the corpus has more than `max_features` distinct terms, the most
    /// frequent ones (by total count, ties alphabetical) are kept.
    pub fn fit<S: AsRef<str>>(documents: &[S], max_features: usize) -> Result<Self> {
        let mut term_counts: HashMap<String, usize> = HashMap::new();
        let mut doc_freq: HashMap<String, usize> = HashMap::new();

        for doc in documents {
            let tokens = tokenize(doc.as_ref());
            let unique: HashSet<&String> = tokens.iter().collect();
            for token in unique {
                *doc_freq.entry(token.clone()).or_insert(0) += 1;
            }
            for token in tokens {
                *term_counts.entry(token).or_insert(0) += 1;
            }
        }

        if term_counts.is_empty() {
            return Err(TalkSenseError::EmptyDataset(
                "no terms left to build a vocabulary from".to_string(),
            ));
        }

        let distinct = term_counts.len();
        let mut ranked: Vec<(String, usize)> = term_counts.into_iter().collect();
        if ranked.len() > max_features {
            ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
            ranked.truncate(max_features);
        }

        let mut vocabulary: Vec<String> = ranked.into_iter().map(|(term, _)| term).collect();
        vocabulary.sort_unstable();

        let n_docs = documents.len() as f64;
        let idf = vocabulary
            .iter()
            .map(|term| {
                let df = doc_freq.get(term).copied().unwrap_or(0) as f64;
                (((1.0 + n_docs) / (1.0 + df)).ln() + 1.0) as f32
            })
            .collect();

        tracing::info!(
            documents = documents.len(),
            distinct_terms = distinct,
            vocabulary = vocabulary.len(),
            max_features,
            "fitted tf-idf vectorizer"
        );

        Ok(Self::from(StoredTfidf {
            max_features,
            vocabulary,
            idf,
        }))
    }

    /// Number of features, i.e. the vocabulary size.
    pub fn dim(&self) -> usize {
        self.vocabulary.len()
    }

    pub fn vocabulary(&self) -> &[String] {
        &self.vocabulary
    }

    pub fn idf(&self) -> &[f32] {
        &self.idf
    }

    pub fn term_index(&self, term: &str) -> Option<usize> {
        self.index.get(term).map(|&idx| idx as usize)
    }

    /// Hash of the ordered vocabulary and idf weights.
    pub fn fingerprint(&self) -> u64 {
        let mut bytes = Vec::with_capacity(self.vocabulary.len() * 12);
        for (term, idf) in self.vocabulary.iter().zip(&self.idf) {
            bytes.extend_from_slice(term.as_bytes());
            bytes.push(0);
            bytes.extend_from_slice(&idf.to_le_bytes());
        }
        xxh3_64(&bytes)
    }

    /// Vectorizes one text. Terms outside the vocabulary are dropped.
    pub fn transform(&self, text: &str) -> SparseVector {
        let mut counts: BTreeMap<u32, f32> = BTreeMap::new();
        for token in tokenize(text) {
            if let Some(&idx) = self.index.get(&token) {
                *counts.entry(idx).or_insert(0.0) += 1.0;
            }
        }

        let mut indices = Vec::with_capacity(counts.len());
        let mut values = Vec::with_capacity(counts.len());
        for (idx, count) in counts {
            indices.push(idx);
            values.push(count * self.idf[idx as usize]);
        }

        let norm = values.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            values.iter_mut().for_each(|v| *v /= norm);
        }

        SparseVector { indices, values }
    }

    pub fn transform_all<S: AsRef<str>>(&self, documents: &[S]) -> FeatureMatrix {
        FeatureMatrix {
            dim: self.dim(),
            fingerprint: self.fingerprint(),
            rows: documents
                .iter()
                .map(|doc| self.transform(doc.as_ref()))
                .collect(),
        }
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        write_json(path.as_ref(), self)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let vectorizer: Self = read_json(path.as_ref())?;
        vectorizer.validate()?;
        Ok(vectorizer)
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.vocabulary.len() != self.idf.len() {
            return Err(TalkSenseError::LengthMismatch {
                what: "vocabulary vs idf weights",
                left: self.vocabulary.len(),
                right: self.idf.len(),
            });
        }
        Ok(())
    }
}
