use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TalkSenseError};

/// A sparse feature row: strictly increasing column indices and their weights.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SparseVector {
    pub indices: Vec<u32>,
    pub values: Vec<f32>,
}

impl SparseVector {
    pub fn new(indices: Vec<u32>, values: Vec<f32>) -> Result<Self> {
        if indices.len() != values.len() {
            return Err(TalkSenseError::LengthMismatch {
                what: "sparse indices vs values",
                left: indices.len(),
                right: values.len(),
            });
        }
        Ok(Self { indices, values })
    }

    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    pub fn is_zero(&self) -> bool {
        self.values.iter().all(|v| *v == 0.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, f32)> + '_ {
        self.indices
            .iter()
            .zip(&self.values)
            .map(|(&idx, &value)| (idx as usize, value))
    }

    pub fn norm(&self) -> f32 {
        self.values.iter().map(|v| v * v).sum::<f32>().sqrt()
    }

    /// Dot product with a dense row. Indices past the end of `dense` are ignored.
    pub fn dot(&self, dense: &[f32]) -> f32 {
        self.iter()
            .filter_map(|(idx, value)| dense.get(idx).map(|w| w * value))
            .sum()
    }

    /// Writes this row into a zeroed dense slice.
    pub fn scatter_into(&self, dense: &mut [f32]) {
        dense.fill(0.0);
        for (idx, value) in self.iter() {
            if let Some(slot) = dense.get_mut(idx) {
                *slot = value;
            }
        }
    }

    pub fn to_dense(&self, dim: usize) -> Vec<f32> {
        let mut dense = vec![0.0; dim];
        self.scatter_into(&mut dense);
        dense
    }
}

/// Rows of sparse features tagged with the vectorizer that produced them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureMatrix {
    pub dim: usize,
    pub fingerprint: u64,
    pub rows: Vec<SparseVector>,
}

impl FeatureMatrix {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Fails unless these features came from the vectorizer with `expected` fingerprint.
    pub fn ensure_fingerprint(&self, expected: u64) -> Result<()> {
        if self.fingerprint != expected {
            return Err(TalkSenseError::FingerprintMismatch {
                expected,
                found: self.fingerprint,
            });
        }
        Ok(())
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        write_json(path.as_ref(), self)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        read_json(path.as_ref())
    }
}

pub(crate) fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| TalkSenseError::file(parent, e))?;
    }
    let file = File::create(path).map_err(|e| TalkSenseError::file(path, e))?;
    serde_json::to_writer(BufWriter::new(file), value)?;
    Ok(())
}

pub(crate) fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T> {
    let file = File::open(path).map_err(|e| TalkSenseError::file(path, e))?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dot_and_dense_agree() {
        let row = SparseVector::new(vec![0, 3], vec![0.5, 2.0]).unwrap();
        let weights = [1.0, 9.0, 9.0, -1.0];
        assert_eq!(row.dot(&weights), -1.5);
        assert_eq!(row.to_dense(5), vec![0.5, 0.0, 0.0, 2.0, 0.0]);
    }

    #[test]
    fn mismatched_parts_are_rejected() {
        assert!(SparseVector::new(vec![1], vec![]).is_err());
    }

    #[test]
    fn fingerprint_check() {
        let matrix = FeatureMatrix {
            dim: 2,
            fingerprint: 7,
            rows: vec![SparseVector::default()],
        };
        assert!(matrix.ensure_fingerprint(7).is_ok());
        assert!(matches!(
            matrix.ensure_fingerprint(8),
            Err(TalkSenseError::FingerprintMismatch { expected: 8, found: 7 })
        ));
    }
}
