use std::collections::BTreeSet;

use candle_core::{DType, Device, Tensor, Var};
use candle_nn::{AdamW, Optimizer, ParamsAdamW};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TalkSenseError};
use crate::features::{FeatureMatrix, SparseVector};

/// Optimisation settings for [`LogisticRegression::fit`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainConfig {
    /// Upper bound on full passes over the training rows.
    pub max_iter: usize,
    pub learning_rate: f64,
    /// Decoupled L2 penalty applied by AdamW.
    pub weight_decay: f64,
    pub batch_size: usize,
    /// Stop once the mean epoch loss moves less than this.
    pub tolerance: f64,
    pub seed: u64,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            max_iter: 1000,
            learning_rate: 0.05,
            weight_decay: 1e-4,
            batch_size: 256,
            tolerance: 1e-4,
            seed: 42,
        }
    }
}

/// Multinomial logistic regression over sparse features.
///
/// `weights` is K×D and `biases` has K entries, one per class in `classes`
/// (sorted). Training runs on candle; prediction is a plain sparse dot product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticRegression {
    classes: Vec<String>,
    dim: usize,
    weights: Vec<Vec<f32>>,
    biases: Vec<f32>,
    /// Epochs actually run before convergence or `max_iter`.
    #[serde(default)]
    epochs: usize,
}

fn softmax(scores: &[f32]) -> Vec<f32> {
    let max = scores.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = scores.iter().map(|s| (s - max).exp()).collect();
    let total: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / total).collect()
}

fn dense_batch(features: &FeatureMatrix, batch: &[usize], device: &Device) -> Result<Tensor> {
    let dim = features.dim;
    let mut dense = vec![0f32; batch.len() * dim];
    for (slot, &row) in dense.chunks_mut(dim.max(1)).zip(batch) {
        features.rows[row].scatter_into(slot);
    }
    Ok(Tensor::from_vec(dense, (batch.len(), dim), device)?)
}

impl LogisticRegression {
    pub fn fit(features: &FeatureMatrix, labels: &[String], config: &TrainConfig) -> Result<Self> {
        if features.len() != labels.len() {
            return Err(TalkSenseError::LengthMismatch {
                what: "feature rows vs labels",
                left: features.len(),
                right: labels.len(),
            });
        }
        if features.is_empty() {
            return Err(TalkSenseError::EmptyDataset("no training rows".to_string()));
        }

        let classes: Vec<String> = labels
            .iter()
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        if classes.len() < 2 {
            return Err(TalkSenseError::SingleClass(classes.len()));
        }

        let targets: Vec<u32> = labels
            .iter()
            .map(|label| classes.binary_search(label).unwrap_or_default() as u32)
            .collect();

        let device = Device::Cpu;
        let (n_classes, dim) = (classes.len(), features.dim);
        let weights = Var::zeros((n_classes, dim), DType::F32, &device)?;
        let biases = Var::zeros(n_classes, DType::F32, &device)?;
        let mut optimizer = AdamW::new(
            vec![weights.clone(), biases.clone()],
            ParamsAdamW {
                lr: config.learning_rate,
                weight_decay: config.weight_decay,
                ..Default::default()
            },
        )?;

        tracing::info!(
            rows = features.len(),
            dim,
            classes = n_classes,
            max_iter = config.max_iter,
            "training logistic regression"
        );

        let mut order: Vec<usize> = (0..features.len()).collect();
        let mut rng = StdRng::seed_from_u64(config.seed);
        let mut previous_loss = f64::INFINITY;
        let mut epochs = 0;

        for epoch in 0..config.max_iter {
            order.shuffle(&mut rng);
            let mut epoch_loss = 0.0;

            for batch in order.chunks(config.batch_size.max(1)) {
                let xs = dense_batch(features, batch, &device)?;
                let batch_targets: Vec<u32> = batch.iter().map(|&row| targets[row]).collect();
                let ys = Tensor::from_vec(batch_targets, batch.len(), &device)?;

                let logits = xs.matmul(&weights.t()?)?.broadcast_add(&biases)?;
                let loss = candle_nn::loss::cross_entropy(&logits, &ys)?;
                optimizer.backward_step(&loss)?;

                epoch_loss += loss.to_scalar::<f32>()? as f64 * batch.len() as f64;
            }

            epoch_loss /= features.len() as f64;
            epochs = epoch + 1;
            if epoch % 50 == 0 {
                tracing::debug!(epoch, loss = epoch_loss, "training progress");
            }
            if (previous_loss - epoch_loss).abs() < config.tolerance {
                tracing::info!(epochs, loss = epoch_loss, "converged");
                break;
            }
            previous_loss = epoch_loss;
        }

        if epochs == config.max_iter {
            tracing::warn!(epochs, loss = previous_loss, "stopped at max_iter before converging");
        }

        Ok(Self {
            classes,
            dim,
            weights: weights.as_tensor().to_vec2::<f32>()?,
            biases: biases.as_tensor().to_vec1::<f32>()?,
            epochs,
        })
    }

    /// Builds a model from known parameters.
    pub fn from_parts(
        classes: Vec<String>,
        weights: Vec<Vec<f32>>,
        biases: Vec<f32>,
    ) -> Result<Self> {
        let dim = weights.first().map_or(0, Vec::len);
        let model = Self {
            classes,
            dim,
            weights,
            biases,
            epochs: 0,
        };
        model.validate()?;
        Ok(model)
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.classes.len() < 2 {
            return Err(TalkSenseError::SingleClass(self.classes.len()));
        }
        for (what, got) in [
            ("weight rows vs classes", self.weights.len()),
            ("biases vs classes", self.biases.len()),
        ] {
            if got != self.classes.len() {
                return Err(TalkSenseError::LengthMismatch {
                    what,
                    left: got,
                    right: self.classes.len(),
                });
            }
        }
        if let Some(row) = self.weights.iter().find(|row| row.len() != self.dim) {
            return Err(TalkSenseError::DimensionMismatch {
                expected: self.dim,
                got: row.len(),
            });
        }
        Ok(())
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn epochs(&self) -> usize {
        self.epochs
    }

    pub fn decision_function(&self, row: &SparseVector) -> Vec<f32> {
        self.weights
            .iter()
            .zip(&self.biases)
            .map(|(weights, bias)| row.dot(weights) + bias)
            .collect()
    }

    pub fn predict_proba(&self, row: &SparseVector) -> Vec<f32> {
        softmax(&self.decision_function(row))
    }

    /// Class with the highest score; the earliest class wins ties.
    pub fn predict(&self, row: &SparseVector) -> &str {
        let scores = self.decision_function(row);
        let mut best = 0;
        for (idx, score) in scores.iter().enumerate() {
            if *score > scores[best] {
                best = idx;
            }
        }
        &self.classes[best]
    }

    pub fn predict_all(&self, features: &FeatureMatrix) -> Vec<String> {
        features
            .rows
            .iter()
            .map(|row| self.predict(row).to_string())
            .collect()
    }
}
