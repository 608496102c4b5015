//! ModernBERT encoder and the two task models talksense builds on it.
//!
//! ModernBERT is a bidirectional encoder with rotary position embeddings,
//! GeGLU feed-forward blocks and alternating global / sliding-window
//! attention layers. Two heads are exposed:
//!
//! - [`ModernBertEncoderModel`]: the first-position hidden state of the bare
//!   encoder, used as a fixed-size sentence embedding.
//! - [`ZeroShotModernBertModel`]: an NLI classifier that scores candidate
//!   labels against a text through the hypothesis `This example is {label}.`.

use std::collections::HashMap;
use std::sync::Arc;

use candle_core::{DType, Device, IndexOp, Result, Tensor, D};
use candle_nn::{
    embedding, layer_norm_no_bias, linear, linear_no_bias, ops::softmax, Embedding, LayerNorm,
    Linear, Module, VarBuilder,
};
use serde::{Deserialize, Serialize};

const NEG_INF: f32 = f32::NEG_INFINITY;
const MIN_VALUE_F64: f64 = f32::MIN as f64;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Config {
    pub vocab_size: usize,
    pub hidden_size: usize,
    pub num_hidden_layers: usize,
    pub num_attention_heads: usize,
    pub intermediate_size: usize,
    pub max_position_embeddings: usize,
    pub layer_norm_eps: f64,
    pub pad_token_id: u32,
    pub global_attn_every_n_layers: usize,
    pub global_rope_theta: f64,
    pub local_attention: usize,
    pub local_rope_theta: f64,
    #[serde(flatten)]
    pub classifier_config: Option<ClassifierConfig>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Copy, Default)]
#[serde(rename_all = "lowercase")]
pub enum ClassifierPooling {
    #[default]
    CLS,
    MEAN,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ClassifierConfig {
    pub id2label: HashMap<String, String>,
    pub label2id: HashMap<String, String>,
    pub classifier_pooling: ClassifierPooling,
}

#[derive(Debug, Clone)]
struct RoPE {
    sin: Tensor,
    cos: Tensor,
}

impl RoPE {
    fn new(dtype: DType, config: &Config, rope_theta: f64, device: &Device) -> Result<Self> {
        let dim = config.hidden_size / config.num_attention_heads;
        let inv_freq: Vec<f32> = (0..dim)
            .step_by(2)
            .map(|i| (1.0 / rope_theta.powf(i as f64 / dim as f64)) as f32)
            .collect();

        let inv_freq_len = inv_freq.len();
        let inv_freq = Tensor::from_vec(inv_freq, (1, inv_freq_len), device)?.to_dtype(dtype)?;
        let max_seq_len = config.max_position_embeddings;
        let positions = Tensor::arange(0u32, max_seq_len as u32, device)?
            .to_dtype(dtype)?
            .reshape((max_seq_len, 1))?;
        let angles = positions.matmul(&inv_freq)?;

        Ok(Self {
            sin: angles.sin()?,
            cos: angles.cos()?,
        })
    }

    fn apply(&self, q: &Tensor, k: &Tensor) -> Result<(Tensor, Tensor)> {
        let q_embed = candle_nn::rotary_emb::rope(&q.contiguous()?, &self.cos, &self.sin)?;
        let k_embed = candle_nn::rotary_emb::rope(&k.contiguous()?, &self.cos, &self.sin)?;
        Ok((q_embed, k_embed))
    }
}

#[derive(Debug, Clone)]
struct Attention {
    qkv: Linear,
    proj: Linear,
    num_attention_heads: usize,
    attention_head_size: usize,
    rope: Arc<RoPE>,
}

impl Attention {
    fn load(vb: VarBuilder, config: &Config, rope: Arc<RoPE>) -> Result<Self> {
        let num_attention_heads = config.num_attention_heads;
        let attention_head_size = config.hidden_size / config.num_attention_heads;

        let qkv = linear_no_bias(config.hidden_size, config.hidden_size * 3, vb.pp("Wqkv"))?;
        let proj = linear_no_bias(config.hidden_size, config.hidden_size, vb.pp("Wo"))?;

        Ok(Self {
            qkv,
            proj,
            num_attention_heads,
            attention_head_size,
            rope,
        })
    }

    fn forward(&self, hidden_states: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
        let (batch, seq_len, hidden_size) = hidden_states.dims3()?;

        let qkv = hidden_states
            .apply(&self.qkv)?
            .reshape((
                batch,
                seq_len,
                3,
                self.num_attention_heads,
                self.attention_head_size,
            ))?
            .permute((2, 0, 3, 1, 4))?;

        let (q, k) = self.rope.apply(&qkv.get(0)?, &qkv.get(1)?)?;
        let v = qkv.get(2)?;

        let q = (q * (self.attention_head_size as f64).powf(-0.5))?;
        let scores = q
            .matmul(&k.transpose(D::Minus2, D::Minus1)?)?
            .broadcast_add(attention_mask)?;
        let probs = softmax(&scores, D::Minus1)?;

        probs
            .matmul(&v)?
            .transpose(1, 2)?
            .reshape((batch, seq_len, hidden_size))?
            .apply(&self.proj)
    }
}

/// GeGLU feed-forward block.
#[derive(Debug, Clone)]
struct FeedForward {
    wi: Linear,
    wo: Linear,
}

impl FeedForward {
    fn load(vb: VarBuilder, config: &Config) -> Result<Self> {
        let wi = linear_no_bias(
            config.hidden_size,
            config.intermediate_size * 2,
            vb.pp("Wi"),
        )?;
        let wo = linear_no_bias(config.intermediate_size, config.hidden_size, vb.pp("Wo"))?;
        Ok(Self { wi, wo })
    }
}

impl Module for FeedForward {
    fn forward(&self, xs: &Tensor) -> Result<Tensor> {
        let xs = xs.apply(&self.wi)?;
        let chunks = xs.chunk(2, D::Minus1)?;
        (&chunks[0].gelu_erf()? * &chunks[1])?.apply(&self.wo)
    }
}

#[derive(Debug, Clone)]
struct TransformerLayer {
    attention: Attention,
    feed_forward: FeedForward,
    // The first layer has no attention norm; embeddings are already normed.
    attention_norm: Option<LayerNorm>,
    ffn_norm: LayerNorm,
    uses_local_attention: bool,
}

impl TransformerLayer {
    fn load(
        vb: VarBuilder,
        config: &Config,
        rope: Arc<RoPE>,
        uses_local_attention: bool,
    ) -> Result<Self> {
        let attention = Attention::load(vb.pp("attn"), config, rope)?;
        let feed_forward = FeedForward::load(vb.pp("mlp"), config)?;
        let attention_norm = layer_norm_no_bias(
            config.hidden_size,
            config.layer_norm_eps,
            vb.pp("attn_norm"),
        )
        .ok();
        let ffn_norm =
            layer_norm_no_bias(config.hidden_size, config.layer_norm_eps, vb.pp("mlp_norm"))?;

        Ok(Self {
            attention,
            feed_forward,
            attention_norm,
            ffn_norm,
            uses_local_attention,
        })
    }

    fn forward(
        &self,
        hidden_states: &Tensor,
        global_attention_mask: &Tensor,
        local_attention_mask: &Tensor,
    ) -> Result<Tensor> {
        let normed = match &self.attention_norm {
            Some(norm) => hidden_states.apply(norm)?,
            None => hidden_states.clone(),
        };

        let attention_mask = if self.uses_local_attention {
            &global_attention_mask.broadcast_add(local_attention_mask)?
        } else {
            global_attention_mask
        };

        let hidden_states = (hidden_states + self.attention.forward(&normed, attention_mask)?)?;
        let ffn_output = hidden_states
            .apply(&self.ffn_norm)?
            .apply(&self.feed_forward)?;
        hidden_states + ffn_output
    }
}

#[derive(Debug, Clone)]
struct ClassificationHead {
    dense: Linear,
    norm: LayerNorm,
    classifier: Linear,
    pooling: ClassifierPooling,
}

impl ClassificationHead {
    fn load(vb: VarBuilder, config: &Config) -> Result<Self> {
        let dense = linear_no_bias(config.hidden_size, config.hidden_size, vb.pp("head.dense"))?;
        let norm = layer_norm_no_bias(
            config.hidden_size,
            config.layer_norm_eps,
            vb.pp("head.norm"),
        )?;

        let num_labels = config
            .classifier_config
            .as_ref()
            .map_or(0, |c| c.id2label.len());
        let classifier = linear(config.hidden_size, num_labels, vb.pp("classifier"))?;

        let pooling = config
            .classifier_config
            .as_ref()
            .map_or(ClassifierPooling::CLS, |c| c.classifier_pooling);

        Ok(Self {
            dense,
            norm,
            classifier,
            pooling,
        })
    }

    fn forward(&self, hidden_states: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
        let pooled = match self.pooling {
            ClassifierPooling::CLS => hidden_states.i((.., 0, ..))?,
            ClassifierPooling::MEAN => {
                let mask = attention_mask.unsqueeze(D::Minus1)?.to_dtype(DType::F32)?;
                let sum_hidden = hidden_states.broadcast_mul(&mask)?.sum(1)?;
                let sum_mask = attention_mask.sum_keepdim(1)?.to_dtype(DType::F32)?;
                sum_hidden.broadcast_div(&sum_mask)?
            }
        };

        pooled
            .apply(&self.dense)?
            .gelu_erf()?
            .apply(&self.norm)?
            .apply(&self.classifier)
    }
}

/// Encoder weights shared by every head.
#[derive(Debug, Clone)]
pub struct ModelWeights {
    embeddings: Embedding,
    embedding_norm: LayerNorm,
    layers: Vec<TransformerLayer>,
    final_norm: LayerNorm,
    local_attention_size: usize,
    hidden_size: usize,
    device: Device,
    dtype: DType,
}

impl ModelWeights {
    pub fn load(vb: VarBuilder, config: &Config) -> Result<Self> {
        let embeddings = embedding(
            config.vocab_size,
            config.hidden_size,
            vb.pp("model.embeddings.tok_embeddings"),
        )?;
        let embedding_norm = layer_norm_no_bias(
            config.hidden_size,
            config.layer_norm_eps,
            vb.pp("model.embeddings.norm"),
        )?;

        let global_rope = Arc::new(RoPE::new(
            vb.dtype(),
            config,
            config.global_rope_theta,
            vb.device(),
        )?);
        let local_rope = Arc::new(RoPE::new(
            vb.dtype(),
            config,
            config.local_rope_theta,
            vb.device(),
        )?);

        let mut layers = Vec::with_capacity(config.num_hidden_layers);
        for layer_idx in 0..config.num_hidden_layers {
            let uses_local_attention = layer_idx % config.global_attn_every_n_layers != 0;
            let rope = if uses_local_attention {
                local_rope.clone()
            } else {
                global_rope.clone()
            };
            layers.push(TransformerLayer::load(
                vb.pp(format!("model.layers.{layer_idx}")),
                config,
                rope,
                uses_local_attention,
            )?);
        }

        let final_norm = layer_norm_no_bias(
            config.hidden_size,
            config.layer_norm_eps,
            vb.pp("model.final_norm"),
        )?;

        Ok(Self {
            embeddings,
            embedding_norm,
            layers,
            final_norm,
            local_attention_size: config.local_attention,
            hidden_size: config.hidden_size,
            device: vb.device().clone(),
            dtype: vb.dtype(),
        })
    }

    /// Additive mask hiding padded key positions.
    fn global_attention_mask(&self, mask: &Tensor) -> Result<Tensor> {
        let (batch_size, seq_len) = mask.dims2()?;
        let expanded = mask
            .unsqueeze(1)?
            .unsqueeze(2)?
            .expand((batch_size, 1, seq_len, seq_len))?
            .to_dtype(self.dtype)?;
        ((1.0 - expanded)? * MIN_VALUE_F64)?.to_dtype(self.dtype)
    }

    /// Additive mask limiting local layers to a symmetric window.
    fn local_attention_mask(&self, seq_len: usize) -> Result<Tensor> {
        let max_distance = self.local_attention_size / 2;
        let mask: Vec<f32> = (0..seq_len)
            .flat_map(|i| {
                (0..seq_len).map(move |j| {
                    if i.abs_diff(j) > max_distance {
                        NEG_INF
                    } else {
                        0.0
                    }
                })
            })
            .collect();
        Tensor::from_slice(&mask, (seq_len, seq_len), &self.device)
    }

    fn forward(&self, input_ids: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
        let seq_len = input_ids.dim(1)?;
        let global_attention_mask = self.global_attention_mask(attention_mask)?;
        let local_attention_mask = self.local_attention_mask(seq_len)?;

        let mut hidden_states = input_ids
            .apply(&self.embeddings)?
            .apply(&self.embedding_norm)?;
        for layer in &self.layers {
            hidden_states =
                layer.forward(&hidden_states, &global_attention_mask, &local_attention_mask)?;
        }
        hidden_states.apply(&self.final_norm)
    }
}

/// The bare encoder: token ids in, hidden states out.
#[derive(Debug, Clone)]
pub struct ModernBertModel {
    weights: Arc<ModelWeights>,
}

impl ModernBertModel {
    pub fn load(vb: VarBuilder, config: &Config) -> Result<Self> {
        Ok(Self {
            weights: Arc::new(ModelWeights::load(vb, config)?),
        })
    }

    /// `input_ids` and `attention_mask` are `(batch, seq_len)`; returns
    /// `(batch, seq_len, hidden_size)`.
    pub fn forward(&self, input_ids: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
        self.weights.forward(input_ids, attention_mask)
    }

    pub fn hidden_size(&self) -> usize {
        self.weights.hidden_size
    }
}

#[derive(Debug, Clone)]
pub struct ModernBertForSequenceClassification {
    weights: Arc<ModelWeights>,
    head: ClassificationHead,
}

impl ModernBertForSequenceClassification {
    pub fn load(vb: VarBuilder, config: &Config) -> Result<Self> {
        let weights = Arc::new(ModelWeights::load(vb.clone(), config)?);
        let head = ClassificationHead::load(vb, config)?;
        Ok(Self { weights, head })
    }

    /// Returns logits of shape `(batch, num_labels)`.
    pub fn forward(&self, input_ids: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
        let hidden_states = self.weights.forward(input_ids, attention_mask)?;
        self.head.forward(&hidden_states, attention_mask)
    }
}

/*
Task models
*/

use anyhow::{Context, Result as AnyhowResult};
use tokenizers::Tokenizer;

use crate::loaders::{load_checkpoint, TokenizerLoader};

/// Checkpoint size shared by the encoder and zero-shot models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ModernBertSize {
    Base,
    Large,
}

impl std::fmt::Display for ModernBertSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ModernBertSize::Base => "modernbert-base",
            ModernBertSize::Large => "modernbert-large",
        };
        write!(f, "{name}")
    }
}

impl crate::core::ModelOptions for ModernBertSize {
    fn cache_key(&self) -> String {
        self.to_string()
    }
}

/// Labels scored in one forward pass of the zero-shot model.
const LABEL_BATCH: usize = 16;

/// First-token sentence encoder over the pretrained ModernBERT checkpoints.
#[derive(Clone)]
pub struct ModernBertEncoderModel {
    model: ModernBertModel,
    device: Device,
}

impl ModernBertEncoderModel {
    pub fn repo_id(size: ModernBertSize) -> &'static str {
        match size {
            ModernBertSize::Base => "answerdotai/ModernBERT-base",
            ModernBertSize::Large => "answerdotai/ModernBERT-large",
        }
    }

    pub fn new(size: ModernBertSize, device: Device) -> AnyhowResult<Self> {
        let repo_id = Self::repo_id(size);
        let checkpoint = load_checkpoint(repo_id, &device)?;
        let config: Config = serde_json::from_str(&checkpoint.config)
            .with_context(|| format!("parsing config of {repo_id}"))?;
        let model = ModernBertModel::load(checkpoint.vb, &config)?;
        Ok(Self { model, device })
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    pub fn hidden_size(&self) -> usize {
        self.model.hidden_size()
    }

    /// Hidden state at position 0 for a single text.
    pub fn encode_first_token(&self, tokenizer: &Tokenizer, text: &str) -> AnyhowResult<Vec<f32>> {
        let encoding = tokenizer
            .encode(text, true)
            .map_err(|e| anyhow::anyhow!("Tokenization error: {e}"))?;

        let input_ids = Tensor::new(encoding.get_ids(), &self.device)?.unsqueeze(0)?;
        let attention_mask =
            Tensor::new(encoding.get_attention_mask(), &self.device)?.unsqueeze(0)?;

        let hidden_states = self.model.forward(&input_ids, &attention_mask)?;
        Ok(hidden_states.i((0, 0))?.to_vec1::<f32>()?)
    }

    pub fn get_tokenizer(size: ModernBertSize) -> AnyhowResult<Tokenizer> {
        TokenizerLoader::new(Self::repo_id(size)).load()
    }
}

impl crate::pipelines::embedding_pipeline::EmbeddingModel for ModernBertEncoderModel {
    type Options = ModernBertSize;

    fn new(options: Self::Options, device: Device) -> AnyhowResult<Self> {
        ModernBertEncoderModel::new(options, device)
    }

    fn embed(&self, tokenizer: &Tokenizer, text: &str) -> AnyhowResult<Vec<f32>> {
        self.encode_first_token(tokenizer, text)
    }

    fn dimension(&self) -> usize {
        self.hidden_size()
    }

    fn get_tokenizer(options: Self::Options) -> AnyhowResult<Tokenizer> {
        Self::get_tokenizer(options)
    }

    fn device(&self) -> &Device {
        self.device()
    }
}

/// NLI-tuned ModernBERT used for zero-shot classification.
#[derive(Clone)]
pub struct ZeroShotModernBertModel {
    model: ModernBertForSequenceClassification,
    device: Device,
    entailment_id: usize,
}

impl ZeroShotModernBertModel {
    pub fn repo_id(size: ModernBertSize) -> &'static str {
        match size {
            ModernBertSize::Base => "MoritzLaurer/ModernBERT-base-zeroshot-v2.0",
            ModernBertSize::Large => "MoritzLaurer/ModernBERT-large-zeroshot-v2.0",
        }
    }

    pub fn new(size: ModernBertSize, device: Device) -> AnyhowResult<Self> {
        let repo_id = Self::repo_id(size);
        let checkpoint = load_checkpoint(repo_id, &device)?;

        #[derive(Deserialize)]
        struct NliLabels {
            id2label: HashMap<String, String>,
            label2id: HashMap<String, u32>,
            classifier_pooling: Option<ClassifierPooling>,
        }
        let labels: NliLabels = serde_json::from_str(&checkpoint.config)
            .with_context(|| format!("parsing label maps of {repo_id}"))?;
        let entailment_id = *labels
            .label2id
            .get("entailment")
            .context("label2id has no 'entailment' entry")? as usize;

        let mut config: Config = serde_json::from_str(&checkpoint.config)
            .with_context(|| format!("parsing config of {repo_id}"))?;
        config.classifier_config = Some(ClassifierConfig {
            id2label: labels.id2label,
            label2id: labels
                .label2id
                .iter()
                .map(|(label, id)| (label.clone(), id.to_string()))
                .collect(),
            classifier_pooling: labels.classifier_pooling.unwrap_or(ClassifierPooling::MEAN),
        });

        let model = ModernBertForSequenceClassification::load(checkpoint.vb, &config)?;
        Ok(Self {
            model,
            device,
            entailment_id,
        })
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    /// Entailment logit of `This example is {label}.` for each label, in order.
    fn entailment_logits(
        &self,
        tokenizer: &Tokenizer,
        text: &str,
        candidate_labels: &[&str],
    ) -> AnyhowResult<Tensor> {
        let pad_token_id = tokenizer
            .get_padding()
            .map(|p| p.pad_id)
            .or_else(|| tokenizer.token_to_id("[PAD]"))
            .or_else(|| tokenizer.token_to_id("<pad>"))
            .unwrap_or(0);

        let mut batches = Vec::new();
        for labels in candidate_labels.chunks(LABEL_BATCH) {
            let mut encodings = Vec::with_capacity(labels.len());
            for label in labels {
                let hypothesis = format!("This example is {label}.");
                let encoding = tokenizer
                    .encode((text, hypothesis.as_str()), true)
                    .map_err(|e| anyhow::anyhow!("Tokenization error: {e}"))?;
                encodings.push(encoding);
            }

            let max_len = encodings.iter().map(|e| e.len()).max().unwrap_or(0);
            let mut token_ids = Vec::with_capacity(labels.len() * max_len);
            let mut attention_mask = Vec::with_capacity(labels.len() * max_len);
            for encoding in &encodings {
                let pad = max_len - encoding.len();
                token_ids.extend_from_slice(encoding.get_ids());
                token_ids.extend(std::iter::repeat(pad_token_id).take(pad));
                attention_mask.extend_from_slice(encoding.get_attention_mask());
                attention_mask.extend(std::iter::repeat(0u32).take(pad));
            }

            let input_ids = Tensor::from_vec(token_ids, (labels.len(), max_len), &self.device)?;
            let attention_mask =
                Tensor::from_vec(attention_mask, (labels.len(), max_len), &self.device)?;
            let logits = self.model.forward(&input_ids, &attention_mask)?;
            batches.push(logits.i((.., self.entailment_id))?);
        }

        Ok(Tensor::cat(&batches, 0)?)
    }

    /// Scores every label, soft-maxing entailment logits across labels so the
    /// scores sum to 1. Sorted by descending score.
    pub fn predict(
        &self,
        tokenizer: &Tokenizer,
        text: &str,
        candidate_labels: &[&str],
    ) -> AnyhowResult<Vec<(String, f32)>> {
        if candidate_labels.is_empty() {
            return Ok(vec![]);
        }

        let logits = self.entailment_logits(tokenizer, text, candidate_labels)?;
        let scores = softmax(&logits, D::Minus1)?.to_vec1::<f32>()?;

        let mut results: Vec<(String, f32)> = candidate_labels
            .iter()
            .map(|label| label.to_string())
            .zip(scores)
            .collect();
        results.sort_by(|a, b| b.1.total_cmp(&a.1));
        Ok(results)
    }

    pub fn get_tokenizer(size: ModernBertSize) -> AnyhowResult<Tokenizer> {
        TokenizerLoader::new(Self::repo_id(size)).load()
    }
}

impl crate::pipelines::zero_shot_classification_pipeline::ZeroShotClassificationModel
    for ZeroShotModernBertModel
{
    type Options = ModernBertSize;

    fn new(options: Self::Options, device: Device) -> AnyhowResult<Self> {
        ZeroShotModernBertModel::new(options, device)
    }

    fn predict(
        &self,
        tokenizer: &Tokenizer,
        text: &str,
        candidate_labels: &[&str],
    ) -> AnyhowResult<Vec<(String, f32)>> {
        self.predict(tokenizer, text, candidate_labels)
    }

    fn get_tokenizer(options: Self::Options) -> AnyhowResult<Tokenizer> {
        Self::get_tokenizer(options)
    }

    fn device(&self) -> &Device {
        self.device()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_names_and_serde() {
        assert_eq!(ModernBertSize::Large.to_string(), "modernbert-large");
        let size: ModernBertSize = serde_json::from_str("\"base\"").unwrap();
        assert_eq!(size, ModernBertSize::Base);
    }

    #[test]
    fn repos_differ_per_task() {
        assert_ne!(
            ModernBertEncoderModel::repo_id(ModernBertSize::Base),
            ZeroShotModernBertModel::repo_id(ModernBertSize::Base)
        );
    }
}
