use tokenizers::Tokenizer;

use super::model::EmbeddingModel;

/// Texts embedded between two progress log lines.
const PROGRESS_EVERY: usize = 100;

#[derive(Clone)]
pub struct EmbeddingPipeline<M: EmbeddingModel> {
    pub(crate) model: M,
    pub(crate) tokenizer: Tokenizer,
}

impl<M: EmbeddingModel> EmbeddingPipeline<M> {
    /// Embeds one text. Blank text maps to the zero vector.
    pub fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        if text.trim().is_empty() {
            return Ok(vec![0.0; self.dimension()]);
        }
        self.model.embed(&self.tokenizer, text)
    }

    /// Embeds texts one at a time, logging progress as it goes.
    pub fn embed_all<S: AsRef<str>>(&self, texts: &[S]) -> anyhow::Result<Vec<Vec<f32>>> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for (idx, text) in texts.iter().enumerate() {
            embeddings.push(self.embed(text.as_ref())?);
            if (idx + 1) % PROGRESS_EVERY == 0 {
                tracing::info!(done = idx + 1, total = texts.len(), "embedding progress");
            }
        }
        Ok(embeddings)
    }

    pub fn dimension(&self) -> usize {
        self.model.dimension()
    }

    pub fn device(&self) -> &candle_core::Device {
        self.model.device()
    }
}
