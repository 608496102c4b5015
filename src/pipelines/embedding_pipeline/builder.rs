use tokenizers::TruncationParams;

use super::model::EmbeddingModel;
use super::pipeline::EmbeddingPipeline;
use crate::core::{global_cache, ModelOptions};
use crate::models::{ModernBertEncoderModel, ModernBertSize};
use crate::pipelines::utils::{build_cache_key, DeviceRequest, DeviceSelectable};

pub struct EmbeddingPipelineBuilder<M: EmbeddingModel> {
    options: M::Options,
    max_length: usize,
    device_request: DeviceRequest,
}

impl<M: EmbeddingModel> EmbeddingPipelineBuilder<M> {
    pub fn new(options: M::Options) -> Self {
        Self {
            options,
            max_length: 128,
            device_request: DeviceRequest::Default,
        }
    }

    /// Truncate every text to this many tokens, special tokens included.
    pub fn max_length(mut self, max_length: usize) -> Self {
        self.max_length = max_length;
        self
    }

    pub async fn build(self) -> anyhow::Result<EmbeddingPipeline<M>>
    where
        M: Clone + Send + Sync + 'static,
        M::Options: ModelOptions + Clone,
    {
        let device = self.device_request.resolve()?;
        let key = build_cache_key(&self.options, &device);
        let model = global_cache()
            .get_or_create(&key, || M::new(self.options.clone(), device.clone()))
            .await?;

        let mut tokenizer = M::get_tokenizer(self.options)?;
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: self.max_length,
                ..Default::default()
            }))
            .map_err(|e| anyhow::anyhow!("Failed to configure truncation: {e}"))?;

        Ok(EmbeddingPipeline { model, tokenizer })
    }
}

impl<M: EmbeddingModel> DeviceSelectable for EmbeddingPipelineBuilder<M> {
    fn device_request_mut(&mut self) -> &mut DeviceRequest {
        &mut self.device_request
    }
}

impl EmbeddingPipelineBuilder<ModernBertEncoderModel> {
    pub fn modernbert(size: ModernBertSize) -> Self {
        Self::new(size)
    }
}
