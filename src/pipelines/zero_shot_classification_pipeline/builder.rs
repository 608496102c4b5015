use tokenizers::{TruncationParams, TruncationStrategy};

use super::model::ZeroShotClassificationModel;
use super::pipeline::ZeroShotClassificationPipeline;
use crate::core::{global_cache, ModelOptions};
use crate::models::{ModernBertSize, ZeroShotModernBertModel};
use crate::pipelines::utils::{build_cache_key, DeviceRequest, DeviceSelectable};

/// Premise/hypothesis pairs longer than this are cut from the premise side.
const MAX_PAIR_TOKENS: usize = 512;

pub struct ZeroShotClassificationPipelineBuilder<M: ZeroShotClassificationModel> {
    options: M::Options,
    device_request: DeviceRequest,
}

impl<M: ZeroShotClassificationModel> ZeroShotClassificationPipelineBuilder<M> {
    pub fn new(options: M::Options) -> Self {
        Self {
            options,
            device_request: DeviceRequest::Default,
        }
    }

    /// Loads (or reuses from the global cache) the model and its tokenizer.
    pub async fn build(self) -> anyhow::Result<ZeroShotClassificationPipeline<M>>
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
                max_length: MAX_PAIR_TOKENS,
                strategy: TruncationStrategy::OnlyFirst,
                ..Default::default()
            }))
            .map_err(|e| anyhow::anyhow!("Failed to configure truncation: {e}"))?;

        Ok(ZeroShotClassificationPipeline { model, tokenizer })
    }
}

impl<M: ZeroShotClassificationModel> DeviceSelectable for ZeroShotClassificationPipelineBuilder<M> {
    fn device_request_mut(&mut self) -> &mut DeviceRequest {
        &mut self.device_request
    }
}

impl ZeroShotClassificationPipelineBuilder<ZeroShotModernBertModel> {
    pub fn modernbert(size: ModernBertSize) -> Self {
        Self::new(size)
    }
}
