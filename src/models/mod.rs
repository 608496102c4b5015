//! Transformer models backing the embedding and zero-shot pipelines.
pub mod implementations;

pub use implementations::{
    ModernBertEncoderModel, ModernBertModel, ModernBertSize, ZeroShotModernBertModel,
};
