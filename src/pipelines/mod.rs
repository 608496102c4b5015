//! Transformer inference pipelines: a model, its tokenizer and a builder that
//! picks the device and shares weights through the global model cache.
pub mod embedding_pipeline;
pub mod utils;
pub mod zero_shot_classification_pipeline;
