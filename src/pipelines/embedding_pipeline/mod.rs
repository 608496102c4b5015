//! Dense sentence embeddings from a transformer encoder's first position.
//!
//! ```rust,no_run
//! use talksense::pipelines::embedding_pipeline::*;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let pipeline = EmbeddingPipelineBuilder::modernbert(ModernBertSize::Base)
//!     .max_length(128)
//!     .build()
//!     .await?;
//! let vector = pipeline.embed("loving the new patch")?;
//! assert_eq!(vector.len(), pipeline.dimension());
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod model;
pub mod pipeline;

pub use builder::EmbeddingPipelineBuilder;
pub use model::EmbeddingModel;
pub use pipeline::EmbeddingPipeline;

pub use crate::models::{ModernBertEncoderModel, ModernBertSize};
