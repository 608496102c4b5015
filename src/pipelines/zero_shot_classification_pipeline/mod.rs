//! Zero-shot classification: score arbitrary labels with an NLI model.
//!
//! ```rust,no_run
//! use talksense::pipelines::utils::DeviceSelectable;
//! use talksense::pipelines::zero_shot_classification_pipeline::*;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let pipeline = ZeroShotClassificationPipelineBuilder::modernbert(ModernBertSize::Base)
//!     .cpu()
//!     .build()
//!     .await?;
//! let ranked = pipeline.classify("I can't wait for the weekend!", &["excitement", "sadness"])?;
//! println!("{}: {:.3}", ranked[0].label, ranked[0].score);
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod model;
pub mod pipeline;

pub use builder::ZeroShotClassificationPipelineBuilder;
pub use model::ZeroShotClassificationModel;
pub use pipeline::{LabelScore, ZeroShotClassificationPipeline};

pub use crate::models::{ModernBertSize, ZeroShotModernBertModel};
