//! TalkSense: tweet sentiment analysis from raw CSV to a served model.
//!
//! The batch stages in [`stages`] clean a tweet dataset, build TF-IDF (or
//! ModernBERT embedding) features, train a logistic-regression classifier and
//! evaluate it. [`demo`] serves a zero-shot emotion model and the locally
//! trained classifier over HTTP.

pub mod classifier;
pub mod core;
pub mod dataset;
pub mod demo;
pub mod error;
pub mod evaluation;
pub mod features;
mod loaders;
pub mod models;
pub mod pipelines;
pub mod stages;
pub mod text;

pub use crate::core::Settings;
pub use error::{Result, TalkSenseError};

pub use classifier::SentimentModel;
pub use models::implementations::ModernBertSize;
pub use text::clean_text;
