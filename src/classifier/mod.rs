//! Multinomial logistic regression and the persisted model artifact.
mod artifact;
mod logistic;

pub use artifact::{SentimentModel, FORMAT_VERSION};
pub use logistic::{LogisticRegression, TrainConfig};
