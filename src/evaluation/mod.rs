//! Classification metrics.
mod report;

pub use report::{AverageMetrics, ClassMetrics, ClassificationReport, ConfusionMatrix};
