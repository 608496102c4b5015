use std::path::Path;

use crate::classifier::SentimentModel;
use crate::dataset::read_labels;
use crate::error::{Result, TalkSenseError};
use crate::evaluation::{ClassificationReport, ConfusionMatrix};
use crate::features::FeatureMatrix;

use super::{X_TEST_FILE, Y_TEST_FILE};

#[derive(Debug, Clone)]
pub struct Evaluation {
    pub report: ClassificationReport,
    pub confusion: ConfusionMatrix,
}

impl Evaluation {
    /// Contents of the metrics report file.
    pub fn report_file_contents(&self) -> String {
        format!("Classification Report:\n{}", self.report)
    }
}

/// Scores the saved model on the held-out split and writes the report.
pub fn run(model_path: &Path, processed_dir: &Path, report_path: &Path) -> Result<Evaluation> {
    let model = SentimentModel::load(model_path)?;
    let features = FeatureMatrix::load(processed_dir.join(X_TEST_FILE))?;
    let y_true = read_labels(processed_dir.join(Y_TEST_FILE))?;

    let y_pred = model.predict(&features)?;
    let evaluation = Evaluation {
        report: ClassificationReport::compute(&y_true, &y_pred)?,
        confusion: ConfusionMatrix::compute(&y_true, &y_pred)?,
    };

    if let Some(parent) = report_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| TalkSenseError::file(parent, e))?;
    }
    std::fs::write(report_path, evaluation.report_file_contents())
        .map_err(|e| TalkSenseError::file(report_path, e))?;

    tracing::info!(
        accuracy = evaluation.report.accuracy,
        rows = y_true.len(),
        path = ?report_path,
        "wrote evaluation report"
    );
    Ok(evaluation)
}
