use serde::Serialize;

use super::labels::{EMOTION_LABELS, NEUTRAL_LABEL};
use crate::models::ZeroShotModernBertModel;
use crate::pipelines::zero_shot_classification_pipeline::{
    LabelScore, ZeroShotClassificationPipeline,
};

/// Anything that can rank candidate labels for a text.
///
/// The zero-shot pipeline is the real implementation; tests plug in stubs.
pub trait EmotionScorer: Send + Sync + 'static {
    fn score(&self, text: &str, labels: &[&str]) -> anyhow::Result<Vec<LabelScore>>;
}

impl EmotionScorer for ZeroShotClassificationPipeline<ZeroShotModernBertModel> {
    fn score(&self, text: &str, labels: &[&str]) -> anyhow::Result<Vec<LabelScore>> {
        self.classify(text, labels)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmotionAnalysis {
    pub label: String,
    /// Top score rounded to three decimals.
    pub confidence: f32,
    /// Every label, highest score first. Empty for blank input.
    pub ranking: Vec<LabelScore>,
}

impl EmotionAnalysis {
    pub fn neutral() -> Self {
        Self {
            label: NEUTRAL_LABEL.to_string(),
            confidence: 0.0,
            ranking: Vec::new(),
        }
    }

    /// Confidence as a percentage with one decimal, e.g. `84.7%`.
    pub fn confidence_percent(&self) -> String {
        format!("{:.1}%", self.confidence * 100.0)
    }

    pub fn top(&self, n: usize) -> &[LabelScore] {
        &self.ranking[..n.min(self.ranking.len())]
    }
}

/// Scores `text` against the full emotion roster.
pub fn analyze_emotion(scorer: &dyn EmotionScorer, text: &str) -> anyhow::Result<EmotionAnalysis> {
    if text.trim().is_empty() {
        return Ok(EmotionAnalysis::neutral());
    }

    let mut ranking = scorer.score(text, &EMOTION_LABELS)?;
    ranking.sort_by(|a, b| b.score.total_cmp(&a.score));

    let Some(best) = ranking.first() else {
        return Ok(EmotionAnalysis::neutral());
    };
    Ok(EmotionAnalysis {
        label: best.label.clone(),
        confidence: (best.score * 1000.0).round() / 1000.0,
        ranking,
    })
}
