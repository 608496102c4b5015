//! HTML rendering for the demo pages.

use minijinja::{context, Environment};
use serde::Serialize;

use super::emotion::EmotionAnalysis;
use super::labels::emoji_for;
use super::session::Session;
use crate::error::Result;
use crate::pipelines::zero_shot_classification_pipeline::LabelScore;

pub const ZERO_SHOT_TITLE: &str = "🧠 AI Mental Health Sentiment Analyzer";
pub const STYLED_TITLE: &str = "🧠 AI Mental Health Sentiment Analyzer ✨";
pub const LOCAL_TITLE: &str = "Sentiment Predictor";

#[derive(Debug, Serialize)]
struct RankedRow<'a> {
    label: &'a str,
    percent: String,
    emoji: Option<&'static str>,
}

#[derive(Debug, Serialize)]
struct AnalysisView<'a> {
    label: &'a str,
    confidence_percent: String,
    emoji: Option<&'static str>,
    ranking: Vec<RankedRow<'a>>,
    top3: Vec<RankedRow<'a>>,
}

impl<'a> AnalysisView<'a> {
    fn new(analysis: &'a EmotionAnalysis) -> Self {
        Self {
            label: &analysis.label,
            confidence_percent: analysis.confidence_percent(),
            emoji: emoji_for(&analysis.label),
            ranking: ranked_rows(&analysis.ranking),
            top3: ranked_rows(analysis.top(3)),
        }
    }
}

fn ranked_rows(scores: &[LabelScore]) -> Vec<RankedRow<'_>> {
    scores
        .iter()
        .map(|s| RankedRow {
            label: &s.label,
            percent: percent(s.score),
            emoji: emoji_for(&s.label),
        })
        .collect()
}

#[derive(Debug, Serialize)]
struct HistoryRow<'a> {
    text: &'a str,
    label: &'a str,
    percent: String,
}

fn percent(score: f32) -> String {
    format!("{:.1}", score * 100.0)
}

/// Compiled page templates.
pub struct Views {
    env: Environment<'static>,
}

impl Views {
    pub fn new() -> Result<Self> {
        let mut env = Environment::new();
        env.add_template("base.html", include_str!("templates/base.html"))?;
        env.add_template("zero_shot.html", include_str!("templates/zero_shot.html"))?;
        env.add_template("styled.html", include_str!("templates/styled.html"))?;
        env.add_template("local.html", include_str!("templates/local.html"))?;
        Ok(Self { env })
    }

    pub fn zero_shot(&self, text: &str, analysis: Option<&EmotionAnalysis>) -> Result<String> {
        let analysis = analysis.map(AnalysisView::new);
        Ok(self.env.get_template("zero_shot.html")?.render(context! {
            title => ZERO_SHOT_TITLE,
            text,
            analysis,
        })?)
    }

    pub fn styled(
        &self,
        text: &str,
        analysis: Option<&EmotionAnalysis>,
        session: &Session,
    ) -> Result<String> {
        let analysis = analysis.map(AnalysisView::new);
        let history: Vec<_> = session
            .history()
            .map(|entry| HistoryRow {
                text: &entry.text,
                label: &entry.label,
                percent: percent(entry.confidence),
            })
            .collect();
        Ok(self.env.get_template("styled.html")?.render(context! {
            title => STYLED_TITLE,
            text,
            analysis,
            history,
            options => session.options,
        })?)
    }

    pub fn local(&self, text: &str, label: Option<&str>) -> Result<String> {
        Ok(self.env.get_template("local.html")?.render(context! {
            title => LOCAL_TITLE,
            text,
            label,
        })?)
    }
}
