//! Preprocess, featurize, train and evaluate on a tiny synthetic dataset.

use std::fmt::Write as _;

use talksense::classifier::TrainConfig;
use talksense::core::config::FeatureSettings;
use talksense::stages::{self, CLEAN_TEXT_COLUMN, VECTORIZER_FILE, X_TEST_FILE, X_TRAIN_FILE};
use talksense::{SentimentModel, TalkSenseError};

const POSITIVE: [&str; 4] = ["love", "great", "awesome", "amazing"];
const NEGATIVE: [&str; 4] = ["hate", "awful", "terrible", "broken"];
const TOPICS: [&str; 5] = ["game", "update", "servers", "graphics", "story"];

/// Headerless four-column tweets: 20 positive, 20 negative and one row that
/// cleans to nothing.
fn raw_csv() -> String {
    let mut csv = String::new();
    for i in 0..40 {
        let (label, words) = if i % 2 == 0 {
            ("Positive", POSITIVE)
        } else {
            ("Negative", NEGATIVE)
        };
        let topic = TOPICS[i % TOPICS.len()];
        writeln!(
            csv,
            "{},Borderlands,{label},\"I {} the new {topic}!! {} https://t.co/{i}\"",
            1000 + i,
            words[i % 4].to_uppercase(),
            words[(i / 4) % 4],
        )
        .unwrap();
    }
    writeln!(csv, "2000,Borderlands,Neutral,\"is it the\"").unwrap();
    csv
}

#[test]
fn stages_run_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let raw = dir.path().join("raw.csv");
    let cleaned = dir.path().join("processed").join("cleaned_data.csv");
    let processed = dir.path().join("processed");
    let model_path = dir.path().join("models").join("sentiment_model.json");
    let report_path = dir.path().join("reports").join("metrics_report.md");
    std::fs::write(&raw, raw_csv()).unwrap();

    let summary = stages::preprocess::run(&raw, &cleaned).unwrap();
    assert_eq!(summary.rows, 41);
    assert_eq!(summary.text_column, "text");
    let table = talksense::dataset::Table::read_csv(&cleaned).unwrap();
    assert_eq!(table.column(CLEAN_TEXT_COLUMN).unwrap()[40], "");

    let features =
        stages::featurize::run(&cleaned, &processed, &FeatureSettings::default()).unwrap();
    // The all-stopword row is dropped before splitting.
    assert_eq!(features.test_rows, 8);
    assert_eq!(features.train_rows, 32);
    for file in [X_TRAIN_FILE, X_TEST_FILE, VECTORIZER_FILE] {
        assert!(processed.join(file).exists(), "{file} missing");
    }

    let config = TrainConfig {
        max_iter: 300,
        ..TrainConfig::default()
    };
    let model = stages::train::run(&processed, &model_path, &config).unwrap();
    assert_eq!(model.classes(), ["Negative", "Positive"]);

    let evaluation = stages::evaluate::run(&model_path, &processed, &report_path).unwrap();
    assert_eq!(evaluation.report.total_support, 8);
    assert!(evaluation.report.accuracy >= 0.75, "{}", evaluation.report);

    let report = std::fs::read_to_string(&report_path).unwrap();
    assert!(report.starts_with("Classification Report:\n"));
    assert!(report.contains("weighted avg"));

    let loaded = SentimentModel::load(&model_path).unwrap();
    let label = loaded.predict_text("What an AMAZING game, love it");
    assert_eq!(label, "Positive");
    assert!(loaded.classes().iter().any(|c| c == label));
}

#[test]
fn training_on_foreign_features_fails() {
    let dir = tempfile::tempdir().unwrap();
    let raw = dir.path().join("raw.csv");
    let cleaned = dir.path().join("cleaned.csv");
    std::fs::write(&raw, raw_csv()).unwrap();
    stages::preprocess::run(&raw, &cleaned).unwrap();
    stages::featurize::run(&cleaned, dir.path(), &FeatureSettings::default()).unwrap();

    // Replace the vectorizer with one fitted on different text.
    let other =
        talksense::features::TfidfVectorizer::fit(&["another corpus entirely"], 10).unwrap();
    other.save(dir.path().join(VECTORIZER_FILE)).unwrap();

    let model_path = dir.path().join("model.json");
    let err = stages::train::run(dir.path(), &model_path, &TrainConfig::default()).unwrap_err();
    assert!(matches!(err, TalkSenseError::FingerprintMismatch { .. }));
}

#[test]
fn missing_label_column_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let cleaned = dir.path().join("cleaned.csv");
    std::fs::write(&cleaned, "body,clean_text\nhello there,hello\n").unwrap();
    let settings = FeatureSettings::default();
    let err = stages::featurize::run(&cleaned, dir.path(), &settings).unwrap_err();
    assert!(matches!(err, TalkSenseError::MissingColumn(ref name) if name == "sentiment"));
}

#[test]
fn ragged_rows_survive_preprocess_and_featurize() {
    let dir = tempfile::tempdir().unwrap();
    let raw = dir.path().join("raw.csv");
    let cleaned = dir.path().join("cleaned.csv");

    let mut csv = String::from("id,sentiment,text\n");
    for i in 0..40 {
        let (label, words) = if i % 2 == 0 {
            ("Positive", POSITIVE)
        } else {
            ("Negative", NEGATIVE)
        };
        writeln!(csv, "{i},{label},{} the {}", words[i % 4], TOPICS[i % 5]).unwrap();
    }
    // One row carries a stray trailing field.
    writeln!(csv, "99,Positive,love this game,extra").unwrap();
    std::fs::write(&raw, csv).unwrap();

    let summary = stages::preprocess::run(&raw, &cleaned).unwrap();
    assert_eq!(summary.rows, 41);
    let table = talksense::dataset::Table::read_csv_with_header(&cleaned).unwrap();
    assert_eq!(
        table.columns(),
        ["id", "sentiment", "text", "Unnamed_3", CLEAN_TEXT_COLUMN]
    );

    let settings = FeatureSettings::default();
    let features = stages::featurize::run(&cleaned, dir.path(), &settings).unwrap();
    assert_eq!(features.train_rows + features.test_rows, 41);
    assert!(dir.path().join(VECTORIZER_FILE).exists());
}
