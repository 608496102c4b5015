use anyhow::Result;
use talksense::demo::{analyze_emotion, EmotionScorer};
use talksense::pipelines::zero_shot_classification_pipeline::*;

#[tokio::main]
async fn main() -> Result<()> {
    println!("Building zero-shot classification pipeline...");

    let pipeline = ZeroShotClassificationPipelineBuilder::modernbert(ModernBertSize::Base)
        .build()
        .await?;

    println!("Pipeline built successfully.");

    let premise = "Apple just announced the new iPhone 15 with USB-C.";
    let candidate_labels = ["technology", "business", "politics", "sports"];

    println!("\nClassifying premise: '{premise}'");
    for result in pipeline.classify(premise, &candidate_labels)? {
        println!("  - {}: {:.4}", result.label, result.score);
    }

    // The same pipeline drives the emotion demos.
    let scorer: &dyn EmotionScorer = &pipeline;
    let analysis = analyze_emotion(scorer, "Finally finished my exams, I can breathe again!")?;
    println!(
        "\nEmotion: {} ({} confidence)",
        analysis.label,
        analysis.confidence_percent()
    );
    for row in analysis.top(3) {
        println!("  - {}: {:.3}", row.label, row.score);
    }

    Ok(())
}
