use talksense::pipelines::embedding_pipeline::*;

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    dot / (norm_a * norm_b)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let pipeline = EmbeddingPipelineBuilder::modernbert(ModernBertSize::Base)
        .build()
        .await?;

    let anchor = pipeline.embed("this game is amazing, best purchase ever")?;
    let candidates = [
        "absolutely loving this game",
        "worst update they have ever shipped",
        "the servers are down again",
    ];

    println!("Embedding dimension: {}", pipeline.dimension());
    for text in candidates {
        let emb = pipeline.embed(text)?;
        println!("{:.4}  {text}", cosine(&anchor, &emb));
    }

    Ok(())
}
