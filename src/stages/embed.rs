use std::path::Path;

use anyhow::Context;
use candle_core::{Device, Tensor};

use crate::dataset::{write_labels, Table};
use crate::pipelines::embedding_pipeline::{EmbeddingModel, EmbeddingPipeline};

use super::{labelled_texts, EMBEDDINGS_FILE, EMBEDDING_LABELS_FILE};

/// Embeds every non-blank cleaned text and writes an `[n, hidden]` float32
/// `.npy` matrix plus the matching label file. Returns the row count.
pub fn run<M: EmbeddingModel>(
    pipeline: &EmbeddingPipeline<M>,
    cleaned: &Path,
    processed_dir: &Path,
    label_column: &str,
) -> anyhow::Result<usize> {
    let table = Table::read_csv_with_header(cleaned)?;
    let (texts, labels) = labelled_texts(&table, label_column)?;

    tracing::info!(rows = texts.len(), dim = pipeline.dimension(), "generating embeddings");
    let embeddings = pipeline.embed_all(&texts)?;

    let rows = embeddings.len();
    let flat: Vec<f32> = embeddings.into_iter().flatten().collect();
    let matrix = Tensor::from_vec(flat, (rows, pipeline.dimension()), &Device::Cpu)?;

    std::fs::create_dir_all(processed_dir)
        .with_context(|| format!("creating {}", processed_dir.display()))?;
    let npy_path = processed_dir.join(EMBEDDINGS_FILE);
    matrix
        .write_npy(&npy_path)
        .with_context(|| format!("writing {}", npy_path.display()))?;
    write_labels(processed_dir.join(EMBEDDING_LABELS_FILE), label_column, &labels)?;

    tracing::info!(path = ?npy_path, rows, "wrote embeddings");
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::read_labels;
    use tokenizers::models::wordlevel::WordLevel;
    use tokenizers::Tokenizer;

    /// Encodes a text as `[chars, words, 1.0]` without touching the tokenizer.
    struct CountingEncoder {
        device: Device,
    }

    impl EmbeddingModel for CountingEncoder {
        type Options = ();

        fn new(_options: (), device: Device) -> anyhow::Result<Self> {
            Ok(Self { device })
        }

        fn embed(&self, _tokenizer: &Tokenizer, text: &str) -> anyhow::Result<Vec<f32>> {
            let chars = text.chars().count() as f32;
            let words = text.split_whitespace().count() as f32;
            Ok(vec![chars, words, 1.0])
        }

        fn dimension(&self) -> usize {
            3
        }

        fn get_tokenizer(_options: ()) -> anyhow::Result<Tokenizer> {
            Ok(Tokenizer::new(WordLevel::default()))
        }

        fn device(&self) -> &Device {
            &self.device
        }
    }

    fn pipeline() -> EmbeddingPipeline<CountingEncoder> {
        EmbeddingPipeline {
            model: CountingEncoder::new((), Device::Cpu).unwrap(),
            tokenizer: CountingEncoder::get_tokenizer(()).unwrap(),
        }
    }

    #[test]
    fn writes_matrix_and_labels_for_non_blank_rows() {
        let dir = tempfile::tempdir().unwrap();
        let cleaned = dir.path().join("cleaned.csv");
        std::fs::write(
            &cleaned,
            "sentiment,text,clean_text\n\
             Positive,Love it!,love\n\
             Neutral,is it the,\n\
             Negative,Servers are down,servers down\n",
        )
        .unwrap();
        let processed = dir.path().join("processed");

        let rows = run(&pipeline(), &cleaned, &processed, "sentiment").unwrap();
        assert_eq!(rows, 2);

        let matrix = Tensor::read_npy(processed.join(EMBEDDINGS_FILE)).unwrap();
        assert_eq!(matrix.dims(), [2, 3]);
        assert_eq!(matrix.dtype(), candle_core::DType::F32);
        let values = matrix.to_vec2::<f32>().unwrap();
        assert_eq!(values, [[4.0, 1.0, 1.0], [12.0, 2.0, 1.0]]);

        let labels = read_labels(processed.join(EMBEDDING_LABELS_FILE)).unwrap();
        assert_eq!(labels, ["Positive", "Negative"]);
    }

    #[test]
    fn all_blank_input_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let cleaned = dir.path().join("cleaned.csv");
        std::fs::write(&cleaned, "sentiment,clean_text\nNeutral,\nNeutral,   \n").unwrap();

        assert!(run(&pipeline(), &cleaned, dir.path(), "sentiment").is_err());
        assert!(!dir.path().join(EMBEDDINGS_FILE).exists());
    }
}
