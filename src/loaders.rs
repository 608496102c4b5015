//! Hugging Face Hub downloads for transformer checkpoints and tokenizers.
//!
//! Files land in the standard hub cache, so only the first call for a
//! repository touches the network.

use std::path::{Path, PathBuf};

use anyhow::Context;
use candle_core::{DType, Device};
use candle_nn::VarBuilder;
use hf_hub::api::sync::Api as HfApi;
use hf_hub::{Repo, RepoType};
use tokenizers::Tokenizer;

#[derive(Debug, Clone)]
pub struct HfLoader {
    pub repo: String,
    pub filename: String,
}

impl HfLoader {
    pub fn new(repo: &str, filename: &str) -> Self {
        Self {
            repo: repo.into(),
            filename: filename.into(),
        }
    }

    pub fn load(&self) -> anyhow::Result<PathBuf> {
        let api = HfApi::new()?;
        let repo = api.repo(Repo::new(self.repo.clone(), RepoType::Model));
        repo.get(&self.filename)
            .with_context(|| format!("fetching {} from {}", self.filename, self.repo))
    }
}

#[derive(Debug, Clone)]
pub struct TokenizerLoader {
    pub tokenizer_file_loader: HfLoader,
}

impl TokenizerLoader {
    pub fn new(repo: &str) -> Self {
        Self {
            tokenizer_file_loader: HfLoader::new(repo, "tokenizer.json"),
        }
    }

    pub fn load(&self) -> anyhow::Result<Tokenizer> {
        let path = self.tokenizer_file_loader.load()?;
        Tokenizer::from_file(path).map_err(|e| anyhow::anyhow!("Failed to load tokenizer: {e}"))
    }
}

/// Raw `config.json` text plus a var builder over the checkpoint weights.
pub struct Checkpoint {
    pub config: String,
    pub vb: VarBuilder<'static>,
}

/// Downloads a safetensors (or, failing that, PyTorch) checkpoint.
pub fn load_checkpoint(repo: &str, device: &Device) -> anyhow::Result<Checkpoint> {
    let config_path = HfLoader::new(repo, "config.json").load()?;
    let config = std::fs::read_to_string(&config_path)
        .with_context(|| format!("reading model config {config_path:?}"))?;

    let weights = HfLoader::new(repo, "model.safetensors")
        .load()
        .or_else(|_| HfLoader::new(repo, "pytorch_model.bin").load())
        .with_context(|| {
            format!("no `model.safetensors` or `pytorch_model.bin` in {repo}")
        })?;

    let vb = weights_var_builder(&weights, device)?;
    Ok(Checkpoint { config, vb })
}

fn weights_var_builder(weights: &Path, device: &Device) -> anyhow::Result<VarBuilder<'static>> {
    let dtype = DType::F32;
    match weights.extension().and_then(|ext| ext.to_str()) {
        // SAFETY: the hub cache file is not modified while mapped.
        Some("safetensors") => Ok(unsafe {
            VarBuilder::from_mmaped_safetensors(&[weights], dtype, device)?
        }),
        Some("bin") => Ok(VarBuilder::from_pth(weights, dtype, device)?),
        _ => anyhow::bail!("Unsupported weight file format: {weights:?}"),
    }
}
