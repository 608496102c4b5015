//! `talksense` command-line entry point.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;

use talksense::core::{init_tracing, Settings};
use talksense::demo::{
    self, local_router, styled_router, zero_shot_router, LocalState, SessionStore, StyledState,
    Views, ZeroShotState,
};
use talksense::models::ModernBertSize;
use talksense::pipelines::embedding_pipeline::EmbeddingPipelineBuilder;
use talksense::pipelines::utils::DeviceSelectable;
use talksense::stages::{self, EMBEDDINGS_FILE, VECTORIZER_FILE};
use talksense::SentimentModel;

#[derive(Parser)]
#[command(name = "talksense")]
#[command(about = "Tweet sentiment pipeline and web demos", long_about = None)]
struct Cli {
    /// TOML settings file; every key is optional
    #[arg(long, global = true, env = "TALKSENSE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Clean the raw tweet CSV and add a `clean_text` column
    Preprocess {
        #[arg(long)]
        input: Option<PathBuf>,
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Fit the TF-IDF vectorizer and write the train/test split
    Featurize {
        #[arg(long)]
        input: Option<PathBuf>,
        #[arg(long)]
        output_dir: Option<PathBuf>,
        #[arg(long)]
        max_features: Option<usize>,
    },

    /// Write ModernBERT first-token embeddings for every cleaned tweet
    Embed {
        #[arg(long)]
        input: Option<PathBuf>,
        #[arg(long)]
        output_dir: Option<PathBuf>,
        #[arg(long, value_enum)]
        size: Option<ModernBertSize>,
        /// Run on the CPU even when CUDA is available
        #[arg(long)]
        cpu: bool,
    },

    /// Train the logistic-regression classifier
    Train {
        #[arg(long)]
        processed_dir: Option<PathBuf>,
        #[arg(long)]
        model: Option<PathBuf>,
        #[arg(long)]
        max_iter: Option<usize>,
    },

    /// Score the trained model on the held-out split
    Evaluate {
        #[arg(long)]
        processed_dir: Option<PathBuf>,
        #[arg(long)]
        model: Option<PathBuf>,
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Serve one of the web demos
    Serve {
        #[arg(value_enum)]
        demo: DemoKind,
        #[arg(long)]
        bind: Option<SocketAddr>,
        /// Zero-shot model size
        #[arg(long, value_enum)]
        size: Option<ModernBertSize>,
        /// Trained model artifact for the local demo
        #[arg(long)]
        model: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum DemoKind {
    ZeroShot,
    Styled,
    Local,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let settings = Settings::load(cli.config.as_deref()).context("loading settings")?;

    match cli.command {
        Commands::Preprocess { input, output } => {
            let input = input.unwrap_or(settings.paths.raw_data);
            let output = output.unwrap_or(settings.paths.cleaned_data);
            let summary = stages::preprocess::run(&input, &output)
                .with_context(|| format!("preprocessing {}", input.display()))?;
            info!(
                rows = summary.rows,
                text_column = %summary.text_column,
                "Preprocessing complete. Saved to {}",
                output.display()
            );
        }

        Commands::Featurize {
            input,
            output_dir,
            max_features,
        } => {
            let input = input.unwrap_or(settings.paths.cleaned_data);
            let output_dir = output_dir.unwrap_or(settings.paths.processed_dir);
            let mut features = settings.features;
            if let Some(max_features) = max_features {
                features.max_features = max_features;
            }
            let summary = stages::featurize::run(&input, &output_dir, &features)
                .with_context(|| format!("building features from {}", input.display()))?;
            info!(
                train_rows = summary.train_rows,
                test_rows = summary.test_rows,
                vocabulary = summary.vocabulary,
                "TF-IDF features saved, vectorizer at {}",
                output_dir.join(VECTORIZER_FILE).display()
            );
        }

        Commands::Embed {
            input,
            output_dir,
            size,
            cpu,
        } => {
            let input = input.unwrap_or(settings.paths.cleaned_data);
            let output_dir = output_dir.unwrap_or(settings.paths.processed_dir);
            let size = size.unwrap_or(settings.embedding.size);

            let mut builder = EmbeddingPipelineBuilder::modernbert(size)
                .max_length(settings.embedding.max_length);
            if cpu {
                builder = builder.cpu();
            }
            let pipeline = builder.build().await?;
            let rows = stages::embed::run(
                &pipeline,
                &input,
                &output_dir,
                &settings.features.label_column,
            )?;
            info!(
                rows,
                "Embeddings saved to {}",
                output_dir.join(EMBEDDINGS_FILE).display()
            );
        }

        Commands::Train {
            processed_dir,
            model,
            max_iter,
        } => {
            let processed_dir = processed_dir.unwrap_or(settings.paths.processed_dir);
            let model_path = model.unwrap_or(settings.paths.model);
            let mut config = settings.training.train_config();
            if let Some(max_iter) = max_iter {
                config.max_iter = max_iter;
            }
            let model = stages::train::run(&processed_dir, &model_path, &config)
                .context("training classifier")?;
            info!(
                classes = ?model.classes(),
                epochs = model.classifier().epochs(),
                "Model trained and saved to {}",
                model_path.display()
            );
        }

        Commands::Evaluate {
            processed_dir,
            model,
            report,
        } => {
            let processed_dir = processed_dir.unwrap_or(settings.paths.processed_dir);
            let model_path = model.unwrap_or(settings.paths.model);
            let report_path = report.unwrap_or(settings.paths.report);
            let evaluation = stages::evaluate::run(&model_path, &processed_dir, &report_path)
                .context("evaluating model")?;
            println!("{}", evaluation.report_file_contents());
            println!("Confusion Matrix:\n{}", evaluation.confusion);
            info!("Report saved to {}", report_path.display());
        }

        Commands::Serve {
            demo: kind,
            bind,
            size,
            model,
        } => {
            let bind = bind.unwrap_or(settings.server.bind);
            let views = Arc::new(Views::new()?);
            let app = match kind {
                DemoKind::ZeroShot => {
                    let size = size.unwrap_or(settings.zero_shot.size);
                    let scorer = demo::load_emotion_scorer(size).await?;
                    zero_shot_router(ZeroShotState { scorer, views })
                }
                DemoKind::Styled => {
                    let size = size.unwrap_or(settings.zero_shot.size);
                    let scorer = demo::load_emotion_scorer(size).await?;
                    let sessions = SessionStore::with_capacity(settings.server.max_sessions);
                    styled_router(StyledState {
                        scorer,
                        views,
                        sessions: Arc::new(sessions),
                    })
                }
                DemoKind::Local => {
                    let model_path = model.unwrap_or(settings.paths.model);
                    let model = SentimentModel::load(&model_path).with_context(|| {
                        format!(
                            "loading {}; run `talksense train` first",
                            model_path.display()
                        )
                    })?;
                    local_router(LocalState {
                        model: Arc::new(model),
                        views,
                    })
                }
            };
            demo::serve(app, bind).await?;
        }
    }

    Ok(())
}
