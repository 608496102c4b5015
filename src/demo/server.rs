use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use tokio::signal;
use tracing::info;

use super::emotion::EmotionScorer;
use crate::models::ModernBertSize;
use crate::pipelines::zero_shot_classification_pipeline::ZeroShotClassificationPipelineBuilder;

/// Loads the zero-shot emotion model once; later calls hit the model cache.
pub async fn load_emotion_scorer(size: ModernBertSize) -> anyhow::Result<Arc<dyn EmotionScorer>> {
    info!(model = %size, "⚡ Loading AI model, please wait...");
    let pipeline = ZeroShotClassificationPipelineBuilder::modernbert(size)
        .build()
        .await?;
    info!(device = ?pipeline.device().location(), "model ready");
    Ok(Arc::new(pipeline))
}

/// Serves `app` on `bind` until Ctrl+C or SIGTERM.
pub async fn serve(app: Router, bind: SocketAddr) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("binding {bind}"))?;
    info!("Demo listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received SIGINT, shutting down"),
        () = terminate => info!("Received SIGTERM, shutting down"),
    }
}
