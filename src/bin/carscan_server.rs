//! HTTP server binary for carscan.
//!
//! Resolves the inference provider once at startup, then serves the
//! `/analyze-report` upload endpoint until interrupted.

use std::net::SocketAddr;
use std::sync::Arc;

use carscan::{AnalysisConfig, OpenAiProvider};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_PORT: u16 = 8000;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "carscan=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Resolve credentials at startup so a missing key fails the boot, not the
    // first upload.
    let base = AnalysisConfig::default();
    let provider = OpenAiProvider::from_env(base.model.as_deref(), base.api_timeout_secs)?;
    let config = AnalysisConfig::builder().provider(Arc::new(provider)).build()?;
    tracing::info!("inference provider configured");

    let port = std::env::var("CARSCAN_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(DEFAULT_PORT);

    let app = carscan::server::router(config);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Starting carscan on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
