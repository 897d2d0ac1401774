mod analysis;
mod config;
mod errors;
mod feedback;
mod history;
mod llm_client;
mod models;
mod pdf;
mod routes;
mod session;
mod state;
mod storage;
#[cfg(test)]
mod test_support;

use anyhow::Result;
use axum::extract::DefaultBodyLimit;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::analysis::pipeline::{AnalysisGate, AnalysisPipeline};
use crate::analysis::scorer::{AtsScorer, LlmAtsScorer};
use crate::config::Config;
use crate::llm_client::LlmClient;
use crate::pdf::PopplerPdfConverter;
use crate::routes::build_router;
use crate::state::AppState;
use crate::storage::assets::AssetStore;
use crate::storage::cache::AnalysisCache;
use crate::storage::{connect_asset_fs, connect_kv};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails fast on malformed env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Resume Analyzer API v{}", env!("CARGO_PKG_VERSION"));

    // Local cache: Redis, file directory or in-process memory
    let kv = connect_kv(&config).await?;
    let cache = Arc::new(AnalysisCache::new(kv));
    info!("Local cache backend: {}", cache.backend_name());

    // Remote assets: S3 / MinIO, local directory or unavailable
    let assets = Arc::new(AssetStore::new(
        connect_asset_fs(&config).await,
        config.asset_namespace.clone(),
    ));
    match assets.backend_name() {
        Some(name) => info!("Remote asset backend: {name} ({})", config.asset_namespace),
        None => warn!("No remote asset backend configured; analyses stay in the local cache"),
    }

    // AI scorer (optional: uploads fail with 503 without it)
    let scorer: Option<Arc<dyn AtsScorer>> = match config.anthropic_api_key.clone() {
        Some(key) => {
            let llm = LlmClient::new(key)?;
            info!("LLM client initialized (model: {})", llm_client::MODEL);
            Some(Arc::new(LlmAtsScorer::new(llm)))
        }
        None => {
            warn!("ANTHROPIC_API_KEY not set; AI analysis is unavailable");
            None
        }
    };

    let converter = Arc::new(PopplerPdfConverter::new(config.pdftoppm_path.clone()));
    let pipeline = Arc::new(AnalysisPipeline::new(
        converter,
        scorer,
        assets.clone(),
        cache.clone(),
    ));

    // Build app state
    let state = AppState {
        cache,
        assets,
        pipeline,
        gate: Arc::new(AnalysisGate::new()),
    };

    // Build router
    let app = build_router(state)
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the web client has a fixed host

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
