use std::sync::Arc;

use crate::analysis::pipeline::{AnalysisGate, AnalysisPipeline};
use crate::storage::assets::AssetStore;
use crate::storage::cache::AnalysisCache;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub cache: Arc<AnalysisCache>,
    /// Remote asset store. Operates as "unavailable" when no backend is configured.
    pub assets: Arc<AssetStore>,
    pub pipeline: Arc<AnalysisPipeline>,
    /// One analysis at a time; see `AnalysisGate`.
    pub gate: Arc<AnalysisGate>,
}
