use axum::{extract::DefaultBodyLimit, routing::post, Router};

use super::handlers::{analyze_stream, analyze_sync, AnalysisState};

/// Headroom on top of the per-file limit for multipart framing and extra parts
const MULTIPART_OVERHEAD: usize = 1024 * 1024;

/// Create routes for the analysis feature
pub fn routes(state: AnalysisState) -> Router {
    let body_limit = DefaultBodyLimit::max(state.max_upload_size.saturating_add(MULTIPART_OVERHEAD));

    Router::new()
        .route("/api/projects/analyze", post(analyze_stream))
        .route("/api/projects/analyze/sync", post(analyze_sync))
        .layer(body_limit)
        .with_state(state)
}
