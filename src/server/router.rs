//! 路由表

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use super::handlers::{analyze, get_summary, get_table, root};
use super::state::{AppState, SharedState};

/// 构建完整的路由
pub fn build_router(state: AppState) -> Router {
    let shared: SharedState = Arc::new(state);

    Router::new()
        .route("/", get(root))
        .route("/analyze", post(analyze))
        .route("/summary/{paper_id}", get(get_summary))
        .route("/table/{paper_id}", get(get_table))
        .layer(TraceLayer::new_for_http())
        .with_state(shared)
}
