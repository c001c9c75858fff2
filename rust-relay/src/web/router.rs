//! Router assembly.

use axum::{extract::DefaultBodyLimit, Router};
use tower_http::trace::TraceLayer;

use super::handlers::{handle, AppState};

/// Build the relay router. Every path and method lands on [`handle`].
pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.max_body_bytes;

    Router::new()
        .fallback(handle)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
