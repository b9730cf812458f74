//! HTTP route handlers.

pub mod content;
pub mod health;

use axum::Router;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the application router with every route and the trace layer.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(health::router())
        .merge(content::router())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
