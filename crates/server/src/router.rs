//! # Router

use crate::handlers::{chat_handler, health_check, root};
use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

/// Creates the Axum router with all the application routes.
pub fn create_router(app_state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/chat", post(chat_handler))
        .with_state(app_state)
        .layer(TraceLayer::new_for_http())
}
