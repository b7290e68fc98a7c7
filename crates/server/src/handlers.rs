//! # Request Handlers

use crate::errors::AppError;
use crate::state::AppState;
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

/// The root handler.
pub async fn root() -> &'static str {
    "shelfkeep server is running."
}

/// The health check handler.
pub async fn health_check() -> &'static str {
    "OK"
}

/// The request body for the `/chat` endpoint.
#[derive(Deserialize)]
pub struct ChatRequestBody {
    /// Omitted on the first message; the server mints one.
    pub session_id: Option<String>,
    /// Optional user identity to pin into the session before the turn.
    pub user_id: Option<String>,
    pub message: String,
}

/// The response body for the `/chat` endpoint.
#[derive(Serialize)]
pub struct ChatResponseBody {
    pub session_id: String,
    pub reply: String,
}

/// The handler for the `/chat` endpoint.
///
/// One logical request at a time per session: the master agent runs the
/// whole interaction before the reply is returned and the session archived.
pub async fn chat_handler(
    State(app_state): State<AppState>,
    Json(payload): Json<ChatRequestBody>,
) -> Result<Json<ChatResponseBody>, AppError> {
    let session_id = payload
        .session_id
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    info!(%session_id, "Received chat message");

    let session = app_state.session(&session_id);
    if let Some(user_id) = payload.user_id.as_deref().filter(|id| !id.is_empty()) {
        session.set_user_id(user_id);
    }

    let reply = app_state
        .orchestrator
        .handle(&session, &payload.message)
        .await?;

    Ok(Json(ChatResponseBody { session_id, reply }))
}
