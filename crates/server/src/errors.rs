use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use shelfkeep::AgentError;
use tracing::error;

/// A custom error type for the server application.
///
/// This enum encapsulates different kinds of errors that can occur within the
/// server, allowing them to be converted into appropriate HTTP responses.
pub enum AppError {
    /// Errors originating from the agent layer.
    Agent(AgentError),
    /// Generic internal server errors.
    Internal(anyhow::Error),
}

impl From<AgentError> for AppError {
    fn from(err: AgentError) -> Self {
        AppError::Agent(err)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status_code, error_message) = match self {
            AppError::Agent(err) => {
                // Log the original error for debugging purposes.
                error!("AgentError: {:?}", err);
                match err {
                    AgentError::ModelRequest(e) => (
                        StatusCode::BAD_GATEWAY,
                        format!("Request to the model provider failed: {e}"),
                    ),
                    AgentError::ModelDeserialization(e) => (
                        StatusCode::BAD_GATEWAY,
                        format!("Failed to deserialize model response: {e}"),
                    ),
                    AgentError::ModelApi { status, message } => (
                        StatusCode::BAD_GATEWAY,
                        format!("Model provider error (status {status}): {message}"),
                    ),
                    AgentError::RetriesExhausted {
                        attempts, status, ..
                    } => (
                        StatusCode::BAD_GATEWAY,
                        format!("Model call failed after {attempts} attempts (last status {status})."),
                    ),
                    AgentError::EmptyModelResponse => (
                        StatusCode::BAD_GATEWAY,
                        "The model returned an empty response.".to_string(),
                    ),
                    AgentError::StepLimitExceeded { agent, .. } => (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        format!("The '{agent}' agent did not converge on an answer."),
                    ),
                    AgentError::MissingProvider | AgentError::MissingField(_) => (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "Server is not configured correctly.".to_string(),
                    ),
                    AgentError::ReqwestClientBuild(e) => (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        format!("Failed to build HTTP client: {e}"),
                    ),
                    AgentError::Json(e) => (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        format!("Failed to serialize payload: {e}"),
                    ),
                }
            }
            AppError::Internal(err) => {
                error!("Internal server error: {:?}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal server error occurred.".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status_code, body).into_response()
    }
}
