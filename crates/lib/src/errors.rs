use thiserror::Error;

/// Errors surfaced by agents and chat providers.
///
/// Tool-level failures are deliberately *not* represented here: tools return
/// [`crate::tools::ToolOutcome`] values so the model can observe and relay
/// them. `AgentError` covers the terminal failures the orchestration layer
/// itself must report to its caller.
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Failed to build HTTP client: {0}")]
    ReqwestClientBuild(reqwest::Error),
    #[error("Request to the model provider failed: {0}")]
    ModelRequest(reqwest::Error),
    #[error("Failed to deserialize model response: {0}")]
    ModelDeserialization(reqwest::Error),
    #[error("Model provider returned an error (status {status}): {message}")]
    ModelApi { status: u16, message: String },
    #[error("Model call failed after {attempts} attempts (last status {status}): {message}")]
    RetriesExhausted {
        attempts: u32,
        status: u16,
        message: String,
    },
    #[error("Model returned neither text nor a tool call")]
    EmptyModelResponse,
    #[error("Agent '{agent}' exceeded its budget of {limit} tool-calling rounds")]
    StepLimitExceeded { agent: String, limit: usize },
    #[error("Agent is missing a chat provider")]
    MissingProvider,
    #[error("Agent is missing required field '{0}'")]
    MissingField(&'static str),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
