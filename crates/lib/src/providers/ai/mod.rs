//! # Chat Providers
//!
//! The provider-neutral chat model used by the agent loop, plus the concrete
//! backends. A provider receives the full message history together with the
//! tool declarations and returns a [`ModelTurn`]: free text, tool-call
//! requests, or both. Each backend module owns its wire structs.

pub mod gemini;
pub mod local;

use crate::errors::AgentError;
use crate::store::FieldMap;
use async_trait::async_trait;
use dyn_clone::DynClone;
use serde_json::Value;
use std::fmt::Debug;

/// A tool invocation requested by the model.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCall {
    /// Provider-assigned call identifier, when the wire format carries one.
    pub id: Option<String>,
    pub name: String,
    pub args: FieldMap,
}

/// The result of a tool invocation, echoed back to the model.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolResponse {
    pub id: Option<String>,
    pub name: String,
    pub response: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MessagePart {
    Text(String),
    Call(ToolCall),
    Response(ToolResponse),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    User,
    Model,
}

/// One entry of the conversation history sent to a provider.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub parts: Vec<MessagePart>,
}

impl ChatMessage {
    pub fn user_text(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            parts: vec![MessagePart::Text(text.into())],
        }
    }

    /// Replays a model turn into the history.
    pub fn from_model_turn(turn: &ModelTurn) -> Self {
        let mut parts = Vec::new();
        if let Some(text) = &turn.text {
            parts.push(MessagePart::Text(text.clone()));
        }
        parts.extend(turn.tool_calls.iter().cloned().map(MessagePart::Call));
        Self {
            role: ChatRole::Model,
            parts,
        }
    }

    /// Wraps a batch of tool results as the next user-side message.
    pub fn tool_responses(responses: Vec<ToolResponse>) -> Self {
        Self {
            role: ChatRole::User,
            parts: responses.into_iter().map(MessagePart::Response).collect(),
        }
    }
}

/// A callable-function declaration advertised to the model.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolDeclaration {
    pub name: String,
    pub description: String,
    /// JSON-schema object describing the accepted arguments.
    pub parameters: Value,
}

/// One request to a chat provider.
#[derive(Debug, Clone, Default)]
pub struct ChatRequest {
    pub system_instruction: Option<String>,
    pub messages: Vec<ChatMessage>,
    pub tools: Vec<ToolDeclaration>,
    /// Enables the provider-native web-search tool, where one exists.
    pub enable_search: bool,
}

/// What the model answered with: text, tool calls, or both.
#[derive(Debug, Clone, Default)]
pub struct ModelTurn {
    pub text: Option<String>,
    pub tool_calls: Vec<ToolCall>,
}

impl ModelTurn {
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            tool_calls: Vec::new(),
        }
    }

    pub fn from_tool_call(name: impl Into<String>, args: FieldMap) -> Self {
        Self {
            text: None,
            tool_calls: vec![ToolCall {
                id: None,
                name: name.into(),
                args,
            }],
        }
    }
}

/// A trait for interacting with a chat-capable AI provider.
#[async_trait]
pub trait ChatProvider: Send + Sync + Debug + DynClone {
    /// Sends one request and returns the model's turn.
    async fn chat(&self, request: &ChatRequest) -> Result<ModelTurn, AgentError>;
}

dyn_clone::clone_trait_object!(ChatProvider);

/// The transport retry policy applied uniformly to model calls.
///
/// Transport resilience only, never business logic: a fixed attempt count
/// with exponential backoff, retried on a fixed set of HTTP statuses.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the first.
    pub attempts: u32,
    /// Initial delay in seconds before the first retry.
    pub initial_delay: f64,
    /// Multiplier applied per attempt.
    pub exp_base: f64,
    /// HTTP statuses worth retrying.
    pub retry_on: Vec<u16>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 5,
            initial_delay: 1.0,
            exp_base: 7.0,
            retry_on: vec![429, 500, 503, 504],
        }
    }
}

impl RetryPolicy {
    pub fn is_retryable(&self, status: u16) -> bool {
        self.retry_on.contains(&status)
    }

    /// The backoff delay after the given zero-based retry index.
    pub fn delay(&self, retry_index: u32) -> std::time::Duration {
        let seconds = self.initial_delay * self.exp_base.powi(retry_index as i32);
        std::time::Duration::from_secs_f64(seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retry_policy_defaults_match_the_transport_contract() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.attempts, 5);
        assert_eq!(policy.exp_base, 7.0);
        assert_eq!(policy.initial_delay, 1.0);
        for status in [429, 500, 503, 504] {
            assert!(policy.is_retryable(status));
        }
        assert!(!policy.is_retryable(404));
        assert!(!policy.is_retryable(400));
    }

    #[test]
    fn backoff_grows_exponentially() {
        let policy = RetryPolicy {
            attempts: 3,
            initial_delay: 1.0,
            exp_base: 7.0,
            retry_on: vec![429],
        };
        assert_eq!(policy.delay(0).as_secs(), 1);
        assert_eq!(policy.delay(1).as_secs(), 7);
        assert_eq!(policy.delay(2).as_secs(), 49);
    }
}
