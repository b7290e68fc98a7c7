//! # Callable Tools
//!
//! Tools are the functions a model may invoke during an agent turn. Every
//! tool returns a [`ToolOutcome`] rather than a `Result`: the consuming
//! layer is a model that can only observe return values, so failures are
//! surfaced as descriptive data it can read and relay, never as control-flow
//! exceptions.

pub mod inventory;
pub mod user;

use crate::providers::ai::ToolDeclaration;
use crate::session::SessionContext;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::sync::Arc;

/// The tagged result of a tool invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutcome {
    /// The payload handed back to the model on success. Confirmation
    /// messages are plain strings; lookups return structured values.
    Success(Value),
    /// A descriptive failure the model can relay upward.
    Failure(String),
}

impl ToolOutcome {
    pub fn success(value: impl Into<Value>) -> Self {
        ToolOutcome::Success(value.into())
    }

    pub fn failure(message: impl Into<String>) -> Self {
        ToolOutcome::Failure(message.into())
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, ToolOutcome::Failure(_))
    }

    pub fn as_success(&self) -> Option<&Value> {
        match self {
            ToolOutcome::Success(value) => Some(value),
            ToolOutcome::Failure(_) => None,
        }
    }

    /// Renders the outcome as the JSON value fed back to the model.
    pub fn into_value(self) -> Value {
        match self {
            ToolOutcome::Success(value) => value,
            ToolOutcome::Failure(message) => json!({ "error": message }),
        }
    }
}

/// A function callable by the model.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;

    /// One or two sentences shown to the model in the function declaration.
    fn description(&self) -> &str;

    /// JSON-schema object describing the accepted arguments.
    fn parameters(&self) -> Value;

    /// Executes the tool. Receives the session context explicitly; failures
    /// are returned as data, never raised.
    async fn call(&self, session: &SessionContext, args: serde_json::Map<String, Value>)
        -> ToolOutcome;
}

/// Deserializes tool arguments, converting malformed input from the model
/// into a failure outcome it can correct on the next turn.
pub(crate) fn parse_args<T: DeserializeOwned>(
    args: serde_json::Map<String, Value>,
) -> Result<T, ToolOutcome> {
    serde_json::from_value(Value::Object(args))
        .map_err(|e| ToolOutcome::failure(format!("Invalid tool arguments: {e}")))
}

/// An ordered collection of tools bound to one agent.
#[derive(Clone, Default)]
pub struct ToolSet {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, tool: Arc<dyn Tool>) {
        self.tools.push(tool);
    }

    pub fn extend(&mut self, tools: impl IntoIterator<Item = Arc<dyn Tool>>) {
        self.tools.extend(tools);
    }

    pub fn find(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.iter().find(|tool| tool.name() == name)
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// The function declarations advertised to the model.
    pub fn declarations(&self) -> Vec<ToolDeclaration> {
        self.tools
            .iter()
            .map(|tool| ToolDeclaration {
                name: tool.name().to_string(),
                description: tool.description().to_string(),
                parameters: tool.parameters(),
            })
            .collect()
    }
}

impl FromIterator<Arc<dyn Tool>> for ToolSet {
    fn from_iter<I: IntoIterator<Item = Arc<dyn Tool>>>(iter: I) -> Self {
        Self {
            tools: iter.into_iter().collect(),
        }
    }
}

impl std::fmt::Debug for ToolSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.tools.iter().map(|tool| tool.name()))
            .finish()
    }
}
