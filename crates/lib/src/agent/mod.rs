//! # Tool-Using Agent
//!
//! An [`Agent`] pairs a natural-language instruction with a chat provider
//! and a set of callable tools. [`Agent::run`] drives the tool loop: the
//! model is free to request any sequence of tool calls, and every outcome
//! (including failures and unknown tool names) is fed back as data until
//! the model answers with text.

pub mod delegate;

pub use delegate::AgentTool;

use crate::errors::AgentError;
use crate::providers::ai::{ChatMessage, ChatProvider, ChatRequest, ModelTurn, ToolResponse};
use crate::session::SessionContext;
use crate::tools::{Tool, ToolOutcome, ToolSet};
use std::sync::Arc;
use tracing::{debug, info};

/// How many tool-calling rounds an agent may take for a single task before
/// the run is treated as non-terminating.
const DEFAULT_MAX_STEPS: usize = 8;

/// A specialized, tool-using agent.
pub struct Agent {
    name: String,
    description: String,
    instruction: String,
    provider: Box<dyn ChatProvider>,
    tools: ToolSet,
    enable_search: bool,
    max_steps: usize,
}

impl Agent {
    pub fn builder() -> AgentBuilder {
        AgentBuilder::default()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Runs one task to completion.
    ///
    /// Requested tool calls are executed in the order the model issued them;
    /// their outcomes (successes and failures alike) are appended to the
    /// history and the model is consulted again. The loop ends when the
    /// model responds with text, or errs when the step budget runs out.
    pub async fn run(&self, session: &SessionContext, task: &str) -> Result<String, AgentError> {
        info!(agent = %self.name, "Agent received task");
        let mut messages = vec![ChatMessage::user_text(task)];

        for _ in 0..self.max_steps {
            let request = ChatRequest {
                system_instruction: Some(self.instruction.clone()),
                messages: messages.clone(),
                tools: self.tools.declarations(),
                enable_search: self.enable_search,
            };
            let turn = self.provider.chat(&request).await?;

            if turn.tool_calls.is_empty() {
                return turn
                    .text
                    .filter(|text| !text.trim().is_empty())
                    .ok_or(AgentError::EmptyModelResponse);
            }

            let responses = self.execute_tool_calls(session, &turn).await;
            messages.push(ChatMessage::from_model_turn(&turn));
            messages.push(ChatMessage::tool_responses(responses));
        }

        Err(AgentError::StepLimitExceeded {
            agent: self.name.clone(),
            limit: self.max_steps,
        })
    }

    async fn execute_tool_calls(
        &self,
        session: &SessionContext,
        turn: &ModelTurn,
    ) -> Vec<ToolResponse> {
        let mut responses = Vec::with_capacity(turn.tool_calls.len());
        for call in &turn.tool_calls {
            let outcome = match self.tools.find(&call.name) {
                Some(tool) => {
                    debug!(agent = %self.name, tool = %call.name, "Executing tool call");
                    tool.call(session, call.args.clone()).await
                }
                None => ToolOutcome::failure(format!("Unknown tool '{}'.", call.name)),
            };
            if let ToolOutcome::Failure(message) = &outcome {
                debug!(agent = %self.name, tool = %call.name, %message, "Tool reported a failure");
            }
            responses.push(ToolResponse {
                id: call.id.clone(),
                name: call.name.clone(),
                response: outcome.into_value(),
            });
        }
        responses
    }
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("name", &self.name)
            .field("tools", &self.tools)
            .field("enable_search", &self.enable_search)
            .finish_non_exhaustive()
    }
}

/// A builder for [`Agent`] instances.
#[derive(Default)]
pub struct AgentBuilder {
    name: Option<String>,
    description: Option<String>,
    instruction: Option<String>,
    provider: Option<Box<dyn ChatProvider>>,
    tools: ToolSet,
    enable_search: bool,
    max_steps: Option<usize>,
}

impl AgentBuilder {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn instruction(mut self, instruction: impl Into<String>) -> Self {
        self.instruction = Some(instruction.into());
        self
    }

    pub fn provider(mut self, provider: Box<dyn ChatProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn tool(mut self, tool: Arc<dyn Tool>) -> Self {
        self.tools.push(tool);
        self
    }

    pub fn tools(mut self, tools: impl IntoIterator<Item = Arc<dyn Tool>>) -> Self {
        self.tools.extend(tools);
        self
    }

    /// Enables the provider-native web-search tool for this agent.
    pub fn enable_search(mut self, enable: bool) -> Self {
        self.enable_search = enable;
        self
    }

    pub fn max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = Some(max_steps);
        self
    }

    pub fn build(self) -> Result<Agent, AgentError> {
        Ok(Agent {
            name: self.name.ok_or(AgentError::MissingField("name"))?,
            description: self.description.unwrap_or_default(),
            instruction: self
                .instruction
                .ok_or(AgentError::MissingField("instruction"))?,
            provider: self.provider.ok_or(AgentError::MissingProvider)?,
            tools: self.tools,
            enable_search: self.enable_search,
            max_steps: self.max_steps.unwrap_or(DEFAULT_MAX_STEPS),
        })
    }
}
