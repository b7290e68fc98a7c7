use crate::errors::AgentError;
use crate::providers::ai::{
    ChatMessage, ChatProvider, ChatRequest, ChatRole, MessagePart, ModelTurn, RetryPolicy,
    ToolCall,
};
use async_trait::async_trait;
use reqwest::Client as ReqwestClient;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::Debug;
use tracing::warn;

// --- OpenAI-compatible request and response structures ---

#[derive(Serialize)]
struct LocalAiRequest<'a> {
    messages: Vec<LocalAiMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
    temperature: f32,
    stream: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<LocalAiTool>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
struct LocalAiMessage {
    role: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    tool_calls: Option<Vec<LocalAiToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    tool_call_id: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
struct LocalAiToolCall {
    id: String,
    #[serde(rename = "type")]
    kind: String,
    function: LocalAiFunctionCall,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
struct LocalAiFunctionCall {
    name: String,
    /// JSON-encoded argument object, per the OpenAI wire format.
    arguments: String,
}

#[derive(Serialize)]
struct LocalAiTool {
    #[serde(rename = "type")]
    kind: &'static str,
    function: LocalAiFunctionDef,
}

#[derive(Serialize)]
struct LocalAiFunctionDef {
    name: String,
    description: String,
    parameters: Value,
}

#[derive(Deserialize, Debug)]
struct LocalAiResponse {
    choices: Vec<LocalAiChoice>,
}

#[derive(Deserialize, Debug)]
struct LocalAiChoice {
    message: LocalAiMessage,
}

// --- Local Provider implementation ---

/// A provider for interacting with a local or OpenAI-compatible API.
///
/// Supports function tools; `enable_search` is ignored because the
/// chat-completions wire format has no provider-native search tool.
#[derive(Clone, Debug)]
pub struct LocalAiProvider {
    client: ReqwestClient,
    api_url: String,
    api_key: Option<String>,
    model: Option<String>,
    retry: RetryPolicy,
}

impl LocalAiProvider {
    /// Creates a new `LocalAiProvider` with the default retry policy.
    pub fn new(
        api_url: String,
        api_key: Option<String>,
        model: Option<String>,
    ) -> Result<Self, AgentError> {
        let client = ReqwestClient::builder()
            .build()
            .map_err(AgentError::ReqwestClientBuild)?;
        Ok(Self {
            client,
            api_url,
            api_key,
            model,
            retry: RetryPolicy::default(),
        })
    }

    /// Overrides the transport retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    fn build_messages(request: &ChatRequest) -> Result<Vec<LocalAiMessage>, AgentError> {
        let mut messages = Vec::new();
        if let Some(system) = &request.system_instruction {
            messages.push(LocalAiMessage {
                role: "system".to_string(),
                content: Some(system.clone()),
                ..Default::default()
            });
        }
        for message in &request.messages {
            messages.extend(flatten_message(message)?);
        }
        Ok(messages)
    }
}

/// One provider-neutral message can expand into several wire messages: tool
/// responses are standalone `role: tool` entries in this format.
fn flatten_message(message: &ChatMessage) -> Result<Vec<LocalAiMessage>, AgentError> {
    let mut out = Vec::new();
    let mut text = String::new();
    let mut tool_calls = Vec::new();

    for part in &message.parts {
        match part {
            MessagePart::Text(chunk) => text.push_str(chunk),
            MessagePart::Call(call) => tool_calls.push(LocalAiToolCall {
                id: call
                    .id
                    .clone()
                    .unwrap_or_else(|| format!("call_{}", call.name)),
                kind: "function".to_string(),
                function: LocalAiFunctionCall {
                    name: call.name.clone(),
                    arguments: serde_json::to_string(&call.args)?,
                },
            }),
            MessagePart::Response(response) => out.push(LocalAiMessage {
                role: "tool".to_string(),
                content: Some(response.response.to_string()),
                tool_call_id: Some(
                    response
                        .id
                        .clone()
                        .unwrap_or_else(|| format!("call_{}", response.name)),
                ),
                ..Default::default()
            }),
        }
    }

    if !text.is_empty() || !tool_calls.is_empty() {
        let role = match message.role {
            ChatRole::User => "user",
            ChatRole::Model => "assistant",
        };
        out.insert(
            0,
            LocalAiMessage {
                role: role.to_string(),
                content: (!text.is_empty()).then_some(text),
                tool_calls: (!tool_calls.is_empty()).then_some(tool_calls),
                ..Default::default()
            },
        );
    }
    Ok(out)
}

fn parse_turn(response: LocalAiResponse) -> Result<ModelTurn, AgentError> {
    let message = response
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message)
        .unwrap_or_default();

    let mut turn = ModelTurn {
        text: message.content.filter(|text| !text.is_empty()),
        tool_calls: Vec::new(),
    };
    for call in message.tool_calls.unwrap_or_default() {
        let args: Value = serde_json::from_str(&call.function.arguments)?;
        turn.tool_calls.push(ToolCall {
            id: Some(call.id),
            name: call.function.name,
            args: args.as_object().cloned().unwrap_or_default(),
        });
    }
    Ok(turn)
}

#[async_trait]
impl ChatProvider for LocalAiProvider {
    async fn chat(&self, request: &ChatRequest) -> Result<ModelTurn, AgentError> {
        let request_body = LocalAiRequest {
            messages: Self::build_messages(request)?,
            model: self.model.as_deref(),
            temperature: 0.0,
            stream: false,
            tools: request
                .tools
                .iter()
                .map(|tool| LocalAiTool {
                    kind: "function",
                    function: LocalAiFunctionDef {
                        name: tool.name.clone(),
                        description: tool.description.clone(),
                        parameters: tool.parameters.clone(),
                    },
                })
                .collect(),
        };

        let mut attempt = 0;
        loop {
            attempt += 1;
            let mut request_builder = self.client.post(&self.api_url);
            if let Some(key) = &self.api_key {
                request_builder = request_builder.bearer_auth(key);
            }

            let response = request_builder
                .json(&request_body)
                .send()
                .await
                .map_err(AgentError::ModelRequest)?;

            let status = response.status();
            if status.is_success() {
                let local_ai_response: LocalAiResponse = response
                    .json()
                    .await
                    .map_err(AgentError::ModelDeserialization)?;
                return parse_turn(local_ai_response);
            }

            let message = response.text().await.unwrap_or_default();
            if !self.retry.is_retryable(status.as_u16()) {
                return Err(AgentError::ModelApi {
                    status: status.as_u16(),
                    message,
                });
            }
            if attempt >= self.retry.attempts {
                return Err(AgentError::RetriesExhausted {
                    attempts: attempt,
                    status: status.as_u16(),
                    message,
                });
            }

            let delay = self.retry.delay(attempt - 1);
            warn!(
                status = status.as_u16(),
                attempt,
                delay_secs = delay.as_secs_f64(),
                "Local AI call failed with a retryable status, backing off"
            );
            tokio::time::sleep(delay).await;
        }
    }
}
