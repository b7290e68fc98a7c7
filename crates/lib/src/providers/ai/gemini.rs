use crate::errors::AgentError;
use crate::providers::ai::{
    ChatMessage, ChatProvider, ChatRequest, ChatRole, MessagePart, ModelTurn, RetryPolicy,
    ToolCall, ToolDeclaration,
};
use async_trait::async_trait;
use reqwest::Client as ReqwestClient;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt::Debug;
use tracing::{debug, warn};

// --- Gemini-specific request and response structures ---

#[derive(Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<GeminiToolConfig>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(untagged)]
enum Part {
    FunctionCall {
        #[serde(rename = "functionCall")]
        function_call: FunctionCall,
    },
    FunctionResponse {
        #[serde(rename = "functionResponse")]
        function_response: FunctionResponse,
    },
    Text {
        text: String,
    },
}

#[derive(Serialize, Deserialize, Debug, Clone)]
struct FunctionCall {
    name: String,
    #[serde(default)]
    args: serde_json::Map<String, Value>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
struct FunctionResponse {
    name: String,
    response: Value,
}

#[derive(Serialize)]
struct GeminiToolConfig {
    #[serde(rename = "functionDeclarations", skip_serializing_if = "Option::is_none")]
    function_declarations: Option<Vec<FunctionDeclaration>>,
    #[serde(rename = "googleSearch", skip_serializing_if = "Option::is_none")]
    google_search: Option<Value>,
}

#[derive(Serialize)]
struct FunctionDeclaration {
    name: String,
    description: String,
    parameters: Value,
}

#[derive(Deserialize, Debug)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize, Debug)]
struct Candidate {
    content: Option<Content>,
}

// --- Gemini Provider implementation ---

/// A provider for interacting with the Google Gemini API.
#[derive(Clone, Debug)]
pub struct GeminiProvider {
    client: ReqwestClient,
    api_url: String,
    api_key: String,
    retry: RetryPolicy,
}

impl GeminiProvider {
    /// Creates a new `GeminiProvider` with the default retry policy.
    pub fn new(api_url: String, api_key: String) -> Result<Self, AgentError> {
        let client = ReqwestClient::builder()
            .build()
            .map_err(AgentError::ReqwestClientBuild)?;
        Ok(Self {
            client,
            api_url,
            api_key,
            retry: RetryPolicy::default(),
        })
    }

    /// Overrides the transport retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// The `generateContent` endpoint for a given model name.
    pub fn api_url_for_model(model_name: &str) -> String {
        format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{model_name}:generateContent"
        )
    }

    fn build_request(request: &ChatRequest) -> GenerateContentRequest {
        let contents = request.messages.iter().map(content_from_message).collect();

        let system_instruction = request.system_instruction.as_ref().map(|text| Content {
            role: None,
            parts: vec![Part::Text { text: text.clone() }],
        });

        let mut tools = Vec::new();
        if !request.tools.is_empty() {
            tools.push(GeminiToolConfig {
                function_declarations: Some(
                    request.tools.iter().map(function_declaration).collect(),
                ),
                google_search: None,
            });
        }
        if request.enable_search {
            tools.push(GeminiToolConfig {
                function_declarations: None,
                google_search: Some(json!({})),
            });
        }

        GenerateContentRequest {
            contents,
            system_instruction,
            tools,
        }
    }
}

fn function_declaration(tool: &ToolDeclaration) -> FunctionDeclaration {
    FunctionDeclaration {
        name: tool.name.clone(),
        description: tool.description.clone(),
        parameters: tool.parameters.clone(),
    }
}

fn content_from_message(message: &ChatMessage) -> Content {
    let role = match message.role {
        ChatRole::User => "user",
        ChatRole::Model => "model",
    };
    let parts = message
        .parts
        .iter()
        .map(|part| match part {
            MessagePart::Text(text) => Part::Text { text: text.clone() },
            MessagePart::Call(call) => Part::FunctionCall {
                function_call: FunctionCall {
                    name: call.name.clone(),
                    args: call.args.clone(),
                },
            },
            MessagePart::Response(response) => Part::FunctionResponse {
                function_response: FunctionResponse {
                    name: response.name.clone(),
                    response: ensure_object(response.response.clone()),
                },
            },
        })
        .collect();
    Content {
        role: Some(role.to_string()),
        parts,
    }
}

/// The API requires `functionResponse.response` to be an object; scalar tool
/// results are wrapped under a `result` key.
fn ensure_object(value: Value) -> Value {
    match value {
        Value::Object(_) => value,
        other => json!({ "result": other }),
    }
}

fn parse_turn(response: GenerateContentResponse) -> ModelTurn {
    let mut turn = ModelTurn::default();
    let parts = response
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .map(|content| content.parts)
        .unwrap_or_default();

    let mut text = String::new();
    for part in parts {
        match part {
            Part::Text { text: chunk } => text.push_str(&chunk),
            Part::FunctionCall { function_call } => turn.tool_calls.push(ToolCall {
                id: None,
                name: function_call.name,
                args: function_call.args,
            }),
            Part::FunctionResponse { .. } => {}
        }
    }
    if !text.is_empty() {
        turn.text = Some(text);
    }
    turn
}

#[async_trait]
impl ChatProvider for GeminiProvider {
    async fn chat(&self, request: &ChatRequest) -> Result<ModelTurn, AgentError> {
        let request_body = Self::build_request(request);

        let mut attempt = 0;
        loop {
            attempt += 1;
            let response = self
                .client
                .post(&self.api_url)
                .query(&[("key", &self.api_key)])
                .json(&request_body)
                .send()
                .await
                .map_err(AgentError::ModelRequest)?;

            let status = response.status();
            if status.is_success() {
                let gemini_response: GenerateContentResponse = response
                    .json()
                    .await
                    .map_err(AgentError::ModelDeserialization)?;
                debug!(?gemini_response, "<-- Gemini response");
                return Ok(parse_turn(gemini_response));
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
                "Gemini call failed with a retryable status, backing off"
            );
            tokio::time::sleep(delay).await;
        }
    }
}
