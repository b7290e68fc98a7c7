//! # Gemini Provider Tests
//!
//! HTTP-level tests against a mock `generateContent` endpoint: the wire
//! format for tool declarations and calls, and the transport retry policy.

mod common;

use anyhow::Result;
use common::setup_tracing;
use serde_json::json;
use shelfkeep::errors::AgentError;
use shelfkeep::providers::ai::{
    gemini::GeminiProvider, ChatMessage, ChatProvider, ChatRequest, RetryPolicy, ToolDeclaration,
};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// A retry policy with the production shape but test-sized delays.
fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        attempts: 5,
        initial_delay: 0.005,
        exp_base: 2.0,
        retry_on: vec![429, 500, 503, 504],
    }
}

fn provider_for(server: &MockServer) -> GeminiProvider {
    GeminiProvider::new(format!("{}/generate", server.uri()), "test-key".to_string())
        .expect("provider builds")
        .with_retry(fast_retry())
}

fn simple_request() -> ChatRequest {
    ChatRequest {
        system_instruction: Some("You are a test agent.".to_string()),
        messages: vec![ChatMessage::user_text("hello")],
        tools: Vec::new(),
        enable_search: false,
    }
}

#[tokio::test]
async fn recovers_after_retryable_statuses() -> Result<()> {
    setup_tracing();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/generate"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/generate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{ "content": { "role": "model", "parts": [{ "text": "pong" }] } }]
        })))
        .mount(&server)
        .await;

    let turn = provider_for(&server).chat(&simple_request()).await?;
    assert_eq!(turn.text.as_deref(), Some("pong"));
    assert!(turn.tool_calls.is_empty());

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 3, "two failures plus the success");
    Ok(())
}

#[tokio::test]
async fn exhausted_retries_surface_as_a_terminal_error() -> Result<()> {
    setup_tracing();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/generate"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = provider_for(&server)
        .chat(&simple_request())
        .await
        .unwrap_err();
    match err {
        AgentError::RetriesExhausted { attempts, status, .. } => {
            assert_eq!(attempts, 5);
            assert_eq!(status, 500);
        }
        other => panic!("expected RetriesExhausted, got {other:?}"),
    }

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 5);
    Ok(())
}

#[tokio::test]
async fn non_retryable_statuses_fail_immediately() -> Result<()> {
    setup_tracing();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/generate"))
        .respond_with(ResponseTemplate::new(400).set_body_string("bad request"))
        .mount(&server)
        .await;

    let err = provider_for(&server)
        .chat(&simple_request())
        .await
        .unwrap_err();
    match err {
        AgentError::ModelApi { status, message } => {
            assert_eq!(status, 400);
            assert_eq!(message, "bad request");
        }
        other => panic!("expected ModelApi, got {other:?}"),
    }

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1, "a 400 must not be retried");
    Ok(())
}

#[tokio::test]
async fn declares_tools_and_parses_function_calls() -> Result<()> {
    setup_tracing();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/generate"))
        .and(body_partial_json(json!({
            "system_instruction": { "parts": [{ "text": "You are a test agent." }] },
            "tools": [{ "functionDeclarations": [{ "name": "get_document" }] }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{
                "content": {
                    "role": "model",
                    "parts": [{
                        "functionCall": {
                            "name": "get_document",
                            "args": { "collection_id": "dvd", "document_id": "abc" }
                        }
                    }]
                }
            }]
        })))
        .mount(&server)
        .await;

    let request = ChatRequest {
        system_instruction: Some("You are a test agent.".to_string()),
        messages: vec![ChatMessage::user_text("fetch abc")],
        tools: vec![ToolDeclaration {
            name: "get_document".to_string(),
            description: "Fetches one document.".to_string(),
            parameters: json!({ "type": "object", "properties": {} }),
        }],
        enable_search: false,
    };

    let turn = provider_for(&server).chat(&request).await?;
    assert!(turn.text.is_none());
    assert_eq!(turn.tool_calls.len(), 1);
    assert_eq!(turn.tool_calls[0].name, "get_document");
    assert_eq!(
        turn.tool_calls[0].args.get("collection_id"),
        Some(&json!("dvd"))
    );
    Ok(())
}

#[tokio::test]
async fn search_enabled_requests_carry_the_google_search_tool() -> Result<()> {
    setup_tracing();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/generate"))
        .and(body_partial_json(json!({
            "tools": [{ "googleSearch": {} }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{ "content": { "role": "model", "parts": [{ "text": "found it" }] } }]
        })))
        .mount(&server)
        .await;

    let request = ChatRequest {
        system_instruction: None,
        messages: vec![ChatMessage::user_text("Inception 4K site:blu-ray.com")],
        tools: Vec::new(),
        enable_search: true,
    };

    let turn = provider_for(&server).chat(&request).await?;
    assert_eq!(turn.text.as_deref(), Some("found it"));
    Ok(())
}
