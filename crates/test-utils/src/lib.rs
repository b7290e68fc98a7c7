//! Shared fixtures for integration tests across the workspace: a scripted
//! chat provider, a recording memory sink, and builders for Gemini-shaped
//! response bodies to mount on mock HTTP servers.

use async_trait::async_trait;
use serde_json::{json, Value};
use shelfkeep::errors::AgentError;
use shelfkeep::memory::MemorySink;
use shelfkeep::providers::ai::{ChatProvider, ChatRequest, ModelTurn};
use shelfkeep::session::{SessionContext, TranscriptEntry};
use shelfkeep::store::StoreError;
use std::sync::{Arc, Mutex};

// --- Mock Chat Provider ---

/// Replays a fixed queue of model turns and records every request it saw.
#[derive(Clone, Debug)]
pub struct MockChatProvider {
    turns: Arc<Mutex<Vec<ModelTurn>>>,
    calls: Arc<Mutex<Vec<ChatRequest>>>,
}

impl MockChatProvider {
    pub fn new(turns: Vec<ModelTurn>) -> Self {
        Self {
            turns: Arc::new(Mutex::new(turns.into_iter().rev().collect())),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Retrieves the recorded requests for assertion.
    pub fn calls(&self) -> Vec<ChatRequest> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatProvider for MockChatProvider {
    async fn chat(&self, request: &ChatRequest) -> Result<ModelTurn, AgentError> {
        self.calls.lock().unwrap().push(request.clone());
        self.turns
            .lock()
            .unwrap()
            .pop()
            .ok_or_else(|| AgentError::ModelApi {
                status: 500,
                message: "MockChatProvider: no turn programmed for this request".to_string(),
            })
    }
}

// --- Recording Memory Sink ---

/// Captures archived transcripts for assertion.
#[derive(Clone, Debug, Default)]
pub struct RecordingMemorySink {
    archives: Arc<Mutex<Vec<(String, Vec<TranscriptEntry>)>>>,
}

impl RecordingMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn archived(&self) -> Vec<(String, Vec<TranscriptEntry>)> {
        self.archives.lock().unwrap().clone()
    }
}

#[async_trait]
impl MemorySink for RecordingMemorySink {
    async fn archive(&self, session: &SessionContext) -> Result<(), StoreError> {
        self.archives
            .lock()
            .unwrap()
            .push((session.session_id().to_string(), session.transcript()));
        Ok(())
    }
}

// --- Gemini Response Builders ---

/// A `generateContent` body answering with plain text.
pub fn gemini_text_response(text: &str) -> Value {
    json!({
        "candidates": [{
            "content": { "role": "model", "parts": [{ "text": text }] }
        }]
    })
}

/// A `generateContent` body requesting one function call.
pub fn gemini_function_call_response(name: &str, args: Value) -> Value {
    json!({
        "candidates": [{
            "content": {
                "role": "model",
                "parts": [{ "functionCall": { "name": name, "args": args } }]
            }
        }]
    })
}
