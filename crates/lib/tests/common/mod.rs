#![allow(dead_code)]
//! # Common Test Utilities
//!
//! Shared helpers for the integration tests: a queue-based mock chat
//! provider, a recording memory sink, and tracing setup.

use async_trait::async_trait;
use shelfkeep::errors::AgentError;
use shelfkeep::memory::MemorySink;
use shelfkeep::providers::ai::{ChatProvider, ChatRequest, ModelTurn};
use shelfkeep::session::{SessionContext, TranscriptEntry};
use shelfkeep::store::StoreError;
use std::sync::{Arc, Once, RwLock};

static INIT: Once = Once::new();

/// Initializes the tracing subscriber and loads .env for tests.
pub fn setup_tracing() {
    INIT.call_once(|| {
        dotenvy::dotenv().ok();
        tracing_subscriber::fmt::init();
    });
}

// --- Mock Chat Provider for Logic Testing ---

/// Replays a fixed queue of model turns and records every request it saw.
#[derive(Clone, Debug)]
pub struct MockChatProvider {
    pub call_history: Arc<RwLock<Vec<ChatRequest>>>,
    pub turns: Arc<RwLock<Vec<ModelTurn>>>,
}

impl MockChatProvider {
    pub fn new(turns: Vec<ModelTurn>) -> Self {
        Self {
            call_history: Arc::new(RwLock::new(Vec::new())),
            turns: Arc::new(RwLock::new(turns.into_iter().rev().collect())),
        }
    }

    pub fn calls(&self) -> Vec<ChatRequest> {
        self.call_history.read().unwrap().clone()
    }
}

#[async_trait]
impl ChatProvider for MockChatProvider {
    async fn chat(&self, request: &ChatRequest) -> Result<ModelTurn, AgentError> {
        self.call_history.write().unwrap().push(request.clone());

        self.turns.write().unwrap().pop().ok_or_else(|| {
            AgentError::ModelApi {
                status: 500,
                message: "MockChatProvider: no turn programmed for this request".to_string(),
            }
        })
    }
}

// --- Recording Memory Sink ---

/// Captures archived transcripts for assertions.
#[derive(Clone, Debug, Default)]
pub struct RecordingMemorySink {
    pub archives: Arc<RwLock<Vec<(String, Vec<TranscriptEntry>)>>>,
}

impl RecordingMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn archived(&self) -> Vec<(String, Vec<TranscriptEntry>)> {
        self.archives.read().unwrap().clone()
    }
}

#[async_trait]
impl MemorySink for RecordingMemorySink {
    async fn archive(&self, session: &SessionContext) -> Result<(), StoreError> {
        self.archives
            .write()
            .unwrap()
            .push((session.session_id().to_string(), session.transcript()));
        Ok(())
    }
}
