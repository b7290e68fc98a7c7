//! # Session Context
//!
//! The per-conversation state shared by every tool call. The context is an
//! explicit object handed to tools rather than an ambient lookup, so the
//! resolution contract stays testable and thread-safe. Clones share state.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// The fallback user identity when neither an explicit argument nor a
/// session value is present. A deliberate single-tenant default.
pub const DEFAULT_USER_ID: &str = "1";

/// One user-visible turn, kept for end-of-interaction archival.
#[derive(Debug, Clone, Serialize)]
pub struct TranscriptEntry {
    pub role: String,
    pub content: String,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct SessionState {
    values: HashMap<String, Value>,
    transcript: Vec<TranscriptEntry>,
}

/// Ephemeral state for one conversation: a small key-value map (holding at
/// minimum the `user_id` override) plus the running transcript.
#[derive(Debug, Clone)]
pub struct SessionContext {
    session_id: String,
    state: Arc<RwLock<SessionState>>,
}

impl SessionContext {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            state: Arc::new(RwLock::new(SessionState::default())),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Reads a value from the session state map.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.state
            .read()
            .expect("session state lock poisoned")
            .values
            .get(key)
            .cloned()
    }

    /// Writes a value into the session state map.
    pub fn set(&self, key: impl Into<String>, value: Value) {
        self.state
            .write()
            .expect("session state lock poisoned")
            .values
            .insert(key.into(), value);
    }

    /// The session-stored user identity, if one has been set.
    pub fn user_id(&self) -> Option<String> {
        self.get("user_id")
            .and_then(|v| v.as_str().map(str::to_string))
            .filter(|id| !id.is_empty())
    }

    /// Stores the user identity for this session. The identifier is never
    /// validated; unknown users are created implicitly on first write.
    pub fn set_user_id(&self, user_id: &str) {
        self.set("user_id", Value::String(user_id.to_string()));
    }

    /// Resolves the effective user for a store operation.
    ///
    /// Resolution order, applied identically by every document tool:
    /// explicit argument, else the session-stored value, else
    /// [`DEFAULT_USER_ID`]. Empty strings are treated as absent.
    pub fn resolve_user_id(&self, explicit: Option<&str>) -> String {
        explicit
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .or_else(|| self.user_id())
            .unwrap_or_else(|| DEFAULT_USER_ID.to_string())
    }

    /// Appends an entry to the session transcript.
    pub fn record(&self, role: &str, content: &str) {
        self.state
            .write()
            .expect("session state lock poisoned")
            .transcript
            .push(TranscriptEntry {
                role: role.to_string(),
                content: content.to_string(),
                recorded_at: Utc::now(),
            });
    }

    /// A snapshot of the transcript so far.
    pub fn transcript(&self) -> Vec<TranscriptEntry> {
        self.state
            .read()
            .expect("session state lock poisoned")
            .transcript
            .clone()
    }
}
