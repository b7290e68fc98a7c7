//! # Session Memory
//!
//! After each top-level interaction the full session transcript is archived
//! to a long-term memory collaborator, keyed by session identity. The sink
//! is write-only: nothing in this crate reads archives back.

use crate::session::SessionContext;
use crate::store::StoreError;
use async_trait::async_trait;
use std::fmt::Debug;

/// A write-only archive for session transcripts.
#[async_trait]
pub trait MemorySink: Send + Sync + Debug {
    /// Persists the session's transcript under its session identity.
    async fn archive(&self, session: &SessionContext) -> Result<(), StoreError>;
}
