//! # Orchestrator Delegation Tests
//!
//! Drives a full master-to-sub-agent interaction with a scripted provider:
//! the master delegates through an agent tool, the inventory agent executes
//! a real store tool, and the transcript is archived afterwards.

mod common;

use anyhow::Result;
use common::{setup_tracing, MockChatProvider, RecordingMemorySink};
use serde_json::{json, Value};
use shelfkeep::providers::ai::ModelTurn;
use shelfkeep::session::SessionContext;
use shelfkeep::store::{memory::MemoryDocumentStore, CollectionPath, DocumentStore};
use shelfkeep::Orchestrator;
use std::sync::Arc;

fn tool_args(value: Value) -> serde_json::Map<String, Value> {
    value.as_object().expect("argument literal").clone()
}

#[tokio::test]
async fn master_delegates_to_inventory_agent_and_archives_the_session() -> Result<()> {
    setup_tracing();
    let store: Arc<dyn DocumentStore> = Arc::new(MemoryDocumentStore::new());
    let sink = RecordingMemorySink::new();
    let session = SessionContext::new("delegation-session");

    // Scripted flow, in the exact order the agents will consult the
    // provider: master delegates, the inventory agent adds the record and
    // reports back, the master composes the final answer.
    let provider = MockChatProvider::new(vec![
        ModelTurn::from_tool_call(
            "inventory_agent",
            tool_args(json!({
                "request": "Add an Inception DVD, UPC 12345, to the dvd category as 'abc'."
            })),
        ),
        ModelTurn::from_tool_call(
            "add_document",
            tool_args(json!({
                "collection_id": "dvd",
                "data": { "Title": "Inception", "UPC": "12345" },
                "document_id": "abc"
            })),
        ),
        ModelTurn::from_text("Added document 'abc' to the dvd category."),
        ModelTurn::from_text("Inception is now in your collection."),
    ]);

    let orchestrator = Orchestrator::new(
        Box::new(provider.clone()),
        store.clone(),
        Some(Arc::new(sink.clone())),
    )?;

    let reply = orchestrator
        .handle(&session, "Please add the Inception DVD to my collection.")
        .await?;
    assert_eq!(reply, "Inception is now in your collection.");

    // The sub-agent's tool call reached the store.
    let path = CollectionPath::new("1", "dvd").document("abc");
    let stored = store.get_document(&path).await?.expect("document persisted");
    assert_eq!(stored.get("UPC"), Some(&json!("12345")));

    // Four provider consultations: two per agent.
    assert_eq!(provider.calls().len(), 4);

    // The archival hook received the full exchange, keyed by session.
    let archived = sink.archived();
    assert_eq!(archived.len(), 1);
    let (session_id, transcript) = &archived[0];
    assert_eq!(session_id, "delegation-session");
    assert_eq!(transcript.len(), 2);
    assert_eq!(transcript[0].role, "user");
    assert_eq!(transcript[1].role, "assistant");
    assert_eq!(transcript[1].content, "Inception is now in your collection.");
    Ok(())
}

#[tokio::test]
async fn sub_agent_failures_come_back_to_the_master_as_data() -> Result<()> {
    setup_tracing();
    let store: Arc<dyn DocumentStore> = Arc::new(MemoryDocumentStore::new());
    let session = SessionContext::new("failure-session");

    // The inventory agent's provider errs terminally; the master still gets
    // a failure outcome it can relay instead of the whole turn aborting.
    let provider = MockChatProvider::new(vec![
        ModelTurn::from_tool_call(
            "inventory_agent",
            tool_args(json!({ "request": "List everything." })),
        ),
        // Sub-agent turn: the queue is exhausted mid-delegation on purpose,
        // so the mock errs, simulating a terminal provider failure.
    ]);

    let orchestrator = Orchestrator::new(Box::new(provider.clone()), store, None)?;
    let err = orchestrator
        .handle(&session, "What do I own?")
        .await
        .unwrap_err();

    // The master consumed the failure outcome and asked the provider again;
    // with the queue empty, its own call errs too. Three consultations: the
    // master's first turn, the sub-agent's failed turn, the master's retry.
    assert_eq!(provider.calls().len(), 3);
    let message = err.to_string();
    assert!(message.contains("no turn programmed"), "got: {message}");
    Ok(())
}
