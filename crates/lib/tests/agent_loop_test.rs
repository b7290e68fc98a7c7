//! # Agent Tool-Loop Tests
//!
//! Verifies the contract between an agent and its provider: requested tool
//! calls execute against the real tool set, their outcomes are echoed back
//! into the history, and the loop terminates on a text turn or on the step
//! budget.

mod common;

use anyhow::Result;
use common::{setup_tracing, MockChatProvider};
use serde_json::{json, Value};
use shelfkeep::agent::Agent;
use shelfkeep::errors::AgentError;
use shelfkeep::providers::ai::{MessagePart, ModelTurn};
use shelfkeep::session::SessionContext;
use shelfkeep::store::{memory::MemoryDocumentStore, CollectionPath, DocumentStore};
use shelfkeep::tools::inventory::inventory_toolset;

fn tool_args(value: Value) -> serde_json::Map<String, Value> {
    value.as_object().expect("argument literal").clone()
}

#[tokio::test]
async fn tool_calls_execute_and_their_outcomes_feed_the_next_turn() -> Result<()> {
    setup_tracing();
    let store: std::sync::Arc<dyn DocumentStore> =
        std::sync::Arc::new(MemoryDocumentStore::new());
    let session = SessionContext::new("loop-test");

    let provider = MockChatProvider::new(vec![
        ModelTurn::from_tool_call(
            "add_document",
            tool_args(json!({
                "collection_id": "dvd",
                "data": { "Title": "Inception", "UPC": "12345" },
                "document_id": "abc"
            })),
        ),
        ModelTurn::from_text("Saved Inception to your dvd collection."),
    ]);

    let agent = Agent::builder()
        .name("inventory_agent")
        .description("test inventory agent")
        .instruction("Manage the inventory database.")
        .provider(Box::new(provider.clone()))
        .tools(inventory_toolset(&store))
        .build()?;

    let answer = agent.run(&session, "Add the Inception DVD, UPC 12345.").await?;
    assert_eq!(answer, "Saved Inception to your dvd collection.");

    // The write went through the real tool.
    let path = CollectionPath::new("1", "dvd").document("abc");
    let stored = store.get_document(&path).await?.expect("document persisted");
    assert_eq!(stored.get("Title"), Some(&json!("Inception")));

    // The second request must replay the model's call and the tool outcome.
    let calls = provider.calls();
    assert_eq!(calls.len(), 2);
    let followup = &calls[1].messages;
    assert_eq!(followup.len(), 3);
    let response_part = &followup[2].parts[0];
    match response_part {
        MessagePart::Response(response) => {
            assert_eq!(response.name, "add_document");
            assert_eq!(
                response.response,
                json!("Successfully added document 'abc' to collection 'users/1/dvd'.")
            );
        }
        other => panic!("expected a tool response part, got {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn unknown_tools_are_reported_back_as_data() -> Result<()> {
    setup_tracing();
    let session = SessionContext::new("loop-test");

    let provider = MockChatProvider::new(vec![
        ModelTurn::from_tool_call("no_such_tool", serde_json::Map::new()),
        ModelTurn::from_text("Understood, that tool does not exist."),
    ]);

    let agent = Agent::builder()
        .name("inventory_agent")
        .instruction("Manage the inventory database.")
        .provider(Box::new(provider.clone()))
        .build()?;

    let answer = agent.run(&session, "do something odd").await?;
    assert_eq!(answer, "Understood, that tool does not exist.");

    let calls = provider.calls();
    let followup = &calls[1].messages;
    match &followup[2].parts[0] {
        MessagePart::Response(response) => {
            assert_eq!(response.response, json!({ "error": "Unknown tool 'no_such_tool'." }));
        }
        other => panic!("expected a tool response part, got {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn runaway_tool_loops_hit_the_step_budget() -> Result<()> {
    setup_tracing();
    let session = SessionContext::new("loop-test");

    // The model asks for the same unknown tool forever.
    let turns = (0..4)
        .map(|_| ModelTurn::from_tool_call("spin", serde_json::Map::new()))
        .collect();
    let provider = MockChatProvider::new(turns);

    let agent = Agent::builder()
        .name("inventory_agent")
        .instruction("Manage the inventory database.")
        .provider(Box::new(provider))
        .max_steps(3)
        .build()?;

    let err = agent.run(&session, "never finish").await.unwrap_err();
    match err {
        AgentError::StepLimitExceeded { agent, limit } => {
            assert_eq!(agent, "inventory_agent");
            assert_eq!(limit, 3);
        }
        other => panic!("expected StepLimitExceeded, got {other:?}"),
    }
    Ok(())
}
