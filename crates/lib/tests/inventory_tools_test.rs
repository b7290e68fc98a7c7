//! # Inventory Tool Contract Tests
//!
//! Exercises the document tool set against the in-memory backend: the
//! round-trip, merge-patch, deletion, and price-history guarantees the
//! consuming model relies on, plus the message-returning error convention.

mod common;

use anyhow::Result;
use serde_json::{json, Map, Value};
use shelfkeep::session::SessionContext;
use shelfkeep::store::{memory::MemoryDocumentStore, DocumentStore};
use shelfkeep::tools::{inventory::inventory_toolset, ToolOutcome, ToolSet};
use std::sync::Arc;

fn setup() -> (SessionContext, ToolSet) {
    common::setup_tracing();
    let store: Arc<dyn DocumentStore> = Arc::new(MemoryDocumentStore::new());
    let session = SessionContext::new("test-session");
    let tools: ToolSet = inventory_toolset(&store).into_iter().collect();
    (session, tools)
}

fn args(value: Value) -> Map<String, Value> {
    value.as_object().expect("argument literal").clone()
}

async fn call(tools: &ToolSet, session: &SessionContext, name: &str, a: Value) -> ToolOutcome {
    tools
        .find(name)
        .unwrap_or_else(|| panic!("tool '{name}' not registered"))
        .call(session, args(a))
        .await
}

#[tokio::test]
async fn add_then_get_round_trips_the_field_map() -> Result<()> {
    let (session, tools) = setup();

    let outcome = call(
        &tools,
        &session,
        "add_document",
        json!({
            "collection_id": "dvd",
            "data": { "Title": "Inception", "UPC": "12345" },
            "document_id": "abc"
        }),
    )
    .await;

    let message = outcome.as_success().and_then(Value::as_str).unwrap();
    assert_eq!(
        message,
        "Successfully added document 'abc' to collection 'users/1/dvd'."
    );

    let fetched = call(
        &tools,
        &session,
        "get_document",
        json!({ "collection_id": "dvd", "document_id": "abc" }),
    )
    .await;
    assert_eq!(
        fetched.as_success().unwrap(),
        &json!({ "Title": "Inception", "UPC": "12345" })
    );
    Ok(())
}

#[tokio::test]
async fn add_without_id_generates_one_and_names_it() -> Result<()> {
    let (session, tools) = setup();

    let outcome = call(
        &tools,
        &session,
        "add_document",
        json!({ "collection_id": "dvd", "data": { "Title": "Heat" } }),
    )
    .await;

    let message = outcome.as_success().and_then(Value::as_str).unwrap();
    assert!(message.starts_with("Successfully added document '"));
    assert!(message.ends_with("to collection 'users/1/dvd'."));

    // The generated id must be discoverable through a field lookup.
    let found = call(
        &tools,
        &session,
        "find_document_by_field",
        json!({ "collection_id": "dvd", "field": "Title", "value": "Heat" }),
    )
    .await;
    let results = found.as_success().and_then(Value::as_array).unwrap();
    assert_eq!(results.len(), 1);
    assert!(results[0]["id"].as_str().is_some_and(|id| !id.is_empty()));
    Ok(())
}

#[tokio::test]
async fn merge_patches_compose_and_preserve_untouched_fields() -> Result<()> {
    let (session, tools) = setup();

    call(
        &tools,
        &session,
        "add_document",
        json!({
            "collection_id": "dvd",
            "data": { "Title": "Alien", "Quantity": 1 },
            "document_id": "a1"
        }),
    )
    .await;

    let patched = call(
        &tools,
        &session,
        "update_document",
        json!({
            "collection_id": "dvd",
            "document_id": "a1",
            "data": { "Quantity": 2, "Condition": "Used" }
        }),
    )
    .await;
    assert_eq!(
        patched.as_success().and_then(Value::as_str).unwrap(),
        "Successfully updated document at 'users/1/dvd/a1'."
    );

    let fetched = call(
        &tools,
        &session,
        "get_document",
        json!({ "collection_id": "dvd", "document_id": "a1" }),
    )
    .await;
    assert_eq!(
        fetched.as_success().unwrap(),
        &json!({ "Title": "Alien", "Quantity": 2, "Condition": "Used" })
    );
    Ok(())
}

#[tokio::test]
async fn get_missing_document_returns_structured_sentinel() -> Result<()> {
    let (session, tools) = setup();

    let outcome = call(
        &tools,
        &session,
        "get_document",
        json!({ "collection_id": "dvd", "document_id": "nope" }),
    )
    .await;

    // Not-found is data, not a failure: the model reads it like any result.
    assert!(!outcome.is_failure());
    assert_eq!(
        outcome.as_success().unwrap(),
        &json!({ "error": "Document not found." })
    );
    Ok(())
}

#[tokio::test]
async fn delete_missing_document_reports_not_found_and_mutates_nothing() -> Result<()> {
    let (session, tools) = setup();

    call(
        &tools,
        &session,
        "add_document",
        json!({ "collection_id": "dvd", "data": { "Title": "Brazil" }, "document_id": "b1" }),
    )
    .await;

    let outcome = call(
        &tools,
        &session,
        "delete_document",
        json!({ "collection_id": "dvd", "document_id": "missing" }),
    )
    .await;
    assert_eq!(
        outcome,
        ToolOutcome::Failure("Document 'missing' not found.".to_string())
    );
    assert_eq!(
        outcome.into_value(),
        json!({ "error": "Document 'missing' not found." })
    );

    // The existing record must be untouched.
    let fetched = call(
        &tools,
        &session,
        "get_document",
        json!({ "collection_id": "dvd", "document_id": "b1" }),
    )
    .await;
    assert_eq!(fetched.as_success().unwrap(), &json!({ "Title": "Brazil" }));
    Ok(())
}

#[tokio::test]
async fn delete_then_get_returns_not_found() -> Result<()> {
    let (session, tools) = setup();

    call(
        &tools,
        &session,
        "add_document",
        json!({ "collection_id": "dvd", "data": { "Title": "Tron" }, "document_id": "t1" }),
    )
    .await;

    let deleted = call(
        &tools,
        &session,
        "delete_document",
        json!({ "collection_id": "dvd", "document_id": "t1" }),
    )
    .await;
    assert_eq!(
        deleted.as_success().and_then(Value::as_str).unwrap(),
        "Successfully deleted document at 'users/1/dvd/t1'."
    );

    let fetched = call(
        &tools,
        &session,
        "get_document",
        json!({ "collection_id": "dvd", "document_id": "t1" }),
    )
    .await;
    assert_eq!(
        fetched.as_success().unwrap(),
        &json!({ "error": "Document not found." })
    );
    Ok(())
}

#[tokio::test]
async fn price_history_grows_by_exactly_one_entry() -> Result<()> {
    let (session, tools) = setup();

    let first_entry = json!({ "value": 12.99, "date_checked": "2025-01-02" });
    call(
        &tools,
        &session,
        "add_document",
        json!({
            "collection_id": "dvd",
            "data": { "Title": "Dune", "PriceHistory": [first_entry] },
            "document_id": "d1"
        }),
    )
    .await;

    // The model appends by reading the current list and writing it back
    // with one more entry; earlier entries are never rewritten.
    let fetched = call(
        &tools,
        &session,
        "get_document",
        json!({ "collection_id": "dvd", "document_id": "d1" }),
    )
    .await;
    let mut history = fetched.as_success().unwrap()["PriceHistory"]
        .as_array()
        .unwrap()
        .clone();
    let before_len = history.len();
    history.push(json!({ "value": 14.50, "date_checked": "2025-02-02" }));

    call(
        &tools,
        &session,
        "update_document",
        json!({
            "collection_id": "dvd",
            "document_id": "d1",
            "data": { "PriceHistory": history }
        }),
    )
    .await;

    let fetched = call(
        &tools,
        &session,
        "get_document",
        json!({ "collection_id": "dvd", "document_id": "d1" }),
    )
    .await;
    let stored = fetched.as_success().unwrap()["PriceHistory"]
        .as_array()
        .unwrap()
        .clone();
    assert_eq!(stored.len(), before_len + 1);
    assert_eq!(stored[0], first_entry);
    Ok(())
}

#[tokio::test]
async fn find_by_field_returns_id_and_data_pairs() -> Result<()> {
    let (session, tools) = setup();

    call(
        &tools,
        &session,
        "add_document",
        json!({
            "collection_id": "dvd",
            "data": { "Title": "Inception", "UPC": "12345" },
            "document_id": "abc"
        }),
    )
    .await;
    call(
        &tools,
        &session,
        "add_document",
        json!({ "collection_id": "dvd", "data": { "Title": "Memento" }, "document_id": "m1" }),
    )
    .await;

    let outcome = call(
        &tools,
        &session,
        "find_document_by_field",
        json!({ "collection_id": "dvd", "field": "Title", "value": "Inception" }),
    )
    .await;
    assert_eq!(
        outcome.as_success().unwrap(),
        &json!([{ "id": "abc", "data": { "Title": "Inception", "UPC": "12345" } }])
    );
    Ok(())
}

#[tokio::test]
async fn query_collection_supports_comparators_and_rejects_unknown_operators() -> Result<()> {
    let (session, tools) = setup();

    for (id, quantity) in [("q1", 1), ("q2", 3), ("q3", 5)] {
        call(
            &tools,
            &session,
            "add_document",
            json!({
                "collection_id": "dvd",
                "data": { "Title": id, "Quantity": quantity },
                "document_id": id
            }),
        )
        .await;
    }

    let outcome = call(
        &tools,
        &session,
        "query_collection",
        json!({ "collection_id": "dvd", "field": "Quantity", "operator": ">=", "value": 3 }),
    )
    .await;
    let results = outcome.as_success().and_then(Value::as_array).unwrap();
    assert_eq!(results.len(), 2);

    let bad = call(
        &tools,
        &session,
        "query_collection",
        json!({ "collection_id": "dvd", "field": "Quantity", "operator": "~", "value": 3 }),
    )
    .await;
    assert!(bad.is_failure());
    assert!(bad
        .into_value()["error"]
        .as_str()
        .unwrap()
        .contains("Unsupported operator"));
    Ok(())
}

#[tokio::test]
async fn inventory_summary_covers_all_categories_or_reports_none() -> Result<()> {
    let (session, tools) = setup();

    let empty = call(&tools, &session, "get_all_user_inventory", json!({})).await;
    assert_eq!(
        empty.as_success().unwrap(),
        &json!({ "message": "No inventory found for this user." })
    );

    call(
        &tools,
        &session,
        "add_document",
        json!({ "collection_id": "dvd", "data": { "Title": "Inception" }, "document_id": "i1" }),
    )
    .await;
    call(
        &tools,
        &session,
        "add_document",
        json!({ "collection_id": "bluray", "data": { "Title": "Arrival" }, "document_id": "a1" }),
    )
    .await;

    let categories = call(&tools, &session, "list_inventory_categories", json!({})).await;
    assert_eq!(
        categories.as_success().unwrap(),
        &json!(["bluray", "dvd"])
    );

    let all = call(&tools, &session, "get_all_user_inventory", json!({})).await;
    assert_eq!(
        all.as_success().unwrap(),
        &json!({
            "bluray": [{ "Title": "Arrival" }],
            "dvd": [{ "Title": "Inception" }]
        })
    );
    Ok(())
}

#[tokio::test]
async fn explicit_user_argument_scopes_the_operation() -> Result<()> {
    let (session, tools) = setup();
    session.set_user_id("42");

    // Written for the session user...
    call(
        &tools,
        &session,
        "add_document",
        json!({ "collection_id": "dvd", "data": { "Title": "Solaris" }, "document_id": "s1" }),
    )
    .await;

    // ...is invisible under an explicitly different user.
    let other = call(
        &tools,
        &session,
        "get_document",
        json!({ "collection_id": "dvd", "document_id": "s1", "user_id": "7" }),
    )
    .await;
    assert_eq!(
        other.as_success().unwrap(),
        &json!({ "error": "Document not found." })
    );

    let own = call(
        &tools,
        &session,
        "get_document",
        json!({ "collection_id": "dvd", "document_id": "s1" }),
    )
    .await;
    assert_eq!(own.as_success().unwrap(), &json!({ "Title": "Solaris" }));
    Ok(())
}

#[tokio::test]
async fn malformed_arguments_become_failure_messages() -> Result<()> {
    let (session, tools) = setup();

    // `data` missing entirely: the model gets a message it can act on.
    let outcome = call(
        &tools,
        &session,
        "add_document",
        json!({ "collection_id": "dvd" }),
    )
    .await;
    assert!(outcome.is_failure());
    assert!(outcome
        .into_value()["error"]
        .as_str()
        .unwrap()
        .starts_with("Invalid tool arguments"));
    Ok(())
}
