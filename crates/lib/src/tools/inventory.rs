//! # Inventory Document Tools
//!
//! The CRUD and query tools the inventory agent exposes over the document
//! store. Every operation resolves the effective user the same way (explicit
//! argument, session value, default) and follows the message-returning
//! convention: store failures become descriptive strings, and not-found is a
//! structured sentinel value rather than an exception.

use crate::session::SessionContext;
use crate::store::{CollectionPath, DocumentStore, FieldFilter, FieldMap, FilterOp};
use crate::tools::{parse_args, Tool, ToolOutcome};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// Builds the full inventory tool set over a shared store handle.
pub fn inventory_toolset(store: &Arc<dyn DocumentStore>) -> Vec<Arc<dyn Tool>> {
    vec![
        Arc::new(GetDocumentTool::new(store.clone())),
        Arc::new(AddDocumentTool::new(store.clone())),
        Arc::new(UpdateDocumentTool::new(store.clone())),
        Arc::new(DeleteDocumentTool::new(store.clone())),
        Arc::new(FindDocumentByFieldTool::new(store.clone())),
        Arc::new(QueryCollectionTool::new(store.clone())),
        Arc::new(ListCategoriesTool::new(store.clone())),
        Arc::new(GetAllInventoryTool::new(store.clone())),
    ]
}

fn user_id_property() -> Value {
    json!({
        "type": "string",
        "description": "The ID of the user. If not provided, it is resolved from the session."
    })
}

fn collection_id_property() -> Value {
    json!({
        "type": "string",
        "description": "The inventory category (e.g. 'dvd', 'bluray', 'figures')."
    })
}

// --- get_document ---

pub struct GetDocumentTool {
    store: Arc<dyn DocumentStore>,
}

impl GetDocumentTool {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }
}

#[derive(Deserialize)]
struct GetDocumentArgs {
    collection_id: String,
    document_id: String,
    #[serde(default)]
    user_id: Option<String>,
}

#[async_trait]
impl Tool for GetDocumentTool {
    fn name(&self) -> &str {
        "get_document"
    }

    fn description(&self) -> &str {
        "Fetches a single inventory document from a category by its ID."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "collection_id": collection_id_property(),
                "document_id": { "type": "string", "description": "The ID of the document to retrieve." },
                "user_id": user_id_property(),
            },
            "required": ["collection_id", "document_id"]
        })
    }

    async fn call(&self, session: &SessionContext, args: Map<String, Value>) -> ToolOutcome {
        let args: GetDocumentArgs = match parse_args(args) {
            Ok(args) => args,
            Err(outcome) => return outcome,
        };
        let user_id = session.resolve_user_id(args.user_id.as_deref());
        let path = CollectionPath::new(user_id.as_str(), args.collection_id.as_str()).document(args.document_id.as_str());

        match self.store.get_document(&path).await {
            Ok(Some(fields)) => ToolOutcome::Success(Value::Object(fields)),
            Ok(None) => ToolOutcome::Success(json!({ "error": "Document not found." })),
            Err(e) => ToolOutcome::failure(format!(
                "An unexpected error occurred while fetching the document: {e}"
            )),
        }
    }
}

// --- add_document ---

pub struct AddDocumentTool {
    store: Arc<dyn DocumentStore>,
}

impl AddDocumentTool {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }
}

#[derive(Deserialize)]
struct AddDocumentArgs {
    collection_id: String,
    data: FieldMap,
    #[serde(default)]
    user_id: Option<String>,
    #[serde(default)]
    document_id: Option<String>,
}

#[async_trait]
impl Tool for AddDocumentTool {
    fn name(&self) -> &str {
        "add_document"
    }

    fn description(&self) -> &str {
        "Adds a new document to an inventory category. If no document_id is provided, one is generated."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "collection_id": collection_id_property(),
                "data": { "type": "object", "description": "The fields of the new document." },
                "user_id": user_id_property(),
                "document_id": { "type": "string", "description": "Optional ID for the new document." },
            },
            "required": ["collection_id", "data"]
        })
    }

    async fn call(&self, session: &SessionContext, args: Map<String, Value>) -> ToolOutcome {
        let args: AddDocumentArgs = match parse_args(args) {
            Ok(args) => args,
            Err(outcome) => return outcome,
        };
        let user_id = session.resolve_user_id(args.user_id.as_deref());
        let collection = CollectionPath::new(user_id.as_str(), args.collection_id.as_str());
        let document_id = args
            .document_id
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let path = collection.document(document_id.as_str());
        debug!(%path, "Adding inventory document");

        match self.store.set_document(&path, args.data).await {
            Ok(()) => ToolOutcome::success(format!(
                "Successfully added document '{document_id}' to collection '{collection}'."
            )),
            Err(e) => ToolOutcome::failure(format!(
                "An unexpected error occurred while adding the document: {e}"
            )),
        }
    }
}

// --- update_document ---

pub struct UpdateDocumentTool {
    store: Arc<dyn DocumentStore>,
}

impl UpdateDocumentTool {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }
}

#[derive(Deserialize)]
struct UpdateDocumentArgs {
    collection_id: String,
    document_id: String,
    data: FieldMap,
    #[serde(default)]
    user_id: Option<String>,
}

#[async_trait]
impl Tool for UpdateDocumentTool {
    fn name(&self) -> &str {
        "update_document"
    }

    fn description(&self) -> &str {
        "Updates an existing document, merging the new fields into it. Unspecified fields are left untouched."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "collection_id": collection_id_property(),
                "document_id": { "type": "string", "description": "The ID of the document to update." },
                "data": { "type": "object", "description": "The fields to merge into the document." },
                "user_id": user_id_property(),
            },
            "required": ["collection_id", "document_id", "data"]
        })
    }

    async fn call(&self, session: &SessionContext, args: Map<String, Value>) -> ToolOutcome {
        let args: UpdateDocumentArgs = match parse_args(args) {
            Ok(args) => args,
            Err(outcome) => return outcome,
        };
        let user_id = session.resolve_user_id(args.user_id.as_deref());
        let path = CollectionPath::new(user_id.as_str(), args.collection_id.as_str()).document(args.document_id.as_str());

        match self.store.merge_document(&path, args.data).await {
            Ok(()) => ToolOutcome::success(format!("Successfully updated document at '{path}'.")),
            Err(e) => ToolOutcome::failure(format!(
                "An unexpected error occurred while updating the document: {e}"
            )),
        }
    }
}

// --- delete_document ---

pub struct DeleteDocumentTool {
    store: Arc<dyn DocumentStore>,
}

impl DeleteDocumentTool {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }
}

#[derive(Deserialize)]
struct DeleteDocumentArgs {
    collection_id: String,
    document_id: String,
    #[serde(default)]
    user_id: Option<String>,
}

#[async_trait]
impl Tool for DeleteDocumentTool {
    fn name(&self) -> &str {
        "delete_document"
    }

    fn description(&self) -> &str {
        "Deletes a document from an inventory category."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "collection_id": collection_id_property(),
                "document_id": { "type": "string", "description": "The ID of the document to delete." },
                "user_id": user_id_property(),
            },
            "required": ["collection_id", "document_id"]
        })
    }

    async fn call(&self, session: &SessionContext, args: Map<String, Value>) -> ToolOutcome {
        let args: DeleteDocumentArgs = match parse_args(args) {
            Ok(args) => args,
            Err(outcome) => return outcome,
        };
        let user_id = session.resolve_user_id(args.user_id.as_deref());
        let path = CollectionPath::new(user_id.as_str(), args.collection_id.as_str()).document(args.document_id.as_str());

        // Existence check first: deleting a missing document must not look
        // like success to the model.
        match self.store.get_document(&path).await {
            Ok(Some(_)) => {}
            Ok(None) => {
                return ToolOutcome::failure(format!(
                    "Document '{}' not found.",
                    args.document_id
                ))
            }
            Err(e) => {
                return ToolOutcome::failure(format!(
                    "An unexpected error occurred while deleting the document: {e}"
                ))
            }
        }

        match self.store.delete_document(&path).await {
            Ok(()) => ToolOutcome::success(format!("Successfully deleted document at '{path}'.")),
            Err(e) => ToolOutcome::failure(format!(
                "An unexpected error occurred while deleting the document: {e}"
            )),
        }
    }
}

// --- find_document_by_field ---

pub struct FindDocumentByFieldTool {
    store: Arc<dyn DocumentStore>,
}

impl FindDocumentByFieldTool {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }
}

#[derive(Deserialize)]
struct FindDocumentByFieldArgs {
    collection_id: String,
    field: String,
    value: Value,
    #[serde(default)]
    user_id: Option<String>,
}

#[async_trait]
impl Tool for FindDocumentByFieldTool {
    fn name(&self) -> &str {
        "find_document_by_field"
    }

    fn description(&self) -> &str {
        "Finds documents in a category whose field equals a value. Use this to discover a document's ID when only a title or another property is known."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "collection_id": collection_id_property(),
                "field": { "type": "string", "description": "The document field to match (e.g. 'Title')." },
                "value": { "description": "The value the field must equal." },
                "user_id": user_id_property(),
            },
            "required": ["collection_id", "field", "value"]
        })
    }

    async fn call(&self, session: &SessionContext, args: Map<String, Value>) -> ToolOutcome {
        let args: FindDocumentByFieldArgs = match parse_args(args) {
            Ok(args) => args,
            Err(outcome) => return outcome,
        };
        let user_id = session.resolve_user_id(args.user_id.as_deref());
        let collection = CollectionPath::new(user_id.as_str(), args.collection_id.as_str());
        let filter = FieldFilter::equals(args.field.as_str(), args.value);

        match self.store.query_documents(&collection, &filter).await {
            Ok(results) => ToolOutcome::Success(Value::Array(
                results
                    .into_iter()
                    .map(|(id, data)| json!({ "id": id, "data": data }))
                    .collect(),
            )),
            Err(e) => ToolOutcome::failure(format!(
                "An unexpected error occurred while searching the collection: {e}"
            )),
        }
    }
}

// --- query_collection ---

pub struct QueryCollectionTool {
    store: Arc<dyn DocumentStore>,
}

impl QueryCollectionTool {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }
}

#[derive(Deserialize)]
struct QueryCollectionArgs {
    collection_id: String,
    field: String,
    operator: String,
    value: Value,
    #[serde(default)]
    user_id: Option<String>,
}

#[async_trait]
impl Tool for QueryCollectionTool {
    fn name(&self) -> &str {
        "query_collection"
    }

    fn description(&self) -> &str {
        "Performs a simple comparison query over one inventory category."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "collection_id": collection_id_property(),
                "field": { "type": "string", "description": "The document field to filter on." },
                "operator": { "type": "string", "description": "The comparison operator: ==, !=, <, <=, > or >=." },
                "value": { "description": "The value to compare against." },
                "user_id": user_id_property(),
            },
            "required": ["collection_id", "field", "operator", "value"]
        })
    }

    async fn call(&self, session: &SessionContext, args: Map<String, Value>) -> ToolOutcome {
        let args: QueryCollectionArgs = match parse_args(args) {
            Ok(args) => args,
            Err(outcome) => return outcome,
        };
        let Some(op) = FilterOp::parse(&args.operator) else {
            return ToolOutcome::failure(format!(
                "Unsupported operator '{}'. Use one of: ==, !=, <, <=, >, >=.",
                args.operator
            ));
        };
        let user_id = session.resolve_user_id(args.user_id.as_deref());
        let collection = CollectionPath::new(user_id.as_str(), args.collection_id.as_str());
        let filter = FieldFilter::new(args.field.as_str(), op, args.value);

        match self.store.query_documents(&collection, &filter).await {
            Ok(results) => ToolOutcome::Success(Value::Array(
                results
                    .into_iter()
                    .map(|(_, data)| Value::Object(data))
                    .collect(),
            )),
            Err(e) => ToolOutcome::failure(format!(
                "An unexpected error occurred while querying the collection: {e}"
            )),
        }
    }
}

// --- list_inventory_categories ---

pub struct ListCategoriesTool {
    store: Arc<dyn DocumentStore>,
}

impl ListCategoriesTool {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }
}

#[derive(Deserialize)]
struct ListCategoriesArgs {
    #[serde(default)]
    user_id: Option<String>,
}

#[async_trait]
impl Tool for ListCategoriesTool {
    fn name(&self) -> &str {
        "list_inventory_categories"
    }

    fn description(&self) -> &str {
        "Lists all inventory categories that exist for a user."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": { "user_id": user_id_property() }
        })
    }

    async fn call(&self, session: &SessionContext, args: Map<String, Value>) -> ToolOutcome {
        let args: ListCategoriesArgs = match parse_args(args) {
            Ok(args) => args,
            Err(outcome) => return outcome,
        };
        let user_id = session.resolve_user_id(args.user_id.as_deref());

        match self.store.list_categories(&user_id).await {
            Ok(categories) => ToolOutcome::Success(json!(categories)),
            Err(e) => ToolOutcome::failure(format!(
                "An unexpected error occurred while listing categories: {e}"
            )),
        }
    }
}

// --- get_all_user_inventory ---

pub struct GetAllInventoryTool {
    store: Arc<dyn DocumentStore>,
}

impl GetAllInventoryTool {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }
}

#[derive(Deserialize)]
struct GetAllInventoryArgs {
    #[serde(default)]
    user_id: Option<String>,
}

#[async_trait]
impl Tool for GetAllInventoryTool {
    fn name(&self) -> &str {
        "get_all_user_inventory"
    }

    fn description(&self) -> &str {
        "Fetches every inventory item across all categories for a user. Use this for summaries of the whole collection."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": { "user_id": user_id_property() }
        })
    }

    async fn call(&self, session: &SessionContext, args: Map<String, Value>) -> ToolOutcome {
        let args: GetAllInventoryArgs = match parse_args(args) {
            Ok(args) => args,
            Err(outcome) => return outcome,
        };
        let user_id = session.resolve_user_id(args.user_id.as_deref());

        let categories = match self.store.list_categories(&user_id).await {
            Ok(categories) => categories,
            Err(e) => {
                return ToolOutcome::failure(format!(
                    "An unexpected error occurred while fetching the inventory: {e}"
                ))
            }
        };

        let mut inventory = Map::new();
        for category in categories {
            let collection = CollectionPath::new(user_id.as_str(), category.as_str());
            match self.store.list_documents(&collection).await {
                Ok(documents) => {
                    inventory.insert(
                        category,
                        Value::Array(
                            documents
                                .into_iter()
                                .map(|(_, data)| Value::Object(data))
                                .collect(),
                        ),
                    );
                }
                Err(e) => {
                    return ToolOutcome::failure(format!(
                        "An unexpected error occurred while fetching the inventory: {e}"
                    ))
                }
            }
        }

        if inventory.is_empty() {
            ToolOutcome::Success(json!({ "message": "No inventory found for this user." }))
        } else {
            ToolOutcome::Success(Value::Object(inventory))
        }
    }
}
