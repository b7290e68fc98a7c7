//! # `shelfkeep-firestore`: Firestore Document Store Backend
//!
//! This crate provides the production backend for the `shelfkeep` document
//! store as a self-contained plugin: a [`FirestoreDocumentStore`] implementing
//! the `DocumentStore` trait over the hierarchical layout
//! `users/{user_id}/{category}/{document_id}`, and a [`FirestoreMemorySink`]
//! that archives session transcripts into a top-level `memories` collection.

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use firestore::{FirestoreDb, FirestoreDbOptions, FirestoreDocument, FirestoreListingSupport};
use gcloud_sdk::google::firestore::v1 as firestore_v1;
use serde_json::{json, Map, Value};
use shelfkeep::memory::MemorySink;
use shelfkeep::session::SessionContext;
use shelfkeep::store::{
    CollectionPath, DocumentPath, DocumentStore, FieldFilter, FieldMap, FilterOp, StoreError,
};
use std::fmt;
use thiserror::Error;
use tokio_stream::StreamExt;
use tracing::{debug, info};

/// The root collection holding one document per user.
const USERS_COLLECTION: &str = "users";
/// The top-level collection receiving archived session transcripts.
const MEMORIES_COLLECTION: &str = "memories";

// --- Error Definitions ---

#[derive(Error, Debug)]
pub enum FirestoreBackendError {
    #[error("Firestore error: {0}")]
    Firestore(#[from] firestore::errors::FirestoreError),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<FirestoreBackendError> for StoreError {
    fn from(err: FirestoreBackendError) -> Self {
        StoreError::backend(err)
    }
}

/// Connects to a named Firestore database within a project.
///
/// Credentials come from the ambient Google application-default mechanism;
/// a `gcp_creds.json` file in the working directory takes precedence.
pub async fn connect_db(project_id: &str, database: &str) -> Result<FirestoreDb, StoreError> {
    if std::path::Path::new("gcp_creds.json").exists() {
        info!("Setting GOOGLE_APPLICATION_CREDENTIALS to use gcp_creds.json");
        std::env::set_var("GOOGLE_APPLICATION_CREDENTIALS", "gcp_creds.json");
    }

    let options = FirestoreDbOptions::new(project_id.to_string())
        .with_database_id(database.to_string());
    let db = FirestoreDb::with_options(options)
        .await
        .map_err(FirestoreBackendError::from)?;
    info!(project_id, database, "Connected to Firestore");
    Ok(db)
}

// --- Document Store ---

/// A [`DocumentStore`] over Google Firestore.
#[derive(Clone)]
pub struct FirestoreDocumentStore {
    db: FirestoreDb,
}

impl FirestoreDocumentStore {
    pub fn new(db: FirestoreDb) -> Self {
        Self { db }
    }

    /// Convenience constructor that also opens the connection.
    pub async fn connect(project_id: &str, database: &str) -> Result<Self, StoreError> {
        Ok(Self::new(connect_db(project_id, database).await?))
    }
}

impl fmt::Debug for FirestoreDocumentStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FirestoreDocumentStore").finish_non_exhaustive()
    }
}

#[async_trait]
impl DocumentStore for FirestoreDocumentStore {
    fn name(&self) -> &str {
        "firestore"
    }

    async fn get_document(&self, path: &DocumentPath) -> Result<Option<FieldMap>, StoreError> {
        let parent = self
            .db
            .parent_path(USERS_COLLECTION, path.collection().user_id())
            .map_err(FirestoreBackendError::from)?;

        let doc: Option<FirestoreDocument> = self
            .db
            .fluent()
            .select()
            .by_id_in(path.collection().category())
            .parent(&parent)
            .one(path.document_id())
            .await
            .map_err(FirestoreBackendError::from)?;

        doc.map(|d| document_fields(&d)).transpose().map_err(Into::into)
    }

    async fn set_document(&self, path: &DocumentPath, fields: FieldMap) -> Result<(), StoreError> {
        let parent = self
            .db
            .parent_path(USERS_COLLECTION, path.collection().user_id())
            .map_err(FirestoreBackendError::from)?;

        debug!(%path, "Writing document");
        // An update without a field mask replaces the whole document, and
        // upserts when it does not exist yet.
        self.db
            .fluent()
            .update()
            .in_col(path.collection().category())
            .document_id(path.document_id())
            .parent(&parent)
            .object(&Value::Object(fields))
            .execute::<Value>()
            .await
            .map_err(FirestoreBackendError::from)?;
        Ok(())
    }

    async fn merge_document(
        &self,
        path: &DocumentPath,
        fields: FieldMap,
    ) -> Result<(), StoreError> {
        let parent = self
            .db
            .parent_path(USERS_COLLECTION, path.collection().user_id())
            .map_err(FirestoreBackendError::from)?;

        let field_names: Vec<String> = fields.keys().cloned().collect();
        debug!(%path, fields = ?field_names, "Merging document");
        self.db
            .fluent()
            .update()
            .fields(field_names)
            .in_col(path.collection().category())
            .document_id(path.document_id())
            .parent(&parent)
            .object(&Value::Object(fields))
            .execute::<Value>()
            .await
            .map_err(FirestoreBackendError::from)?;
        Ok(())
    }

    async fn delete_document(&self, path: &DocumentPath) -> Result<(), StoreError> {
        let parent = self
            .db
            .parent_path(USERS_COLLECTION, path.collection().user_id())
            .map_err(FirestoreBackendError::from)?;

        debug!(%path, "Deleting document");
        self.db
            .fluent()
            .delete()
            .from(path.collection().category())
            .parent(&parent)
            .document_id(path.document_id())
            .execute()
            .await
            .map_err(FirestoreBackendError::from)?;
        Ok(())
    }

    async fn list_documents(
        &self,
        collection: &CollectionPath,
    ) -> Result<Vec<(String, FieldMap)>, StoreError> {
        let parent = self
            .db
            .parent_path(USERS_COLLECTION, collection.user_id())
            .map_err(FirestoreBackendError::from)?;

        let mut stream = self
            .db
            .fluent()
            .select()
            .from(collection.category())
            .parent(&parent)
            .stream_query_with_errors()
            .await
            .map_err(FirestoreBackendError::from)?;

        let mut documents = Vec::new();
        while let Some(doc) = stream
            .try_next()
            .await
            .map_err(FirestoreBackendError::from)?
        {
            documents.push((document_id(&doc), document_fields(&doc)?));
        }
        Ok(documents)
    }

    async fn query_documents(
        &self,
        collection: &CollectionPath,
        filter: &FieldFilter,
    ) -> Result<Vec<(String, FieldMap)>, StoreError> {
        let parent = self
            .db
            .parent_path(USERS_COLLECTION, collection.user_id())
            .map_err(FirestoreBackendError::from)?;

        let field = filter.field.clone();
        let op = filter.op;
        let value = filter.value.clone();
        let mut stream = self
            .db
            .fluent()
            .select()
            .from(collection.category())
            .parent(&parent)
            .filter(|q| {
                let expr = q.field(field.as_str());
                q.for_all([match op {
                    FilterOp::Eq => expr.eq(value.clone()),
                    FilterOp::Ne => expr.neq(value.clone()),
                    FilterOp::Lt => expr.less_than(value.clone()),
                    FilterOp::Le => expr.less_than_or_equal(value.clone()),
                    FilterOp::Gt => expr.greater_than(value.clone()),
                    FilterOp::Ge => expr.greater_than_or_equal(value.clone()),
                }])
            })
            .stream_query_with_errors()
            .await
            .map_err(FirestoreBackendError::from)?;

        let mut documents = Vec::new();
        while let Some(doc) = stream
            .try_next()
            .await
            .map_err(FirestoreBackendError::from)?
        {
            documents.push((document_id(&doc), document_fields(&doc)?));
        }
        Ok(documents)
    }

    async fn list_categories(&self, user_id: &str) -> Result<Vec<String>, StoreError> {
        use firestore::FirestoreListCollectionIdsParams;

        let parent = format!(
            "{}/{}/{}",
            self.db.get_documents_path(),
            USERS_COLLECTION,
            user_id
        );

        let mut categories = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let mut params =
                FirestoreListCollectionIdsParams::new().with_parent(parent.clone());
            if let Some(token) = page_token.take() {
                params = params.with_page_token(token);
            }
            let result = self
                .db
                .list_collection_ids(params)
                .await
                .map_err(FirestoreBackendError::from)?;
            categories.extend(result.collection_ids);
            match result.page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }
        Ok(categories)
    }
}

// --- Memory Sink ---

/// Archives session transcripts into the `memories` collection, one document
/// per session. Write-only; nothing in the system reads these back.
#[derive(Clone)]
pub struct FirestoreMemorySink {
    db: FirestoreDb,
}

impl FirestoreMemorySink {
    pub fn new(db: FirestoreDb) -> Self {
        Self { db }
    }
}

impl fmt::Debug for FirestoreMemorySink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FirestoreMemorySink").finish_non_exhaustive()
    }
}

#[async_trait]
impl MemorySink for FirestoreMemorySink {
    async fn archive(&self, session: &SessionContext) -> Result<(), StoreError> {
        let record = json!({
            "session_id": session.session_id(),
            "archived_at": Utc::now().to_rfc3339(),
            "transcript": session.transcript(),
        });

        debug!(session_id = %session.session_id(), "Archiving session transcript");
        self.db
            .fluent()
            .update()
            .in_col(MEMORIES_COLLECTION)
            .document_id(session.session_id())
            .object(&record)
            .execute::<Value>()
            .await
            .map_err(FirestoreBackendError::from)?;
        Ok(())
    }
}

// --- Helper Functions ---

fn document_id(doc: &FirestoreDocument) -> String {
    doc.name
        .split('/')
        .next_back()
        .unwrap_or_default()
        .to_string()
}

fn document_fields(doc: &FirestoreDocument) -> Result<FieldMap, FirestoreBackendError> {
    let mut fields = Map::new();
    for (name, value) in &doc.fields {
        fields.insert(name.clone(), decode_value(value.clone())?);
    }
    Ok(fields)
}

fn decode_value(value: firestore_v1::Value) -> Result<Value, FirestoreBackendError> {
    Ok(match value.value_type {
        Some(vt) => match vt {
            firestore_v1::value::ValueType::StringValue(s) => Value::String(s),
            firestore_v1::value::ValueType::IntegerValue(i) => Value::Number(i.into()),
            firestore_v1::value::ValueType::DoubleValue(d) => serde_json::Number::from_f64(d)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            firestore_v1::value::ValueType::BooleanValue(b) => Value::Bool(b),
            firestore_v1::value::ValueType::TimestampValue(ts) => {
                let dt = Utc
                    .timestamp_opt(ts.seconds, ts.nanos as u32)
                    .single()
                    .ok_or_else(|| {
                        FirestoreBackendError::Internal("Invalid timestamp".to_string())
                    })?;
                Value::String(dt.to_rfc3339())
            }
            firestore_v1::value::ValueType::MapValue(mv) => {
                let map = mv
                    .fields
                    .into_iter()
                    .map(|(k, v)| decode_value(v).map(|decoded| (k, decoded)))
                    .collect::<Result<Map<_, _>, _>>()?;
                Value::Object(map)
            }
            firestore_v1::value::ValueType::ArrayValue(av) => {
                let items = av
                    .values
                    .into_iter()
                    .map(decode_value)
                    .collect::<Result<Vec<_>, _>>()?;
                Value::Array(items)
            }
            firestore_v1::value::ValueType::NullValue(_) => Value::Null,
            _ => Value::Null,
        },
        None => Value::Null,
    })
}
