//! In-process document store backend.
//!
//! Used by tests and by local development runs of the server. Mirrors the
//! hierarchical semantics of the production backend: categories exist only
//! while they contain documents, and users only while they have categories.

use super::{CollectionPath, DocumentPath, DocumentStore, FieldFilter, FieldMap, StoreError};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};

type Categories = BTreeMap<String, BTreeMap<String, FieldMap>>;

/// A thread-safe, in-memory [`DocumentStore`].
#[derive(Debug, Clone, Default)]
pub struct MemoryDocumentStore {
    users: Arc<RwLock<HashMap<String, Categories>>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn get_document(&self, path: &DocumentPath) -> Result<Option<FieldMap>, StoreError> {
        let users = self.users.read().expect("memory store lock poisoned");
        Ok(users
            .get(path.collection().user_id())
            .and_then(|categories| categories.get(path.collection().category()))
            .and_then(|documents| documents.get(path.document_id()))
            .cloned())
    }

    async fn set_document(&self, path: &DocumentPath, fields: FieldMap) -> Result<(), StoreError> {
        let mut users = self.users.write().expect("memory store lock poisoned");
        users
            .entry(path.collection().user_id().to_string())
            .or_default()
            .entry(path.collection().category().to_string())
            .or_default()
            .insert(path.document_id().to_string(), fields);
        Ok(())
    }

    async fn merge_document(
        &self,
        path: &DocumentPath,
        fields: FieldMap,
    ) -> Result<(), StoreError> {
        let mut users = self.users.write().expect("memory store lock poisoned");
        let document = users
            .entry(path.collection().user_id().to_string())
            .or_default()
            .entry(path.collection().category().to_string())
            .or_default()
            .entry(path.document_id().to_string())
            .or_default();
        for (key, value) in fields {
            document.insert(key, value);
        }
        Ok(())
    }

    async fn delete_document(&self, path: &DocumentPath) -> Result<(), StoreError> {
        let mut users = self.users.write().expect("memory store lock poisoned");
        if let Some(categories) = users.get_mut(path.collection().user_id()) {
            if let Some(documents) = categories.get_mut(path.collection().category()) {
                documents.remove(path.document_id());
                // Partitions exist only while they hold documents.
                if documents.is_empty() {
                    categories.remove(path.collection().category());
                }
            }
            if categories.is_empty() {
                users.remove(path.collection().user_id());
            }
        }
        Ok(())
    }

    async fn list_documents(
        &self,
        collection: &CollectionPath,
    ) -> Result<Vec<(String, FieldMap)>, StoreError> {
        let users = self.users.read().expect("memory store lock poisoned");
        Ok(users
            .get(collection.user_id())
            .and_then(|categories| categories.get(collection.category()))
            .map(|documents| {
                documents
                    .iter()
                    .map(|(id, fields)| (id.clone(), fields.clone()))
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn query_documents(
        &self,
        collection: &CollectionPath,
        filter: &FieldFilter,
    ) -> Result<Vec<(String, FieldMap)>, StoreError> {
        let documents = self.list_documents(collection).await?;
        Ok(documents
            .into_iter()
            .filter(|(_, fields)| {
                fields
                    .get(&filter.field)
                    .is_some_and(|value| filter.op.matches(value, &filter.value))
            })
            .collect())
    }

    async fn list_categories(&self, user_id: &str) -> Result<Vec<String>, StoreError> {
        let users = self.users.read().expect("memory store lock poisoned");
        Ok(users
            .get(user_id)
            .map(|categories| categories.keys().cloned().collect())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::FilterOp;
    use serde_json::json;

    fn fields(value: serde_json::Value) -> FieldMap {
        value.as_object().expect("object literal").clone()
    }

    #[tokio::test]
    async fn categories_disappear_with_their_last_document() {
        let store = MemoryDocumentStore::new();
        let path = CollectionPath::new("1", "dvd").document("abc");
        store
            .set_document(&path, fields(json!({"Title": "Heat"})))
            .await
            .unwrap();
        assert_eq!(store.list_categories("1").await.unwrap(), vec!["dvd"]);

        store.delete_document(&path).await.unwrap();
        assert!(store.list_categories("1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn query_skips_documents_missing_the_field() {
        let store = MemoryDocumentStore::new();
        let collection = CollectionPath::new("1", "dvd");
        store
            .set_document(&collection.document("a"), fields(json!({"Quantity": 2})))
            .await
            .unwrap();
        store
            .set_document(&collection.document("b"), fields(json!({"Title": "Alien"})))
            .await
            .unwrap();

        let filter = FieldFilter::new("Quantity", FilterOp::Ge, json!(1));
        let results = store.query_documents(&collection, &filter).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].0, "a");
    }
}
