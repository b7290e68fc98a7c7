//! # Hierarchical Document Store
//!
//! The storage contract behind the inventory tools. Documents live at
//! `users/{user_id}/{category}/{document_id}`; field maps are opaque JSON
//! objects, and schema consistency across records is a convention enforced by
//! agent instructions, not by this layer.
//!
//! Not-found is *not* an error anywhere in this trait: it is the `None` (or
//! empty) arm of a successful return value. [`StoreError`] covers genuine
//! backend failures only, and the tool layer converts those into descriptive
//! messages before they reach the model.

pub mod memory;

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::fmt;
use thiserror::Error;

/// The opaque field map of one document.
pub type FieldMap = Map<String, Value>;

/// Errors raised by a document-store backend.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Store backend error: {0}")]
    Backend(String),
    #[error("Failed to serialize document fields: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    /// Wraps any backend failure into the opaque `Backend` variant.
    pub fn backend(err: impl fmt::Display) -> Self {
        StoreError::Backend(err.to_string())
    }
}

/// A category partition under one user: `users/{user_id}/{category}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CollectionPath {
    user_id: String,
    category: String,
}

impl CollectionPath {
    pub fn new(user_id: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            category: category.into(),
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn document(&self, document_id: impl Into<String>) -> DocumentPath {
        DocumentPath {
            collection: self.clone(),
            document_id: document_id.into(),
        }
    }
}

impl fmt::Display for CollectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "users/{}/{}", self.user_id, self.category)
    }
}

/// One document address: `users/{user_id}/{category}/{document_id}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentPath {
    collection: CollectionPath,
    document_id: String,
}

impl DocumentPath {
    pub fn collection(&self) -> &CollectionPath {
        &self.collection
    }

    pub fn document_id(&self) -> &str {
        &self.document_id
    }
}

impl fmt::Display for DocumentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.collection, self.document_id)
    }
}

/// Comparison operators accepted by [`DocumentStore::query_documents`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl FilterOp {
    /// Parses the operator notation used by the query tools.
    pub fn parse(op: &str) -> Option<Self> {
        match op {
            "==" => Some(FilterOp::Eq),
            "!=" => Some(FilterOp::Ne),
            "<" => Some(FilterOp::Lt),
            "<=" => Some(FilterOp::Le),
            ">" => Some(FilterOp::Gt),
            ">=" => Some(FilterOp::Ge),
            _ => None,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            FilterOp::Eq => "==",
            FilterOp::Ne => "!=",
            FilterOp::Lt => "<",
            FilterOp::Le => "<=",
            FilterOp::Gt => ">",
            FilterOp::Ge => ">=",
        }
    }

    /// Evaluates the operator against a candidate field value.
    ///
    /// Values of incomparable types never match, except under `!=` where a
    /// differing type counts as "not equal" (matching Firestore, which only
    /// considers documents that carry the field at all).
    pub fn matches(&self, candidate: &Value, target: &Value) -> bool {
        match compare_values(candidate, target) {
            Some(ordering) => match self {
                FilterOp::Eq => ordering == Ordering::Equal,
                FilterOp::Ne => ordering != Ordering::Equal,
                FilterOp::Lt => ordering == Ordering::Less,
                FilterOp::Le => ordering != Ordering::Greater,
                FilterOp::Gt => ordering == Ordering::Greater,
                FilterOp::Ge => ordering != Ordering::Less,
            },
            None => matches!(self, FilterOp::Ne),
        }
    }
}

fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        _ if a == b => Some(Ordering::Equal),
        _ => None,
    }
}

/// A single-field filter over one category partition.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldFilter {
    pub field: String,
    pub op: FilterOp,
    pub value: Value,
}

impl FieldFilter {
    pub fn new(field: impl Into<String>, op: FilterOp, value: Value) -> Self {
        Self {
            field: field.into(),
            op,
            value,
        }
    }

    pub fn equals(field: impl Into<String>, value: Value) -> Self {
        Self::new(field, FilterOp::Eq, value)
    }
}

/// The document-store contract shared by all backends.
///
/// Users and categories are created implicitly by the first document write.
/// Writes are last-writer-wins; no ordering is guaranteed for listings and
/// queries beyond whatever the backend returns.
#[async_trait]
pub trait DocumentStore: Send + Sync + fmt::Debug {
    /// The backend name, for logging.
    fn name(&self) -> &str;

    /// Fetches one document, or `None` when absent.
    async fn get_document(&self, path: &DocumentPath) -> Result<Option<FieldMap>, StoreError>;

    /// Creates or fully overwrites the document at `path`.
    async fn set_document(&self, path: &DocumentPath, fields: FieldMap) -> Result<(), StoreError>;

    /// Merge-patches the document at `path`, leaving unspecified fields
    /// untouched. Creates the document when absent.
    async fn merge_document(&self, path: &DocumentPath, fields: FieldMap)
        -> Result<(), StoreError>;

    /// Deletes the document at `path`. Deleting an absent document is a no-op.
    async fn delete_document(&self, path: &DocumentPath) -> Result<(), StoreError>;

    /// Lists every document in one category partition as `(id, fields)` pairs.
    async fn list_documents(
        &self,
        collection: &CollectionPath,
    ) -> Result<Vec<(String, FieldMap)>, StoreError>;

    /// Filters one category partition by a single-field comparison.
    async fn query_documents(
        &self,
        collection: &CollectionPath,
        filter: &FieldFilter,
    ) -> Result<Vec<(String, FieldMap)>, StoreError>;

    /// Enumerates the category partitions that currently exist under a user.
    async fn list_categories(&self, user_id: &str) -> Result<Vec<String>, StoreError>;
}
