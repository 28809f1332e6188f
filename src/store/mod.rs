//! Document Storage
//! Mission: Schemaless JSON collections behind a narrow async interface
//!
//! Handlers and gates only ever see `Arc<dyn DocumentStore>`; the backend
//! (SQLite on disk, or in-memory for tests) is picked at startup.

pub mod memory;
pub mod sqlite;

pub use memory::MemoryDocumentStore;
pub use sqlite::SqliteDocumentStore;

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value};
use uuid::Uuid;

/// A stored JSON object.
pub type Document = Map<String, Value>;

/// Identifier field present on every stored document.
pub const ID_FIELD: &str = "_id";

/// Named collections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Users,
    Blogs,
    Projects,
    Payments,
    Carts,
}

impl Collection {
    pub const ALL: [Collection; 5] = [
        Collection::Users,
        Collection::Blogs,
        Collection::Projects,
        Collection::Payments,
        Collection::Carts,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Collection::Users => "users",
            Collection::Blogs => "blogs",
            Collection::Projects => "projects",
            Collection::Payments => "payments",
            Collection::Carts => "carts",
        }
    }
}

/// Result ordering for `find_all`, by insertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Oldest,
    Newest,
}

/// Conjunction of top-level field equalities.
#[derive(Debug, Clone, Default)]
pub struct Filter {
    fields: Vec<(String, Value)>,
}

impl Filter {
    pub fn eq(field: &str, value: impl Into<Value>) -> Self {
        Self::default().and(field, value)
    }

    pub fn and(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.fields.push((field.to_string(), value.into()));
        self
    }

    pub fn fields(&self) -> &[(String, Value)] {
        &self.fields
    }

    pub fn matches(&self, doc: &Document) -> bool {
        self.fields
            .iter()
            .all(|(field, value)| doc.get(field) == Some(value))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertOneResult {
    pub acknowledged: bool,
    pub inserted_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateResult {
    pub acknowledged: bool,
    pub matched_count: u64,
    pub modified_count: u64,
    pub upserted_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResult {
    pub acknowledged: bool,
    pub deleted_count: u64,
}

impl DeleteResult {
    pub fn deleted(count: u64) -> Self {
        Self {
            acknowledged: true,
            deleted_count: count,
        }
    }
}

/// Async document store shared by every request.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn find_all(&self, collection: Collection, order: SortOrder) -> Result<Vec<Document>>;

    /// First document (in insertion order) matching `filter`.
    async fn find_one(&self, collection: Collection, filter: &Filter) -> Result<Option<Document>>;

    async fn find_by_id(&self, collection: Collection, id: &str) -> Result<Option<Document>> {
        self.find_one(collection, &Filter::eq(ID_FIELD, id)).await
    }

    async fn insert_one(&self, collection: Collection, doc: Document) -> Result<InsertOneResult>;

    /// Overwrite the top-level fields in `set` on the document with `id`.
    /// With `upsert`, a missing document is created from `id` and `set`.
    async fn update_by_id(
        &self,
        collection: Collection,
        id: &str,
        set: Document,
        upsert: bool,
    ) -> Result<UpdateResult>;

    async fn delete_by_id(&self, collection: Collection, id: &str) -> Result<DeleteResult>;

    async fn delete_many_by_ids(&self, collection: Collection, ids: &[String])
        -> Result<DeleteResult>;

    async fn count(&self, collection: Collection) -> Result<u64>;
}

/// Fresh document id (32 lowercase hex chars).
pub fn new_document_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Ensure `doc` carries a string `_id`, keeping a caller-supplied one.
pub(crate) fn assign_id(doc: &mut Document) -> String {
    match doc.get(ID_FIELD).and_then(Value::as_str) {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => {
            let id = new_document_id();
            doc.insert(ID_FIELD.to_string(), Value::String(id.clone()));
            id
        }
    }
}

/// Apply a `$set`-style update. Returns whether anything changed.
/// The `_id` field is never rewritten.
pub(crate) fn apply_set(doc: &mut Document, set: &Document) -> bool {
    let mut modified = false;
    for (field, value) in set {
        if field == ID_FIELD {
            continue;
        }
        if doc.get(field) != Some(value) {
            doc.insert(field.clone(), value.clone());
            modified = true;
        }
    }
    modified
}

/// Document created by an upsert that matched nothing.
pub(crate) fn upserted_document(id: &str, set: &Document) -> Document {
    let mut doc = Document::new();
    doc.insert(ID_FIELD.to_string(), Value::String(id.to_string()));
    apply_set(&mut doc, set);
    doc
}
