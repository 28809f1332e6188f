//! In-memory document store, used by tests and `--db-path :memory:` runs.

use super::{
    apply_set, assign_id, upserted_document, Collection, DeleteResult, Document, DocumentStore,
    Filter, InsertOneResult, SortOrder, UpdateResult, ID_FIELD,
};
use anyhow::Result;
use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;

#[derive(Default)]
pub struct MemoryDocumentStore {
    collections: RwLock<HashMap<Collection, Vec<Document>>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn has_id(doc: &Document, id: &str) -> bool {
    doc.get(ID_FIELD).and_then(Value::as_str) == Some(id)
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn find_all(&self, collection: Collection, order: SortOrder) -> Result<Vec<Document>> {
        let collections = self.collections.read();
        let mut docs = collections.get(&collection).cloned().unwrap_or_default();
        if order == SortOrder::Newest {
            docs.reverse();
        }
        Ok(docs)
    }

    async fn find_one(&self, collection: Collection, filter: &Filter) -> Result<Option<Document>> {
        let collections = self.collections.read();
        Ok(collections
            .get(&collection)
            .and_then(|docs| docs.iter().find(|d| filter.matches(d)))
            .cloned())
    }

    async fn insert_one(&self, collection: Collection, mut doc: Document) -> Result<InsertOneResult> {
        let id = assign_id(&mut doc);
        let mut collections = self.collections.write();
        let docs = collections.entry(collection).or_default();
        if docs.iter().any(|d| has_id(d, &id)) {
            anyhow::bail!("Duplicate id {} in {}", id, collection.name());
        }
        docs.push(doc);

        Ok(InsertOneResult {
            acknowledged: true,
            inserted_id: id,
        })
    }

    async fn update_by_id(
        &self,
        collection: Collection,
        id: &str,
        set: Document,
        upsert: bool,
    ) -> Result<UpdateResult> {
        let mut collections = self.collections.write();
        let docs = collections.entry(collection).or_default();

        if let Some(doc) = docs.iter_mut().find(|d| has_id(d, id)) {
            let modified = apply_set(doc, &set);
            return Ok(UpdateResult {
                acknowledged: true,
                matched_count: 1,
                modified_count: u64::from(modified),
                upserted_id: None,
            });
        }

        if !upsert {
            return Ok(UpdateResult {
                acknowledged: true,
                matched_count: 0,
                modified_count: 0,
                upserted_id: None,
            });
        }

        docs.push(upserted_document(id, &set));
        Ok(UpdateResult {
            acknowledged: true,
            matched_count: 0,
            modified_count: 0,
            upserted_id: Some(id.to_string()),
        })
    }

    async fn delete_by_id(&self, collection: Collection, id: &str) -> Result<DeleteResult> {
        let mut collections = self.collections.write();
        let Some(docs) = collections.get_mut(&collection) else {
            return Ok(DeleteResult::deleted(0));
        };
        match docs.iter().position(|d| has_id(d, id)) {
            Some(index) => {
                docs.remove(index);
                Ok(DeleteResult::deleted(1))
            }
            None => Ok(DeleteResult::deleted(0)),
        }
    }

    async fn delete_many_by_ids(
        &self,
        collection: Collection,
        ids: &[String],
    ) -> Result<DeleteResult> {
        let mut collections = self.collections.write();
        let Some(docs) = collections.get_mut(&collection) else {
            return Ok(DeleteResult::deleted(0));
        };
        let before = docs.len();
        docs.retain(|d| !ids.iter().any(|id| has_id(d, id)));
        Ok(DeleteResult::deleted((before - docs.len()) as u64))
    }

    async fn count(&self, collection: Collection) -> Result<u64> {
        let collections = self.collections.read();
        Ok(collections.get(&collection).map_or(0, Vec::len) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_insert_and_find() {
        let store = MemoryDocumentStore::new();

        let res = store
            .insert_one(Collection::Users, doc(json!({"email": "a@b.com"})))
            .await
            .unwrap();
        assert!(res.acknowledged);

        let found = store
            .find_one(Collection::Users, &Filter::eq("email", "a@b.com"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.get(ID_FIELD), Some(&json!(res.inserted_id)));

        let by_id = store
            .find_by_id(Collection::Users, &res.inserted_id)
            .await
            .unwrap();
        assert_eq!(by_id, Some(found));

        // Collections are independent.
        assert_eq!(store.count(Collection::Blogs).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_find_all_order() {
        let store = MemoryDocumentStore::new();
        for n in 1..=3 {
            store
                .insert_one(Collection::Projects, doc(json!({"n": n})))
                .await
                .unwrap();
        }

        let oldest = store
            .find_all(Collection::Projects, SortOrder::Oldest)
            .await
            .unwrap();
        let newest = store
            .find_all(Collection::Projects, SortOrder::Newest)
            .await
            .unwrap();

        assert_eq!(oldest[0].get("n"), Some(&json!(1)));
        assert_eq!(newest[0].get("n"), Some(&json!(3)));
    }

    #[tokio::test]
    async fn test_update_and_upsert() {
        let store = MemoryDocumentStore::new();

        let res = store
            .update_by_id(Collection::Blogs, "b1", doc(json!({"name": "x"})), false)
            .await
            .unwrap();
        assert_eq!(res.matched_count, 0);
        assert_eq!(store.count(Collection::Blogs).await.unwrap(), 0);

        let res = store
            .update_by_id(Collection::Blogs, "b1", doc(json!({"name": "x"})), true)
            .await
            .unwrap();
        assert_eq!(res.upserted_id.as_deref(), Some("b1"));

        let res = store
            .update_by_id(Collection::Blogs, "b1", doc(json!({"name": "y"})), true)
            .await
            .unwrap();
        assert_eq!((res.matched_count, res.modified_count), (1, 1));

        let blog = store.find_by_id(Collection::Blogs, "b1").await.unwrap().unwrap();
        assert_eq!(blog.get("name"), Some(&json!("y")));
    }

    #[tokio::test]
    async fn test_delete() {
        let store = MemoryDocumentStore::new();
        let mut ids = Vec::new();
        for n in 0..3 {
            let res = store
                .insert_one(Collection::Carts, doc(json!({"n": n})))
                .await
                .unwrap();
            ids.push(res.inserted_id);
        }

        let res = store.delete_by_id(Collection::Carts, &ids[0]).await.unwrap();
        assert_eq!(res.deleted_count, 1);

        let res = store
            .delete_many_by_ids(Collection::Carts, &[ids[1].clone(), "nope".to_string()])
            .await
            .unwrap();
        assert_eq!(res.deleted_count, 1);
        assert_eq!(store.count(Collection::Carts).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_id_rejected() {
        let store = MemoryDocumentStore::new();
        store
            .insert_one(Collection::Users, doc(json!({"_id": "u1"})))
            .await
            .unwrap();
        assert!(store
            .insert_one(Collection::Users, doc(json!({"_id": "u1"})))
            .await
            .is_err());
    }
}
