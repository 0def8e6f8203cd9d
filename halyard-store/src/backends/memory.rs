use std::{
    collections::{BTreeMap, HashMap},
    sync::{Arc, RwLock},
};

use async_trait::async_trait;
use serde_json::Value;

use crate::{StoreError, document, r#trait::DocumentStore, types::RecordId};

type Collections = HashMap<String, BTreeMap<RecordId, Value>>;

/// In-memory document store
///
/// Collections are `BTreeMap`s keyed by [`RecordId`], so iteration order is
/// oldest-first for free (ULIDs sort by creation time). Primarily intended
/// for tests, but usable for transient deployments that do not need the
/// data to survive a restart.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    pub(crate) collections: Arc<RwLock<Collections>>,
}

impl MemoryStore {
    /// Create a new empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents currently held in a collection
    ///
    /// Recovers gracefully if the lock is poisoned by accessing the
    /// underlying data.
    #[must_use]
    pub fn len(&self, collection: &str) -> usize {
        self.collections
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(collection)
            .map_or(0, BTreeMap::len)
    }

    /// Check whether a collection holds no documents
    #[must_use]
    pub fn is_empty(&self, collection: &str) -> bool {
        self.len(collection) == 0
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn read_all(&self, collection: &str) -> crate::Result<Vec<Value>> {
        Ok(self
            .collections
            .read()?
            .get(collection)
            .map(|docs| docs.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn insert_one(&self, collection: &str, mut document: Value) -> crate::Result<RecordId> {
        let id = RecordId::generate();
        document::stamp_id(&mut document, &id);

        self.collections
            .write()?
            .entry(collection.to_string())
            .or_default()
            .insert(id.clone(), document);

        Ok(id)
    }

    async fn insert_many(
        &self,
        collection: &str,
        documents: Vec<Value>,
    ) -> crate::Result<Vec<RecordId>> {
        let mut guard = self.collections.write()?;
        let docs = guard.entry(collection.to_string()).or_default();

        let mut ids = Vec::with_capacity(documents.len());
        for mut document in documents {
            let id = RecordId::generate();
            document::stamp_id(&mut document, &id);
            docs.insert(id.clone(), document);
            ids.push(id);
        }

        Ok(ids)
    }

    async fn overwrite(
        &self,
        collection: &str,
        id: &RecordId,
        mut document: Value,
    ) -> crate::Result<()> {
        let mut guard = self.collections.write()?;
        let docs = guard
            .get_mut(collection)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;

        if !docs.contains_key(id) {
            return Err(StoreError::NotFound(id.clone()));
        }

        document::stamp_id(&mut document, id);
        docs.insert(id.clone(), document);
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &RecordId) -> crate::Result<()> {
        self.collections
            .write()?
            .get_mut(collection)
            .and_then(|docs| docs.remove(id))
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        Ok(())
    }

    async fn delete_all(&self, collection: &str) -> crate::Result<()> {
        if let Some(docs) = self.collections.write()?.get_mut(collection) {
            docs.clear();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn basic_operations() {
        let store = MemoryStore::new();

        let id = store
            .insert_one("email_queue", json!({ "subject": "hello" }))
            .await
            .expect("insert");

        let docs = store.read_all("email_queue").await.expect("read");
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0]["subject"], json!("hello"));
        assert_eq!(docs[0]["id"], json!(id.to_string()));

        store.delete("email_queue", &id).await.expect("delete");
        assert!(store.is_empty("email_queue"));
    }

    #[tokio::test]
    async fn unknown_collection_reads_empty() {
        let store = MemoryStore::new();
        assert!(store.read_all("never_written").await.expect("read").is_empty());
    }

    #[tokio::test]
    async fn overwrite_preserves_identity() {
        let store = MemoryStore::new();
        let id = store
            .insert_one("email_settings", json!({ "queue_processing_status": true }))
            .await
            .expect("insert");

        store
            .overwrite(
                "email_settings",
                &id,
                json!({ "queue_processing_status": false }),
            )
            .await
            .expect("overwrite");

        let docs = store.read_all("email_settings").await.expect("read");
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0]["queue_processing_status"], json!(false));
        assert_eq!(docs[0]["id"], json!(id.to_string()));
    }

    #[tokio::test]
    async fn overwrite_missing_document_fails() {
        let store = MemoryStore::new();
        let err = store
            .overwrite("email_queue", &RecordId::generate(), json!({}))
            .await
            .expect_err("should not overwrite a missing document");
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn delete_missing_document_fails() {
        let store = MemoryStore::new();
        let err = store
            .delete("email_queue", &RecordId::generate())
            .await
            .expect_err("should not delete a missing document");
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn insert_many_assigns_distinct_ids_in_order() {
        let store = MemoryStore::new();
        let ids = store
            .insert_many(
                "positions",
                (0..50).map(|i| json!({ "row": i })).collect(),
            )
            .await
            .expect("insert");

        assert_eq!(ids.len(), 50);
        let unique = ids.iter().collect::<std::collections::HashSet<_>>();
        assert_eq!(unique.len(), 50, "all IDs should be unique");

        // Oldest-first iteration matches insertion order
        let docs = store.read_all("positions").await.expect("read");
        for (i, doc) in docs.iter().enumerate() {
            assert_eq!(doc["row"], json!(i));
        }
    }

    #[tokio::test]
    async fn delete_all_clears_only_the_named_collection() {
        let store = MemoryStore::new();
        store
            .insert_one("directory_users", json!({ "account": "adoe" }))
            .await
            .expect("insert");
        store
            .insert_one("positions", json!({ "title": "Registrar" }))
            .await
            .expect("insert");

        store.delete_all("directory_users").await.expect("delete all");

        assert!(store.is_empty("directory_users"));
        assert_eq!(store.len("positions"), 1);
    }
}
