use async_trait::async_trait;
use serde_json::Value;

use crate::{Result, types::RecordId};

/// Storage backend for named collections of JSON documents
///
/// Implementations must be safe to share across tasks; every halyard
/// workflow holds the store as an `Arc<dyn DocumentStore>` and issues
/// operations concurrently.
///
/// Inserted documents are assigned a fresh [`RecordId`], which the backend
/// also writes into the document itself under the `"id"` key so that a
/// document read back from a collection knows its own identity.
#[async_trait]
pub trait DocumentStore: Send + Sync + std::fmt::Debug {
    /// Return every document in a collection, oldest first.
    ///
    /// An unknown collection is an empty collection, not an error.
    async fn read_all(&self, collection: &str) -> Result<Vec<Value>>;

    /// Insert a single document, returning its assigned ID.
    async fn insert_one(&self, collection: &str, document: Value) -> Result<RecordId>;

    /// Insert a batch of documents, returning the assigned IDs in order.
    async fn insert_many(&self, collection: &str, documents: Vec<Value>) -> Result<Vec<RecordId>>;

    /// Replace an existing document wholesale, preserving its ID.
    ///
    /// # Errors
    /// Returns [`StoreError::NotFound`](crate::StoreError::NotFound) if the
    /// ID is not present in the collection.
    async fn overwrite(&self, collection: &str, id: &RecordId, document: Value) -> Result<()>;

    /// Delete a document by ID.
    ///
    /// # Errors
    /// Returns [`StoreError::NotFound`](crate::StoreError::NotFound) if the
    /// ID is not present in the collection.
    async fn delete(&self, collection: &str, id: &RecordId) -> Result<()>;

    /// Delete every document in a collection.
    async fn delete_all(&self, collection: &str) -> Result<()>;
}
