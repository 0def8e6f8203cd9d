//! Accessors for singleton settings documents.
//!
//! Each workflow domain keeps exactly one settings document in its
//! collection. Provisioning creates it; these helpers read it, project
//! fields out of it, and write it back either wholesale or as a
//! partial merge of named fields. A collection with no document yields
//! [`StoreError::MissingSingleton`] rather than an index panic; a
//! collection with more than one document is outside the contract and the
//! first (oldest) document wins.

use serde::Serialize;
use serde_json::Value;

use crate::{
    DocumentStore, RecordId, StoreError, document::merge_fields,
};

/// Read the singleton document of `collection` along with its ID.
pub async fn load(
    store: &dyn DocumentStore,
    collection: &'static str,
) -> crate::Result<(RecordId, Value)> {
    let mut docs = store.read_all(collection).await?;
    if docs.is_empty() {
        return Err(StoreError::MissingSingleton(collection));
    }

    let doc = docs.swap_remove(0);
    let id = doc
        .get(crate::document::ID_FIELD)
        .and_then(Value::as_str)
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| {
            StoreError::Internal(format!("singleton in '{collection}' has no usable id"))
        })?;

    Ok((id, doc))
}

/// Replace the singleton document of `collection` wholesale.
pub async fn replace<T: Serialize + Sync>(
    store: &dyn DocumentStore,
    collection: &'static str,
    settings: &T,
) -> crate::Result<()> {
    let (id, _) = load(store, collection).await?;
    store
        .overwrite(collection, &id, serde_json::to_value(settings)?)
        .await
}

/// Merge the top-level fields of `patch` into the singleton document.
///
/// Only the fields named in the patch are overwritten; everything else in
/// the stored document is preserved.
pub async fn update(
    store: &dyn DocumentStore,
    collection: &'static str,
    patch: Value,
) -> crate::Result<()> {
    let (id, existing) = load(store, collection).await?;
    store
        .overwrite(collection, &id, merge_fields(existing, patch))
        .await
}
