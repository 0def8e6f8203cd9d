use std::{
    io,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use serde_json::Value;
use tracing::warn;

use crate::{StoreError, document, r#trait::DocumentStore, types::RecordId};

/// File-backed document store
///
/// Each document is a pretty-printed JSON file at
/// `<root>/<collection>/<record id>.json`. The ULID file stem doubles as
/// the record ID, so listing a collection directory is enough to
/// enumerate it, and lexicographic filename order is creation order.
///
/// Durability is per-file: there is no cross-document transaction, which
/// matches the store contract the workflows are written against.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Open a store rooted at `root`, creating the directory if needed.
    ///
    /// # Errors
    /// Returns an error if the directory cannot be created or is not
    /// writable.
    pub fn open(root: impl Into<PathBuf>) -> crate::Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;

        let metadata = std::fs::metadata(&root)?;
        if !metadata.is_dir() {
            return Err(StoreError::Internal(format!(
                "store root is not a directory: {}",
                root.display()
            )));
        }
        if metadata.permissions().readonly() {
            return Err(StoreError::Internal(format!(
                "store root is not writable: {}",
                root.display()
            )));
        }

        Ok(Self { root })
    }

    /// The directory this store writes under
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn collection_dir(&self, collection: &str) -> PathBuf {
        self.root.join(collection)
    }

    fn document_path(&self, collection: &str, id: &RecordId) -> PathBuf {
        self.collection_dir(collection).join(format!("{id}.json"))
    }

    async fn write_document(
        &self,
        collection: &str,
        id: &RecordId,
        document: &Value,
    ) -> crate::Result<()> {
        let bytes = serde_json::to_vec_pretty(document)?;
        tokio::fs::write(self.document_path(collection, id), bytes).await?;
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for FileStore {
    async fn read_all(&self, collection: &str) -> crate::Result<Vec<Value>> {
        let dir = self.collection_dir(collection);
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            // A collection that was never written to is empty, not missing
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut documents: Vec<(RecordId, Value)> = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let stem = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or_default();

            let Some(id) = RecordId::from_file_stem(stem) else {
                // Editor droppings, partial writes under a temp name, etc.
                warn!(path = %path.display(), "skipping non-document file in collection");
                continue;
            };

            let bytes = tokio::fs::read(&path).await?;
            documents.push((id, serde_json::from_slice(&bytes)?));
        }

        documents.sort_by(|(a, _), (b, _)| a.cmp(b));
        Ok(documents.into_iter().map(|(_, doc)| doc).collect())
    }

    async fn insert_one(&self, collection: &str, mut document: Value) -> crate::Result<RecordId> {
        tokio::fs::create_dir_all(self.collection_dir(collection)).await?;

        let id = RecordId::generate();
        document::stamp_id(&mut document, &id);
        self.write_document(collection, &id, &document).await?;

        Ok(id)
    }

    async fn insert_many(
        &self,
        collection: &str,
        documents: Vec<Value>,
    ) -> crate::Result<Vec<RecordId>> {
        tokio::fs::create_dir_all(self.collection_dir(collection)).await?;

        let mut ids = Vec::with_capacity(documents.len());
        for mut document in documents {
            let id = RecordId::generate();
            document::stamp_id(&mut document, &id);
            self.write_document(collection, &id, &document).await?;
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
        let path = self.document_path(collection, id);
        if !tokio::fs::try_exists(&path).await? {
            return Err(StoreError::NotFound(id.clone()));
        }

        document::stamp_id(&mut document, id);
        self.write_document(collection, id, &document).await
    }

    async fn delete(&self, collection: &str, id: &RecordId) -> crate::Result<()> {
        match tokio::fs::remove_file(self.document_path(collection, id)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(StoreError::NotFound(id.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn delete_all(&self, collection: &str) -> crate::Result<()> {
        let dir = self.collection_dir(collection);
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        };

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let stem = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or_default();
            if RecordId::from_file_stem(stem).is_some() {
                tokio::fs::remove_file(&path).await?;
            }
        }

        Ok(())
    }
}
