//! In-memory document store.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use colloquy_common::AppResult;
use tokio::sync::RwLock;

use super::{Document, DocumentStore};

/// Process-local store backed by an ordered map.
///
/// Clones share the same underlying map. Queries return records in id
/// order.
#[derive(Debug)]
pub struct MemoryStore<D: Document> {
    records: Arc<RwLock<BTreeMap<String, D>>>,
}

impl<D: Document> Clone for MemoryStore<D> {
    fn clone(&self) -> Self {
        Self {
            records: Arc::clone(&self.records),
        }
    }
}

impl<D: Document> Default for MemoryStore<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: Document> MemoryStore<D> {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            records: Arc::new(RwLock::new(BTreeMap::new())),
        }
    }

    /// Number of records in the store.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Whether the store holds no records.
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl<D: Document> DocumentStore<D> for MemoryStore<D> {
    async fn get(&self, id: &str) -> AppResult<Option<D>> {
        Ok(self.records.read().await.get(id).cloned())
    }

    async fn query(&self, filter: &D::Filter) -> AppResult<Vec<D>> {
        Ok(self
            .records
            .read()
            .await
            .values()
            .filter(|doc| doc.matches(filter))
            .cloned()
            .collect())
    }

    async fn put(&self, doc: D) -> AppResult<()> {
        self.records
            .write()
            .await
            .insert(doc.id().to_string(), doc);
        Ok(())
    }

    async fn delete(&self, id: &str) -> AppResult<bool> {
        Ok(self.records.write().await.remove(id).is_some())
    }
}
