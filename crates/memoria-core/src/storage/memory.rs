//! In-memory corpus for tests and ephemeral indexes.

use super::{encoded_size, Corpus, StoreError};
use crate::search::types::{MemoryId, MemoryItem};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

#[derive(Debug, Default)]
struct Inner {
    /// id -> (insertion sequence, item)
    items: HashMap<MemoryId, (u64, MemoryItem)>,
    next_seq: u64,
}

/// In-memory corpus.
///
/// Stores everything in a `HashMap` and doesn't persist anything. Scans return
/// items in the order they were last written.
#[derive(Debug, Default)]
pub struct InMemoryCorpus {
    inner: RwLock<Inner>,
}

impl InMemoryCorpus {
    /// Creates a new empty corpus.
    pub fn new() -> Self {
        Self::default()
    }

    fn scan_filtered(&self, with_embedding_only: bool) -> Result<Vec<MemoryItem>, StoreError> {
        let inner = self
            .inner
            .read()
            .map_err(|e| StoreError::DatabaseError(format!("Lock poisoned: {}", e)))?;

        let mut entries: Vec<&(u64, MemoryItem)> = inner
            .items
            .values()
            .filter(|(_, item)| !with_embedding_only || item.embedding.is_some())
            .collect();
        entries.sort_by_key(|(seq, _)| *seq);

        Ok(entries.into_iter().map(|(_, item)| item.clone()).collect())
    }
}

#[async_trait]
impl Corpus for InMemoryCorpus {
    async fn get(&self, id: MemoryId) -> Result<Option<MemoryItem>, StoreError> {
        let inner = self
            .inner
            .read()
            .map_err(|e| StoreError::DatabaseError(format!("Lock poisoned: {}", e)))?;
        Ok(inner.items.get(&id).map(|(_, item)| item.clone()))
    }

    async fn put(&self, item: &MemoryItem) -> Result<(), StoreError> {
        let mut inner = self
            .inner
            .write()
            .map_err(|e| StoreError::DatabaseError(format!("Lock poisoned: {}", e)))?;
        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.items.insert(item.id, (seq, item.clone()));
        Ok(())
    }

    async fn delete(&self, id: MemoryId) -> Result<(), StoreError> {
        let mut inner = self
            .inner
            .write()
            .map_err(|e| StoreError::DatabaseError(format!("Lock poisoned: {}", e)))?;
        inner.items.remove(&id);
        Ok(())
    }

    async fn delete_all(&self) -> Result<(), StoreError> {
        let mut inner = self
            .inner
            .write()
            .map_err(|e| StoreError::DatabaseError(format!("Lock poisoned: {}", e)))?;
        inner.items.clear();
        Ok(())
    }

    async fn scan_all(&self) -> Result<Vec<MemoryItem>, StoreError> {
        self.scan_filtered(false)
    }

    async fn scan_with_embeddings(&self) -> Result<Vec<MemoryItem>, StoreError> {
        self.scan_filtered(true)
    }

    async fn count(&self) -> Result<usize, StoreError> {
        let inner = self
            .inner
            .read()
            .map_err(|e| StoreError::DatabaseError(format!("Lock poisoned: {}", e)))?;
        Ok(inner.items.len())
    }

    async fn count_with_embeddings(&self) -> Result<usize, StoreError> {
        let inner = self
            .inner
            .read()
            .map_err(|e| StoreError::DatabaseError(format!("Lock poisoned: {}", e)))?;
        Ok(inner
            .items
            .values()
            .filter(|(_, item)| item.embedding.is_some())
            .count())
    }

    async fn approximate_size_bytes(&self) -> Result<u64, StoreError> {
        let inner = self
            .inner
            .read()
            .map_err(|e| StoreError::DatabaseError(format!("Lock poisoned: {}", e)))?;
        inner
            .items
            .values()
            .map(|(_, item)| encoded_size(item))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::types::MemorySource;

    fn note(text: &str) -> MemoryItem {
        MemoryItem::new(text, MemorySource::UserNote)
    }

    #[tokio::test]
    async fn test_item_crud() {
        let corpus = InMemoryCorpus::new();
        let item = note("Hello world");

        assert!(corpus.get(item.id).await.unwrap().is_none());

        corpus.put(&item).await.unwrap();
        assert_eq!(corpus.get(item.id).await.unwrap(), Some(item.clone()));

        corpus.delete(item.id).await.unwrap();
        assert!(corpus.get(item.id).await.unwrap().is_none());

        // Deleting again is fine
        corpus.delete(item.id).await.unwrap();
    }

    #[tokio::test]
    async fn test_scans_follow_write_order() {
        let corpus = InMemoryCorpus::new();
        let items: Vec<MemoryItem> = (0..5).map(|i| note(&format!("item {i}"))).collect();
        for item in &items {
            corpus.put(item).await.unwrap();
        }

        let scanned: Vec<MemoryId> = corpus.scan_all().await.unwrap().iter().map(|i| i.id).collect();
        let expected: Vec<MemoryId> = items.iter().map(|i| i.id).collect();
        assert_eq!(scanned, expected);
    }

    #[tokio::test]
    async fn test_scan_with_embeddings_filters() {
        let corpus = InMemoryCorpus::new();
        corpus.put(&note("plain")).await.unwrap();
        let embedded = note("vector").with_embedding(vec![1.0, 0.0]);
        corpus.put(&embedded).await.unwrap();

        let scanned = corpus.scan_with_embeddings().await.unwrap();
        assert_eq!(scanned.len(), 1);
        assert_eq!(scanned[0].id, embedded.id);
        assert_eq!(corpus.count().await.unwrap(), 2);
        assert_eq!(corpus.count_with_embeddings().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_put_replaces() {
        let corpus = InMemoryCorpus::new();
        let mut item = note("first");
        corpus.put(&item).await.unwrap();
        item.content = "second".to_string();
        corpus.put(&item).await.unwrap();

        assert_eq!(corpus.count().await.unwrap(), 1);
        assert_eq!(corpus.get(item.id).await.unwrap().unwrap().content, "second");
    }

    #[tokio::test]
    async fn test_delete_all_and_size() {
        let corpus = InMemoryCorpus::new();
        assert_eq!(corpus.approximate_size_bytes().await.unwrap(), 0);

        corpus.put(&note("one")).await.unwrap();
        corpus.put(&note("two")).await.unwrap();
        assert!(corpus.approximate_size_bytes().await.unwrap() > 0);

        corpus.delete_all().await.unwrap();
        assert_eq!(corpus.count().await.unwrap(), 0);
        assert_eq!(corpus.approximate_size_bytes().await.unwrap(), 0);
    }
}
