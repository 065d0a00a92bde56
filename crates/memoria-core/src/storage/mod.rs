//! Corpus storage for memory items.
//!
//! The [`Corpus`] is the source of truth for item content and embeddings.
//! The keyword index is derived from it and can be rebuilt from a full scan at
//! any time, so nothing here stores index state.
//!
//! # Implementations
//!
//! - [`InMemoryCorpus`] - Insertion-ordered map, for tests and ephemeral use
//! - [`RedbCorpus`] - Persistent B-tree store (feature `redb-store`)

mod memory;

#[cfg(feature = "redb-store")]
mod redb_store;

pub use memory::InMemoryCorpus;

#[cfg(feature = "redb-store")]
pub use redb_store::RedbCorpus;

use crate::search::types::{MemoryId, MemoryItem};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Errors that can occur during corpus operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// I/O error
    #[error("I/O error: {0}")]
    IoError(String),

    /// Stored bytes could not be encoded or decoded
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Backend failure (transaction, table, lock)
    #[error("Database error: {0}")]
    DatabaseError(String),
}

/// Durable store of [`MemoryItem`]s keyed by id.
///
/// # Design Notes
///
/// - Every operation is self-contained; no transactions are exposed.
/// - `put` overwrites any item with the same id.
/// - `delete` of a missing id succeeds.
/// - Bulk scans skip records that cannot be decoded rather than failing the
///   whole scan. Point reads report them as [`StoreError::SerializationError`].
/// - Scan order is stable between calls that do not mutate the corpus. It is
///   backend-defined: [`InMemoryCorpus`] scans in write order, `RedbCorpus`
///   in key (id) order. Callers needing insertion order sort by `timestamp`.
#[async_trait]
pub trait Corpus: Send + Sync {
    /// Retrieves an item by id.
    ///
    /// Returns `Ok(None)` if the item doesn't exist.
    async fn get(&self, id: MemoryId) -> Result<Option<MemoryItem>, StoreError>;

    /// Stores an item, replacing any previous version.
    async fn put(&self, item: &MemoryItem) -> Result<(), StoreError>;

    /// Deletes an item by id.
    async fn delete(&self, id: MemoryId) -> Result<(), StoreError>;

    /// Removes every item.
    async fn delete_all(&self) -> Result<(), StoreError>;

    /// Returns all items.
    async fn scan_all(&self) -> Result<Vec<MemoryItem>, StoreError>;

    /// Returns all items that carry an embedding.
    async fn scan_with_embeddings(&self) -> Result<Vec<MemoryItem>, StoreError>;

    /// Number of stored items.
    async fn count(&self) -> Result<usize, StoreError> {
        Ok(self.scan_all().await?.len())
    }

    /// Number of stored items that carry an embedding.
    async fn count_with_embeddings(&self) -> Result<usize, StoreError> {
        Ok(self.scan_with_embeddings().await?.len())
    }

    /// Approximate bytes used by stored items.
    async fn approximate_size_bytes(&self) -> Result<u64, StoreError>;
}

#[async_trait]
impl<C: Corpus + ?Sized> Corpus for Arc<C> {
    async fn get(&self, id: MemoryId) -> Result<Option<MemoryItem>, StoreError> {
        (**self).get(id).await
    }

    async fn put(&self, item: &MemoryItem) -> Result<(), StoreError> {
        (**self).put(item).await
    }

    async fn delete(&self, id: MemoryId) -> Result<(), StoreError> {
        (**self).delete(id).await
    }

    async fn delete_all(&self) -> Result<(), StoreError> {
        (**self).delete_all().await
    }

    async fn scan_all(&self) -> Result<Vec<MemoryItem>, StoreError> {
        (**self).scan_all().await
    }

    async fn scan_with_embeddings(&self) -> Result<Vec<MemoryItem>, StoreError> {
        (**self).scan_with_embeddings().await
    }

    async fn count(&self) -> Result<usize, StoreError> {
        (**self).count().await
    }

    async fn count_with_embeddings(&self) -> Result<usize, StoreError> {
        (**self).count_with_embeddings().await
    }

    async fn approximate_size_bytes(&self) -> Result<u64, StoreError> {
        (**self).approximate_size_bytes().await
    }
}

/// Serializes an item's fields other than the embedding to JSON bytes.
pub(crate) fn encode_record(item: &MemoryItem) -> Result<Vec<u8>, StoreError> {
    let record = MemoryItem {
        embedding: None,
        ..item.clone()
    };
    serde_json::to_vec(&record)
        .map_err(|e| StoreError::SerializationError(format!("Failed to serialize item: {}", e)))
}

/// Deserializes a JSON record written by [`encode_record`].
#[cfg_attr(not(feature = "redb-store"), allow(dead_code))]
pub(crate) fn decode_record(bytes: &[u8]) -> Result<MemoryItem, StoreError> {
    serde_json::from_slice(bytes)
        .map_err(|e| StoreError::SerializationError(format!("Failed to deserialize item: {}", e)))
}

/// Serializes an embedding to raw bytes.
///
/// Format: little-endian f32 values packed sequentially (4 bytes per value).
#[cfg_attr(not(feature = "redb-store"), allow(dead_code))]
pub(crate) fn encode_embedding(embedding: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(embedding.len() * 4);
    for &val in embedding {
        bytes.extend_from_slice(&val.to_le_bytes());
    }
    bytes
}

/// Deserializes an embedding written by [`encode_embedding`].
#[cfg_attr(not(feature = "redb-store"), allow(dead_code))]
pub(crate) fn decode_embedding(bytes: &[u8]) -> Result<Vec<f32>, StoreError> {
    if bytes.len() % 4 != 0 {
        return Err(StoreError::SerializationError(format!(
            "Embedding length {} is not a multiple of 4",
            bytes.len()
        )));
    }
    Ok(bytes
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect())
}

/// Storage footprint of one item in the encoded form: key + record + embedding.
pub(crate) fn encoded_size(item: &MemoryItem) -> Result<u64, StoreError> {
    let record = encode_record(item)?.len();
    let embedding = item.embedding.as_ref().map_or(0, |e| e.len() * 4);
    Ok((16 + record + embedding) as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::types::MemorySource;

    #[test]
    fn test_record_omits_embedding() {
        let item = MemoryItem::new("note", MemorySource::UserNote).with_embedding(vec![1.0, 2.0]);
        let decoded = decode_record(&encode_record(&item).unwrap()).unwrap();

        assert_eq!(decoded.embedding, None);
        assert_eq!(decoded.content, "note");
        assert_eq!(decoded.id, item.id);
    }

    #[test]
    fn test_embedding_bytes() {
        let bytes = encode_embedding(&[1.0, -2.5]);
        assert_eq!(bytes.len(), 8);
        assert_eq!(decode_embedding(&bytes).unwrap(), vec![1.0, -2.5]);
        assert!(matches!(
            decode_embedding(&bytes[..7]),
            Err(StoreError::SerializationError(_))
        ));
    }

    #[test]
    fn test_encoded_size_counts_embedding() {
        let plain = MemoryItem::new("note", MemorySource::UserNote);
        let with_vec = plain.clone().with_embedding(vec![0.0; 4]);
        assert_eq!(
            encoded_size(&with_vec).unwrap(),
            encoded_size(&plain).unwrap() + 16
        );
    }
}
