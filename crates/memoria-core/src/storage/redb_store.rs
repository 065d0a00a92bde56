//! Redb-backed corpus for native platforms.
//!
//! Uses [redb](https://github.com/cberner/redb) - a pure Rust, ACID-compliant,
//! embedded B-tree database.
//!
//! # Tables
//!
//! - `items`: MemoryId (16 bytes) -> MemoryItem without its embedding (JSON)
//! - `embeddings`: MemoryId (16 bytes) -> `Vec<f32>` (raw bytes, little-endian)
//!
//! Embeddings live in their own table so semantic scans touch only items that
//! have one, and so the vectors avoid JSON's size overhead.

use super::{
    decode_embedding, decode_record, encode_embedding, encode_record, Corpus, StoreError,
};
use crate::search::types::{MemoryId, MemoryItem};
use async_trait::async_trait;
use redb::{Database, ReadOnlyTable, ReadableTable, ReadableTableMetadata, TableDefinition};
use std::fmt::Display;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

const ITEMS_TABLE: TableDefinition<&[u8], &[u8]> = TableDefinition::new("items");
const EMBEDDINGS_TABLE: TableDefinition<&[u8], &[u8]> = TableDefinition::new("embeddings");

type BytesTable = ReadOnlyTable<&'static [u8], &'static [u8]>;

fn db_err<E: Display>(context: &'static str) -> impl FnOnce(E) -> StoreError {
    move |e| StoreError::DatabaseError(format!("{}: {}", context, e))
}

/// Redb-backed corpus.
///
/// All operations are ACID; `put` writes the record and its embedding in one
/// transaction.
///
/// # Example
///
/// ```ignore
/// use memoria_core::storage::RedbCorpus;
///
/// let corpus = RedbCorpus::open("./data/memories.redb")?;
/// corpus.put(&item).await?;
/// ```
pub struct RedbCorpus {
    db: Arc<Database>,
}

impl RedbCorpus {
    /// Opens or creates a redb database at the given path.
    ///
    /// Creates the database file and all required tables if they don't exist.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let db = Database::create(path.as_ref()).map_err(db_err("Failed to open database"))?;

        {
            let write_txn = db
                .begin_write()
                .map_err(db_err("Failed to begin write transaction"))?;
            write_txn
                .open_table(ITEMS_TABLE)
                .map_err(db_err("Failed to create items table"))?;
            write_txn
                .open_table(EMBEDDINGS_TABLE)
                .map_err(db_err("Failed to create embeddings table"))?;
            write_txn
                .commit()
                .map_err(db_err("Failed to commit table creation"))?;
        }

        debug!("Opened redb corpus at {}", path.as_ref().display());
        Ok(Self { db: Arc::new(db) })
    }

    fn open_read_tables(&self) -> Result<(BytesTable, BytesTable), StoreError> {
        let read_txn = self
            .db
            .begin_read()
            .map_err(db_err("Failed to begin read transaction"))?;
        let items = read_txn
            .open_table(ITEMS_TABLE)
            .map_err(db_err("Failed to open items table"))?;
        let embeddings = read_txn
            .open_table(EMBEDDINGS_TABLE)
            .map_err(db_err("Failed to open embeddings table"))?;
        Ok((items, embeddings))
    }

    /// Decodes one item and attaches its embedding, if any.
    fn load_item(
        items: &BytesTable,
        embeddings: &BytesTable,
        key: &[u8],
    ) -> Result<Option<MemoryItem>, StoreError> {
        let Some(record) = items.get(key).map_err(db_err("Failed to get item"))? else {
            return Ok(None);
        };
        let mut item = decode_record(record.value())?;

        if let Some(bytes) = embeddings
            .get(key)
            .map_err(db_err("Failed to get embedding"))?
        {
            item.embedding = Some(decode_embedding(bytes.value())?);
        }
        Ok(Some(item))
    }

    /// Loads every key of `source` that also has an item record, skipping
    /// records that fail to decode.
    fn scan(&self, with_embedding_only: bool) -> Result<Vec<MemoryItem>, StoreError> {
        let (items, embeddings) = self.open_read_tables()?;
        let driver = if with_embedding_only { &embeddings } else { &items };

        let mut keys = Vec::new();
        for entry in driver.iter().map_err(db_err("Failed to iterate corpus"))? {
            let (key, _) = entry.map_err(db_err("Failed to read corpus entry"))?;
            keys.push(key.value().to_vec());
        }

        let mut out = Vec::with_capacity(keys.len());
        for key in keys {
            match Self::load_item(&items, &embeddings, &key) {
                Ok(Some(item)) => out.push(item),
                Ok(None) => {
                    warn!("Embedding without item record ({} key bytes), skipping", key.len());
                }
                Err(StoreError::SerializationError(e)) => {
                    warn!("Skipping malformed corpus record: {}", e);
                }
                Err(e) => return Err(e),
            }
        }
        Ok(out)
    }

    fn remove_all(
        write_txn: &redb::WriteTransaction,
        table_def: TableDefinition<&[u8], &[u8]>,
        table_name: &str,
    ) -> Result<usize, StoreError> {
        let mut table = write_txn
            .open_table(table_def)
            .map_err(|e| StoreError::DatabaseError(format!("Failed to open {} table: {}", table_name, e)))?;
        let keys: Vec<Vec<u8>> = table
            .iter()
            .map_err(|e| StoreError::DatabaseError(format!("Failed to iterate {}: {}", table_name, e)))?
            .filter_map(|r| r.ok().map(|(k, _)| k.value().to_vec()))
            .collect();

        for key in &keys {
            table.remove(key.as_slice()).map_err(|e| {
                StoreError::DatabaseError(format!("Failed to remove key from {}: {}", table_name, e))
            })?;
        }
        Ok(keys.len())
    }
}

#[async_trait]
impl Corpus for RedbCorpus {
    async fn get(&self, id: MemoryId) -> Result<Option<MemoryItem>, StoreError> {
        let (items, embeddings) = self.open_read_tables()?;
        Self::load_item(&items, &embeddings, &id.to_bytes())
    }

    async fn put(&self, item: &MemoryItem) -> Result<(), StoreError> {
        let record = encode_record(item)?;
        let key = item.id.to_bytes();

        let write_txn = self
            .db
            .begin_write()
            .map_err(db_err("Failed to begin write transaction"))?;
        {
            let mut items = write_txn
                .open_table(ITEMS_TABLE)
                .map_err(db_err("Failed to open items table"))?;
            items
                .insert(key.as_slice(), record.as_slice())
                .map_err(db_err("Failed to insert item"))?;

            let mut embeddings = write_txn
                .open_table(EMBEDDINGS_TABLE)
                .map_err(db_err("Failed to open embeddings table"))?;
            match &item.embedding {
                Some(embedding) => {
                    let bytes = encode_embedding(embedding);
                    embeddings
                        .insert(key.as_slice(), bytes.as_slice())
                        .map_err(db_err("Failed to insert embedding"))?;
                }
                None => {
                    embeddings
                        .remove(key.as_slice())
                        .map_err(db_err("Failed to clear embedding"))?;
                }
            }
        }
        write_txn.commit().map_err(db_err("Failed to commit item"))?;

        Ok(())
    }

    async fn delete(&self, id: MemoryId) -> Result<(), StoreError> {
        let key = id.to_bytes();
        let write_txn = self
            .db
            .begin_write()
            .map_err(db_err("Failed to begin write transaction"))?;
        {
            // Remove returns Ok(None) if key didn't exist, which is fine
            write_txn
                .open_table(ITEMS_TABLE)
                .map_err(db_err("Failed to open items table"))?
                .remove(key.as_slice())
                .map_err(db_err("Failed to delete item"))?;
            write_txn
                .open_table(EMBEDDINGS_TABLE)
                .map_err(db_err("Failed to open embeddings table"))?
                .remove(key.as_slice())
                .map_err(db_err("Failed to delete embedding"))?;
        }
        write_txn
            .commit()
            .map_err(db_err("Failed to commit item deletion"))?;

        Ok(())
    }

    async fn delete_all(&self) -> Result<(), StoreError> {
        let write_txn = self
            .db
            .begin_write()
            .map_err(db_err("Failed to begin write transaction"))?;

        let removed = Self::remove_all(&write_txn, ITEMS_TABLE, "items")?;
        Self::remove_all(&write_txn, EMBEDDINGS_TABLE, "embeddings")?;

        write_txn.commit().map_err(db_err("Failed to commit clear"))?;
        debug!("Removed {} items from redb corpus", removed);

        Ok(())
    }

    async fn scan_all(&self) -> Result<Vec<MemoryItem>, StoreError> {
        self.scan(false)
    }

    async fn scan_with_embeddings(&self) -> Result<Vec<MemoryItem>, StoreError> {
        self.scan(true)
    }

    async fn count(&self) -> Result<usize, StoreError> {
        let (items, _) = self.open_read_tables()?;
        let count = items.len().map_err(db_err("Failed to get item count"))?;
        Ok(count as usize)
    }

    async fn count_with_embeddings(&self) -> Result<usize, StoreError> {
        let (_, embeddings) = self.open_read_tables()?;
        let count = embeddings
            .len()
            .map_err(db_err("Failed to get embedding count"))?;
        Ok(count as usize)
    }

    async fn approximate_size_bytes(&self) -> Result<u64, StoreError> {
        let (items, embeddings) = self.open_read_tables()?;

        let mut total = 0u64;
        for table in [&items, &embeddings] {
            for entry in table.iter().map_err(db_err("Failed to iterate corpus"))? {
                let (key, value) = entry.map_err(db_err("Failed to read corpus entry"))?;
                total += (key.value().len() + value.value().len()) as u64;
            }
        }
        Ok(total)
    }
}
