pub mod checkpoint_repository;
pub mod database;
pub mod file_store;
pub mod memory;
pub mod models;

pub use checkpoint_repository::{CheckpointRepository, SqliteCheckpointStore};
pub use database::Database;
pub use file_store::JsonFileCheckpointStore;
pub use memory::MemoryCheckpointStore;
pub use models::WalletCheckpoint;

use crate::error::IndexerError;
use alloy_primitives::Address;
use async_trait::async_trait;
use std::sync::Arc;

/// Durable per-wallet checkpoints.
///
/// `put` replaces the wallet's whole record atomically; concurrent writers
/// for the same wallet resolve as last write wins.
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    /// Stored checkpoint, or a never-scanned empty one.
    async fn get(&self, wallet: Address) -> Result<WalletCheckpoint, IndexerError>;

    async fn put(&self, checkpoint: &WalletCheckpoint) -> Result<(), IndexerError>;

    async fn list(&self) -> Result<Vec<WalletCheckpoint>, IndexerError>;
}

/// Opens a store from a URL.
///
/// `sqlite:` or a `.db`/`.sqlite` path selects SQLite, `file:` or a `.json`
/// path selects the JSON file store, and `memory:` an in-process map.
pub fn open_store(url: &str) -> Result<Arc<dyn CheckpointStore>, IndexerError> {
    let url = url.trim();
    if url.is_empty() {
        return Err(IndexerError::Config("DATABASE_URL is empty".into()));
    }

    if url == "memory:" {
        return Ok(Arc::new(MemoryCheckpointStore::new()));
    }
    if let Some(path) = url.strip_prefix("file:") {
        return Ok(Arc::new(JsonFileCheckpointStore::new(path)));
    }
    if url.starts_with("sqlite:") || url.ends_with(".db") || url.ends_with(".sqlite") {
        return Ok(Arc::new(SqliteCheckpointStore::open(url)?));
    }
    if url.ends_with(".json") {
        return Ok(Arc::new(JsonFileCheckpointStore::new(url)));
    }

    Err(IndexerError::Config(format!(
        "unsupported DATABASE_URL {url:?}; use sqlite:<path>, file:<path>.json or memory:"
    )))
}
