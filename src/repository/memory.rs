use super::CheckpointStore;
use super::models::WalletCheckpoint;
use crate::error::IndexerError;
use alloy_primitives::Address;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// In-process store, used by tests and `memory:` URLs.
#[derive(Default)]
pub struct MemoryCheckpointStore {
    checkpoints: Mutex<HashMap<Address, WalletCheckpoint>>,
    writes: AtomicUsize,
}

impl MemoryCheckpointStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful `put` calls.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn lock(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<Address, WalletCheckpoint>>, IndexerError> {
        self.checkpoints
            .lock()
            .map_err(|_| IndexerError::Storage("checkpoint map lock poisoned".into()))
    }
}

#[async_trait]
impl CheckpointStore for MemoryCheckpointStore {
    async fn get(&self, wallet: Address) -> Result<WalletCheckpoint, IndexerError> {
        Ok(self
            .lock()?
            .get(&wallet)
            .cloned()
            .unwrap_or_else(|| WalletCheckpoint::new(wallet)))
    }

    async fn put(&self, checkpoint: &WalletCheckpoint) -> Result<(), IndexerError> {
        self.lock()?.insert(checkpoint.wallet, checkpoint.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn list(&self) -> Result<Vec<WalletCheckpoint>, IndexerError> {
        let mut all: Vec<_> = self.lock()?.values().cloned().collect();
        all.sort_by_key(|cp| cp.wallet);
        Ok(all)
    }
}
