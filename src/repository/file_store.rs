use super::CheckpointStore;
use super::models::{WalletCheckpoint, wallet_key};
use crate::error::IndexerError;
use alloy_primitives::Address;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tokio::sync::Mutex;
use tracing::debug;

#[derive(Debug, Default, Serialize, Deserialize)]
struct CheckpointFile {
    wallets: BTreeMap<String, WalletCheckpoint>,
}

/// Checkpoints kept in a single JSON document.
///
/// Every `put` rewrites the file through a temporary sibling that is renamed
/// over the original, so readers never see a half-written document.
pub struct JsonFileCheckpointStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileCheckpointStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonFileCheckpointStore {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_file(&self) -> Result<CheckpointFile, IndexerError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.is_empty() => Ok(CheckpointFile::default()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(CheckpointFile::default()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_file(&self, file: CheckpointFile) -> Result<(), IndexerError> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || write_atomically(&path, &file))
            .await
            .map_err(|e| IndexerError::Storage(format!("checkpoint task failed: {e}")))?
    }
}

fn write_atomically(path: &Path, file: &CheckpointFile) -> Result<(), IndexerError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    serde_json::to_writer_pretty(&mut tmp, file)?;
    tmp.write_all(b"\n")?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| IndexerError::Storage(e.to_string()))?;

    debug!("Wrote checkpoint file {}", path.display());
    Ok(())
}

#[async_trait]
impl CheckpointStore for JsonFileCheckpointStore {
    async fn get(&self, wallet: Address) -> Result<WalletCheckpoint, IndexerError> {
        let _guard = self.lock.lock().await;
        let file = self.read_file().await?;
        Ok(file
            .wallets
            .get(&wallet_key(&wallet))
            .cloned()
            .unwrap_or_else(|| WalletCheckpoint::new(wallet)))
    }

    async fn put(&self, checkpoint: &WalletCheckpoint) -> Result<(), IndexerError> {
        let _guard = self.lock.lock().await;
        let mut file = self.read_file().await?;
        file.wallets
            .insert(wallet_key(&checkpoint.wallet), checkpoint.clone());
        self.write_file(file).await
    }

    async fn list(&self) -> Result<Vec<WalletCheckpoint>, IndexerError> {
        let _guard = self.lock.lock().await;
        let file = self.read_file().await?;
        Ok(file.wallets.into_values().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{U256, address};

    const WALLET: Address = address!("0x00000000000000000000000000000000000000aa");
    const OTHER: Address = address!("0x00000000000000000000000000000000000000bb");

    #[tokio::test]
    async fn missing_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileCheckpointStore::new(dir.path().join("checkpoints.json"));

        assert_eq!(store.get(WALLET).await.unwrap(), WalletCheckpoint::new(WALLET));
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn put_keeps_other_wallets() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("checkpoints.json");
        let store = JsonFileCheckpointStore::new(&path);

        let mut a = WalletCheckpoint::new(WALLET);
        a.last_scanned_block = Some(120);
        a.token_ids.insert(U256::from(7u64));
        let mut b = WalletCheckpoint::new(OTHER);
        b.last_scanned_block = Some(90);

        store.put(&a).await.unwrap();
        store.put(&b).await.unwrap();
        a.token_ids.clear();
        a.last_scanned_block = Some(130);
        store.put(&a).await.unwrap();

        let reopened = JsonFileCheckpointStore::new(&path);
        assert_eq!(reopened.get(WALLET).await.unwrap(), a);
        assert_eq!(reopened.get(OTHER).await.unwrap(), b);

        let raw: serde_json::Value =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        let entry = &raw["wallets"]["0x00000000000000000000000000000000000000bb"];
        assert_eq!(entry["lastScannedBlock"], 90);
    }

    #[tokio::test]
    async fn corrupt_file_is_a_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("checkpoints.json");
        std::fs::write(&path, b"{not json").unwrap();

        let store = JsonFileCheckpointStore::new(&path);
        assert!(matches!(
            store.get(WALLET).await,
            Err(IndexerError::Storage(_))
        ));
    }
}
