use super::CheckpointStore;
use super::database::Database;
use super::models::{WalletCheckpoint, pad_token_id, parse_token_id, wallet_key};
use crate::error::IndexerError;
use alloy_primitives::Address;
use async_trait::async_trait;
use rusqlite::{OptionalExtension, params};
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

/// Synchronous checkpoint queries over a borrowed connection.
pub struct CheckpointRepository<'a> {
    conn: &'a rusqlite::Connection,
}

impl<'a> CheckpointRepository<'a> {
    const UPSERT_CHECKPOINT: &'static str =
        "INSERT INTO wallet_checkpoints (wallet, last_scanned_block, updated_at)
         VALUES (?1, ?2, ?3)
         ON CONFLICT(wallet) DO UPDATE SET
            last_scanned_block = excluded.last_scanned_block,
            updated_at = excluded.updated_at";

    const DELETE_TOKENS: &'static str = "DELETE FROM wallet_tokens WHERE wallet = ?1";

    const INSERT_TOKEN: &'static str =
        "INSERT OR IGNORE INTO wallet_tokens (wallet, token_id) VALUES (?1, ?2)";

    const GET_LAST_SCANNED_BLOCK: &'static str =
        "SELECT last_scanned_block FROM wallet_checkpoints WHERE wallet = ?1";

    const GET_TOKENS: &'static str =
        "SELECT token_id FROM wallet_tokens WHERE wallet = ?1 ORDER BY token_id";

    const LIST_WALLETS: &'static str = "SELECT wallet FROM wallet_checkpoints ORDER BY wallet";

    pub fn new(conn: &'a rusqlite::Connection) -> Self {
        Self { conn }
    }

    /// Stored checkpoint, or a never-scanned one if the wallet is unknown.
    pub fn load(&self, wallet: &Address) -> Result<WalletCheckpoint, IndexerError> {
        let key = wallet_key(wallet);
        let mut checkpoint = WalletCheckpoint::new(*wallet);

        let row: Option<Option<u64>> = self
            .conn
            .query_row(Self::GET_LAST_SCANNED_BLOCK, params![key], |row| row.get(0))
            .optional()?;
        let Some(last_scanned_block) = row else {
            return Ok(checkpoint);
        };
        checkpoint.last_scanned_block = last_scanned_block;

        let mut stmt = self.conn.prepare(Self::GET_TOKENS)?;
        let padded = stmt
            .query_map(params![key], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        for value in padded {
            let id = parse_token_id(&value).map_err(IndexerError::Storage)?;
            checkpoint.token_ids.insert(id);
        }

        Ok(checkpoint)
    }

    /// Replaces the wallet's whole record in one transaction.
    pub fn replace(&self, checkpoint: &WalletCheckpoint) -> Result<(), IndexerError> {
        let key = wallet_key(&checkpoint.wallet);
        let tx = self.conn.unchecked_transaction()?;

        tx.execute(
            Self::UPSERT_CHECKPOINT,
            params![key, checkpoint.last_scanned_block, unix_now()],
        )?;
        tx.execute(Self::DELETE_TOKENS, params![key])?;
        {
            let mut stmt = tx.prepare(Self::INSERT_TOKEN)?;
            for id in &checkpoint.token_ids {
                stmt.execute(params![key, pad_token_id(id)])?;
            }
        }

        tx.commit()?;
        Ok(())
    }

    pub fn list(&self) -> Result<Vec<WalletCheckpoint>, IndexerError> {
        let mut stmt = self.conn.prepare(Self::LIST_WALLETS)?;
        let keys = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        keys.iter()
            .map(|key| {
                let wallet = Address::from_str(key).map_err(|e| {
                    IndexerError::Storage(format!("invalid wallet key {key:?}: {e}"))
                })?;
                self.load(&wallet)
            })
            .collect()
    }
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}

/// SQLite-backed [`CheckpointStore`].
///
/// The connection is shared behind a mutex and driven from blocking tasks.
#[derive(Clone)]
pub struct SqliteCheckpointStore {
    db: Arc<Mutex<Database>>,
}

impl SqliteCheckpointStore {
    pub fn open(database_url: &str) -> Result<Self, IndexerError> {
        let db =
            Database::new(database_url).map_err(|e| IndexerError::Storage(format!("{e:#}")))?;
        Ok(Self::from_database(db))
    }

    pub fn from_database(db: Database) -> Self {
        SqliteCheckpointStore {
            db: Arc::new(Mutex::new(db)),
        }
    }

    async fn with_repository<T, F>(&self, f: F) -> Result<T, IndexerError>
    where
        T: Send + 'static,
        F: FnOnce(&CheckpointRepository) -> Result<T, IndexerError> + Send + 'static,
    {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || {
            let db = db
                .lock()
                .map_err(|_| IndexerError::Storage("checkpoint database lock poisoned".into()))?;
            f(&CheckpointRepository::new(&db.conn))
        })
        .await
        .map_err(|e| IndexerError::Storage(format!("checkpoint task failed: {e}")))?
    }
}

#[async_trait]
impl CheckpointStore for SqliteCheckpointStore {
    async fn get(&self, wallet: Address) -> Result<WalletCheckpoint, IndexerError> {
        self.with_repository(move |repo| repo.load(&wallet)).await
    }

    async fn put(&self, checkpoint: &WalletCheckpoint) -> Result<(), IndexerError> {
        let checkpoint = checkpoint.clone();
        self.with_repository(move |repo| repo.replace(&checkpoint)).await
    }

    async fn list(&self) -> Result<Vec<WalletCheckpoint>, IndexerError> {
        self.with_repository(|repo| repo.list()).await
    }
}
