use crate::config::Config;
use crate::error::IndexerError;
use crate::events::{EventLogReader, TransferFilter};
use crate::ownership;
use crate::range::partition;
use crate::repository::{CheckpointStore, WalletCheckpoint, open_store};
use crate::rpc::EndpointPool;
use alloy_primitives::Address;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy)]
pub struct IndexerSettings {
    pub contract: Option<Address>,
    pub genesis_block: u64,
    pub chunk_size: u64,
}

impl IndexerSettings {
    pub fn from_config(config: &Config) -> Self {
        IndexerSettings {
            contract: config.nft_contract_address,
            genesis_block: config.genesis_block,
            chunk_size: config.chunk_size,
        }
    }
}

/// Brings per-wallet ownership checkpoints up to the chain head.
pub struct OwnershipIndexer {
    pool: Arc<EndpointPool>,
    store: Arc<dyn CheckpointStore>,
    settings: IndexerSettings,
}

impl OwnershipIndexer {
    pub fn new(
        pool: Arc<EndpointPool>,
        store: Arc<dyn CheckpointStore>,
        settings: IndexerSettings,
    ) -> Self {
        OwnershipIndexer {
            pool,
            store,
            settings,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, IndexerError> {
        let pool = Arc::new(EndpointPool::from_config(config)?);
        let store = open_store(&config.database_url)?;
        Ok(Self::new(pool, store, IndexerSettings::from_config(config)))
    }

    pub fn settings(&self) -> &IndexerSettings {
        &self.settings
    }

    pub fn store(&self) -> &Arc<dyn CheckpointStore> {
        &self.store
    }

    pub async fn latest_block(&self) -> Result<u64, IndexerError> {
        self.pool.latest_block().await
    }

    /// Scans everything after the wallet's checkpoint up to the current head
    /// and persists the new state. On any error nothing is written.
    pub async fn refresh(&self, wallet: &str) -> Result<WalletCheckpoint, IndexerError> {
        let wallet = parse_wallet(wallet)?;
        let contract = self
            .settings
            .contract
            .ok_or(IndexerError::ContractNotConfigured)?;

        let started = Instant::now();
        let checkpoint = self.store.get(wallet).await?;
        let latest = self.pool.latest_block().await?;

        let start = match checkpoint.last_scanned_block {
            Some(last) => self.settings.genesis_block.max(last.saturating_add(1)),
            None => self.settings.genesis_block,
        };

        if start > latest {
            return self.advance_without_scan(checkpoint, latest).await;
        }

        let reader = EventLogReader::new(Arc::clone(&self.pool), contract);
        let ranges = partition(start, latest, self.settings.chunk_size);
        info!(
            "Scanning {:?} from block {} to {} in {} chunk(s)",
            wallet,
            start,
            latest,
            ranges.len()
        );

        let mut token_ids = checkpoint.token_ids;
        for (i, range) in ranges.iter().enumerate() {
            let incoming = reader
                .fetch_transfers(*range, TransferFilter::incoming(wallet))
                .await?;
            let outgoing = reader
                .fetch_transfers(*range, TransferFilter::outgoing(wallet))
                .await?;

            token_ids = ownership::apply(token_ids, &incoming, &outgoing);
            info!(
                "Chunk {}/{} blocks {}: {} in, {} out, {} held",
                i + 1,
                ranges.len(),
                range,
                incoming.len(),
                outgoing.len(),
                token_ids.len()
            );
        }

        let updated = WalletCheckpoint {
            wallet,
            last_scanned_block: Some(latest),
            token_ids,
        };
        self.store.put(&updated).await?;

        info!(
            "Refreshed {:?} through block {} ({} tokens) in {:.2?}",
            wallet,
            latest,
            updated.token_ids.len(),
            started.elapsed()
        );
        Ok(updated)
    }

    /// Persisted state for `wallet` without contacting any provider.
    pub async fn cached(&self, wallet: &str) -> Result<WalletCheckpoint, IndexerError> {
        let wallet = parse_wallet(wallet)?;
        self.store.get(wallet).await
    }

    async fn advance_without_scan(
        &self,
        checkpoint: WalletCheckpoint,
        latest: u64,
    ) -> Result<WalletCheckpoint, IndexerError> {
        let advances = checkpoint
            .last_scanned_block
            .is_none_or(|last| last < latest);
        if !advances {
            debug!(
                "{:?} already scanned through block {:?}, head is {}",
                checkpoint.wallet, checkpoint.last_scanned_block, latest
            );
            return Ok(checkpoint);
        }

        let updated = WalletCheckpoint {
            last_scanned_block: Some(latest),
            ..checkpoint
        };
        self.store.put(&updated).await?;
        debug!(
            "{:?} has no blocks to scan, checkpoint set to {}",
            updated.wallet, latest
        );
        Ok(updated)
    }
}

/// Parses a `0x`-prefixed 20-byte hex address, ignoring surrounding whitespace.
pub fn parse_wallet(raw: &str) -> Result<Address, IndexerError> {
    let trimmed = raw.trim();
    if !trimmed.starts_with("0x") && !trimmed.starts_with("0X") {
        return Err(IndexerError::InvalidWallet(raw.to_string()));
    }
    Address::from_str(trimmed).map_err(|_| IndexerError::InvalidWallet(raw.to_string()))
}
