pub mod commands;
pub mod formatters;

use crate::error::IndexerError;
use crate::indexer::OwnershipIndexer;
use crate::repository::WalletCheckpoint;
use alloy_primitives::{Address, U256};
use serde::{Serialize, Serializer};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Freshness {
    /// Scan up to the current head before answering.
    #[default]
    Refresh,
    /// Answer from the stored checkpoint only.
    Cached,
}

/// Answer to "which tokens does this wallet hold".
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnedTokens {
    pub wallet: Address,
    #[serde(serialize_with = "decimal_ids")]
    pub token_ids: Vec<U256>,
    pub last_scanned_block: Option<u64>,
}

impl From<WalletCheckpoint> for OwnedTokens {
    fn from(checkpoint: WalletCheckpoint) -> Self {
        OwnedTokens {
            wallet: checkpoint.wallet,
            token_ids: checkpoint.sorted_token_ids(),
            last_scanned_block: checkpoint.last_scanned_block,
        }
    }
}

fn decimal_ids<S: Serializer>(ids: &[U256], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(ids.iter().map(|id| id.to_string()))
}

/// Consumer-facing entry point over an [`OwnershipIndexer`].
#[derive(Clone)]
pub struct OwnershipQuery {
    indexer: Arc<OwnershipIndexer>,
}

impl OwnershipQuery {
    pub fn new(indexer: Arc<OwnershipIndexer>) -> Self {
        OwnershipQuery { indexer }
    }

    pub async fn owned_tokens(
        &self,
        wallet: &str,
        freshness: Freshness,
    ) -> Result<OwnedTokens, IndexerError> {
        let checkpoint = match freshness {
            Freshness::Refresh => self.indexer.refresh(wallet).await?,
            Freshness::Cached => self.indexer.cached(wallet).await?,
        };
        Ok(checkpoint.into())
    }

    pub async fn checkpoints(&self) -> Result<Vec<WalletCheckpoint>, IndexerError> {
        self.indexer.store().list().await
    }

    pub async fn head(&self) -> Result<u64, IndexerError> {
        self.indexer.latest_block().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    #[test]
    fn serializes_ids_as_decimal_strings() {
        let mut cp = WalletCheckpoint::new(address!("0x00000000000000000000000000000000000000aa"));
        cp.last_scanned_block = Some(120);
        cp.token_ids.insert(U256::from(10u64));
        cp.token_ids.insert(U256::from(7u64));

        let owned = OwnedTokens::from(cp);
        let json = serde_json::to_value(&owned).unwrap();
        assert_eq!(json["tokenIds"], serde_json::json!(["7", "10"]));
        assert_eq!(json["lastScannedBlock"], 120);
    }
}
