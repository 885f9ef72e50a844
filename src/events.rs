use crate::error::IndexerError;
use crate::range::ScanRange;
use crate::rpc::{EndpointPool, LogQuery, range_limit};
use alloy::rpc::types::Log;
use alloy::sol;
use alloy::sol_types::SolEvent;
use alloy_primitives::{Address, U256};
use anyhow::Context;
use std::sync::Arc;
use tracing::{debug, info, warn};

sol! {
    event Transfer(address indexed from, address indexed to, uint256 indexed tokenId);
}

/// One ownership change of a single token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferEvent {
    pub from: Address,
    pub to: Address,
    pub token_id: U256,
    pub block_number: u64,
    /// Position inside the block, when the provider reports it.
    pub log_index: Option<u64>,
}

/// Decodes a raw log. Errors mean the record is malformed for this event.
pub fn decode_transfer_event(log: &Log) -> anyhow::Result<TransferEvent> {
    let log_data = log.data();
    let decoded = Transfer::decode_raw_log(log.topics(), &log_data.data)?;
    let block_number = log.block_number.context("log has no block number")?;

    Ok(TransferEvent {
        from: decoded.from,
        to: decoded.to,
        token_id: decoded.tokenId,
        block_number,
        log_index: log.log_index,
    })
}

/// Address constraint on a transfer query. At most one side may be set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransferFilter {
    pub from: Option<Address>,
    pub to: Option<Address>,
}

impl TransferFilter {
    /// Transfers into `wallet`.
    pub fn incoming(wallet: Address) -> Self {
        TransferFilter {
            from: None,
            to: Some(wallet),
        }
    }

    /// Transfers out of `wallet`.
    pub fn outgoing(wallet: Address) -> Self {
        TransferFilter {
            from: Some(wallet),
            to: None,
        }
    }
}

/// Reads transfer events for one contract through the endpoint pool.
pub struct EventLogReader {
    pool: Arc<EndpointPool>,
    contract: Address,
}

impl EventLogReader {
    pub fn new(pool: Arc<EndpointPool>, contract: Address) -> Self {
        EventLogReader { pool, contract }
    }

    pub fn contract(&self) -> Address {
        self.contract
    }

    /// Transfers in `range` matching `filter`, in provider order.
    ///
    /// Malformed and reorged-out records are dropped with a warning.
    pub async fn fetch_transfers(
        &self,
        range: ScanRange,
        filter: TransferFilter,
    ) -> Result<Vec<TransferEvent>, IndexerError> {
        if filter.from.is_some() && filter.to.is_some() {
            return Err(IndexerError::InvalidInput(
                "a transfer query filters on either the sender or the recipient, not both".into(),
            ));
        }

        let logs = self.fetch_logs(range, filter).await?;
        let total = logs.len();
        let mut transfers = Vec::with_capacity(total);

        for log in logs {
            if log.removed {
                debug!("Skipping removed log in block {:?}", log.block_number);
                continue;
            }
            match decode_transfer_event(&log) {
                Ok(event) => transfers.push(event),
                Err(e) => {
                    warn!(
                        "Dropping malformed transfer log (block {:?}, tx {:?}): {}",
                        log.block_number, log.transaction_hash, e
                    );
                }
            }
        }

        if transfers.len() < total {
            info!(
                "Kept {} of {} transfer logs for blocks {}",
                transfers.len(),
                total,
                range
            );
        }

        Ok(transfers)
    }

    /// Issues `eth_getLogs`, splitting the range when a provider rejects it as
    /// too large. Sub-ranges are fetched in ascending block order.
    async fn fetch_logs(
        &self,
        range: ScanRange,
        filter: TransferFilter,
    ) -> Result<Vec<Log>, IndexerError> {
        let mut pending = vec![range];
        let mut logs = Vec::new();

        while let Some(current) = pending.pop() {
            let query = self.query(current, filter);
            let result = self
                .pool
                .execute("eth_getLogs", move |client| async move {
                    client.get_logs(&query).await
                })
                .await;

            match result {
                Ok(batch) => logs.extend(batch),
                Err(err) => {
                    let Some((lower, upper)) = split_rejected_range(&err, current) else {
                        return Err(err);
                    };
                    info!(
                        "Hit max results limit for blocks {}, splitting at block {}",
                        current, lower.to_block
                    );
                    pending.push(upper);
                    pending.push(lower);
                }
            }
        }

        Ok(logs)
    }

    fn query(&self, range: ScanRange, filter: TransferFilter) -> LogQuery {
        LogQuery {
            contract: self.contract,
            topic0: Transfer::SIGNATURE_HASH,
            topic1: filter.from.map(|a| a.into_word()),
            topic2: filter.to.map(|a| a.into_word()),
            range,
        }
    }
}

fn split_rejected_range(err: &IndexerError, range: ScanRange) -> Option<(ScanRange, ScanRange)> {
    let IndexerError::Provider { source, .. } = err else {
        return None;
    };
    let limit = range_limit(source)?;
    range.split_at(limit.suggested_to)
}
