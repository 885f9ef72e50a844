#![allow(dead_code)]

use alloy::rpc::types::Log;
use alloy::sol_types::SolEvent;
use alloy_primitives::{Address, B256, Bytes, LogData, U256, address};
use async_trait::async_trait;
use ownership_indexer::events::Transfer;
use ownership_indexer::range::ScanRange;
use ownership_indexer::repository::{CheckpointStore, MemoryCheckpointStore};
use ownership_indexer::rpc::{ChainClient, EndpointPool, ErrorClassifier, LogQuery, RetryPolicy};
use ownership_indexer::{
    IndexerError, IndexerSettings, OwnershipIndexer, ProviderError, WalletCheckpoint,
};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const CONTRACT: Address = address!("0x00000000000000000000000000000000000000c0");
pub const ALICE: Address = address!("0x00000000000000000000000000000000000000a1");
pub const BOB: Address = address!("0x00000000000000000000000000000000000000b0");
pub const CAROL: Address = address!("0x00000000000000000000000000000000000000ca");

pub fn wallet_str(wallet: Address) -> String {
    alloy_primitives::hex::encode_prefixed(wallet)
}

pub fn ids(values: &[u64]) -> Vec<U256> {
    values.iter().copied().map(U256::from).collect()
}

/// Shared fake chain: a head block and the contract's emitted logs.
#[derive(Default)]
pub struct MockChain {
    head: AtomicU64,
    logs: Mutex<Vec<Log>>,
}

impl MockChain {
    pub fn new(head: u64) -> Arc<Self> {
        let chain = MockChain::default();
        chain.head.store(head, Ordering::SeqCst);
        Arc::new(chain)
    }

    pub fn set_head(&self, head: u64) {
        self.head.store(head, Ordering::SeqCst);
    }

    pub fn head(&self) -> u64 {
        self.head.load(Ordering::SeqCst)
    }

    pub fn transfer(&self, from: Address, to: Address, token_id: u64, block: u64, log_index: u64) {
        let topics = vec![
            Transfer::SIGNATURE_HASH,
            from.into_word(),
            to.into_word(),
            B256::from(U256::from(token_id).to_be_bytes::<32>()),
        ];
        self.push(topics, block, log_index);
    }

    /// A transfer-shaped record with the token id topic missing.
    pub fn malformed(&self, from: Address, to: Address, block: u64, log_index: u64) {
        let topics = vec![Transfer::SIGNATURE_HASH, from.into_word(), to.into_word()];
        self.push(topics, block, log_index);
    }

    fn push(&self, topics: Vec<B256>, block: u64, log_index: u64) {
        let log = Log {
            inner: alloy_primitives::Log {
                address: CONTRACT,
                data: LogData::new_unchecked(topics, Bytes::new()),
            },
            block_number: Some(block),
            log_index: Some(log_index),
            ..Default::default()
        };
        self.logs.lock().unwrap().push(log);
    }

    fn query(&self, query: &LogQuery) -> Vec<Log> {
        self.logs
            .lock()
            .unwrap()
            .iter()
            .filter(|log| {
                let block = log.block_number.unwrap_or_default();
                block >= query.range.from_block
                    && block <= query.range.to_block
                    && query.matches_topics(&log.address(), log.topics())
            })
            .cloned()
            .collect()
    }
}

#[derive(Clone)]
pub enum Behaviour {
    Healthy,
    /// Every request fails with this error.
    Down(ProviderError),
    /// Log queries succeed `ok_calls` times, then always fail.
    FailLogsAfter { ok_calls: usize, error: ProviderError },
    /// Log queries spanning more than this many blocks are rejected.
    MaxRange(u64),
}

pub struct MockEndpoint {
    url: String,
    chain: Arc<MockChain>,
    behaviour: Behaviour,
    block_calls: AtomicUsize,
    log_calls: AtomicUsize,
    ranges: Mutex<Vec<ScanRange>>,
}

impl MockEndpoint {
    pub fn new(url: &str, chain: &Arc<MockChain>, behaviour: Behaviour) -> Arc<Self> {
        Arc::new(MockEndpoint {
            url: url.to_string(),
            chain: Arc::clone(chain),
            behaviour,
            block_calls: AtomicUsize::new(0),
            log_calls: AtomicUsize::new(0),
            ranges: Mutex::new(Vec::new()),
        })
    }

    pub fn healthy(url: &str, chain: &Arc<MockChain>) -> Arc<Self> {
        Self::new(url, chain, Behaviour::Healthy)
    }

    pub fn block_calls(&self) -> usize {
        self.block_calls.load(Ordering::SeqCst)
    }

    pub fn log_calls(&self) -> usize {
        self.log_calls.load(Ordering::SeqCst)
    }

    /// Ranges of every log query that returned successfully.
    pub fn ranges(&self) -> Vec<ScanRange> {
        self.ranges.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChainClient for MockEndpoint {
    fn url(&self) -> &str {
        &self.url
    }

    async fn block_number(&self) -> Result<u64, ProviderError> {
        self.block_calls.fetch_add(1, Ordering::SeqCst);
        match &self.behaviour {
            Behaviour::Down(error) => Err(error.clone()),
            _ => Ok(self.chain.head()),
        }
    }

    async fn get_logs(&self, query: &LogQuery) -> Result<Vec<Log>, ProviderError> {
        let call = self.log_calls.fetch_add(1, Ordering::SeqCst);
        match &self.behaviour {
            Behaviour::Down(error) => return Err(error.clone()),
            Behaviour::FailLogsAfter { ok_calls, error } if call >= *ok_calls => {
                return Err(error.clone());
            }
            Behaviour::MaxRange(max) if query.range.len() > *max => {
                return Err(ProviderError::Rpc {
                    code: -32005,
                    message: "query returned more than 10000 results".into(),
                });
            }
            _ => {}
        }

        self.ranges.lock().unwrap().push(query.range);
        Ok(self.chain.query(query))
    }
}

pub fn transient() -> ProviderError {
    ProviderError::Http {
        status: 503,
        body: "service unavailable".into(),
    }
}

pub fn fatal() -> ProviderError {
    ProviderError::Rpc {
        code: -32602,
        message: "invalid params".into(),
    }
}

pub fn pool(endpoints: &[Arc<MockEndpoint>]) -> Arc<EndpointPool> {
    let clients = endpoints
        .iter()
        .map(|e| Arc::clone(e) as Arc<dyn ChainClient>)
        .collect();
    let retry = RetryPolicy::new(2, Duration::from_millis(1)).without_jitter();
    Arc::new(EndpointPool::new(clients, ErrorClassifier::new(), retry).unwrap())
}

pub fn settings(genesis_block: u64, chunk_size: u64) -> IndexerSettings {
    IndexerSettings {
        contract: Some(CONTRACT),
        genesis_block,
        chunk_size,
    }
}

pub fn indexer(
    endpoints: &[Arc<MockEndpoint>],
    store: Arc<dyn CheckpointStore>,
    settings: IndexerSettings,
) -> OwnershipIndexer {
    OwnershipIndexer::new(pool(endpoints), store, settings)
}

/// Reads like an empty store; every write fails.
#[derive(Default)]
pub struct ReadOnlyStore {
    inner: MemoryCheckpointStore,
}

#[async_trait]
impl CheckpointStore for ReadOnlyStore {
    async fn get(&self, wallet: Address) -> Result<WalletCheckpoint, IndexerError> {
        self.inner.get(wallet).await
    }

    async fn put(&self, _checkpoint: &WalletCheckpoint) -> Result<(), IndexerError> {
        Err(IndexerError::Storage("disk is read-only".into()))
    }

    async fn list(&self) -> Result<Vec<WalletCheckpoint>, IndexerError> {
        self.inner.list().await
    }
}
