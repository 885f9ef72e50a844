use crate::error::{IndexerError, ProviderError};
use crate::range::ScanRange;
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::rpc::types::{Filter, Log};
use alloy::transports::TransportResult;
use alloy_primitives::{Address, B256};
use async_trait::async_trait;
use std::future::IntoFuture;
use std::time::Duration;
use tokio::time::timeout;

/// An `eth_getLogs` query for one event signature on one contract.
///
/// `topic1`/`topic2` are wildcards when `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogQuery {
    pub contract: Address,
    pub topic0: B256,
    pub topic1: Option<B256>,
    pub topic2: Option<B256>,
    pub range: ScanRange,
}

impl LogQuery {
    pub fn to_filter(&self) -> Filter {
        let mut filter = Filter::new()
            .address(self.contract)
            .event_signature(self.topic0)
            .from_block(self.range.from_block)
            .to_block(self.range.to_block);

        if let Some(topic) = self.topic1 {
            filter = filter.topic1(topic);
        }
        if let Some(topic) = self.topic2 {
            filter = filter.topic2(topic);
        }
        filter
    }

    /// Whether a log's address and topics satisfy this query (block range excluded).
    pub fn matches_topics(&self, address: &Address, topics: &[B256]) -> bool {
        let topic_matches = |index: usize, wanted: Option<B256>| match wanted {
            Some(wanted) => topics.get(index) == Some(&wanted),
            None => true,
        };

        *address == self.contract
            && topics.first() == Some(&self.topic0)
            && topic_matches(1, self.topic1)
            && topic_matches(2, self.topic2)
    }
}

/// A single data-provider endpoint.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Endpoint URL, used for logging and error reports.
    fn url(&self) -> &str;

    /// `eth_blockNumber`
    async fn block_number(&self) -> Result<u64, ProviderError>;

    /// `eth_getLogs`
    async fn get_logs(&self, query: &LogQuery) -> Result<Vec<Log>, ProviderError>;
}

/// JSON-RPC over HTTP via an alloy provider.
pub struct AlloyClient {
    url: String,
    provider: DynProvider,
    request_timeout: Duration,
}

impl AlloyClient {
    pub fn new(url: &str, request_timeout: Duration) -> Result<Self, IndexerError> {
        let parsed_url = url
            .parse()
            .map_err(|_| IndexerError::Config(format!("Invalid RPC URL: {url}")))?;
        let provider = ProviderBuilder::new().connect_http(parsed_url).erased();

        Ok(AlloyClient {
            url: url.to_string(),
            provider,
            request_timeout,
        })
    }

    async fn bounded<T, F>(&self, request: F) -> Result<T, ProviderError>
    where
        F: IntoFuture<Output = TransportResult<T>>,
    {
        match timeout(self.request_timeout, request).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(ProviderError::from(e)),
            Err(_) => Err(ProviderError::Timeout(self.request_timeout)),
        }
    }
}

#[async_trait]
impl ChainClient for AlloyClient {
    fn url(&self) -> &str {
        &self.url
    }

    async fn block_number(&self) -> Result<u64, ProviderError> {
        self.bounded(self.provider.get_block_number()).await
    }

    async fn get_logs(&self, query: &LogQuery) -> Result<Vec<Log>, ProviderError> {
        let filter = query.to_filter();
        self.bounded(self.provider.get_logs(&filter)).await
    }
}
