//! Multi-endpoint pool with round-robin rotation and retry-then-failover.

use crate::config::Config;
use crate::error::{IndexerError, ProviderError};
use crate::rpc::classify::{ErrorClass, ErrorClassifier};
use crate::rpc::client::{AlloyClient, ChainClient};
use crate::rpc::retry::RetryPolicy;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio_retry::RetryIf;
use tracing::{debug, warn};

pub struct EndpointPool {
    endpoints: Vec<Arc<dyn ChainClient>>,
    cursor: AtomicUsize,
    classifier: ErrorClassifier,
    retry: RetryPolicy,
}

impl EndpointPool {
    pub fn new(
        endpoints: Vec<Arc<dyn ChainClient>>,
        classifier: ErrorClassifier,
        retry: RetryPolicy,
    ) -> Result<Self, IndexerError> {
        if endpoints.is_empty() {
            return Err(IndexerError::Config(
                "At least one RPC URL must be provided".into(),
            ));
        }

        Ok(EndpointPool {
            endpoints,
            cursor: AtomicUsize::new(0),
            classifier,
            retry,
        })
    }

    /// Builds one HTTP client per configured URL.
    pub fn from_config(config: &Config) -> Result<Self, IndexerError> {
        let endpoints = config
            .json_rpc_urls
            .iter()
            .map(|url| {
                AlloyClient::new(url, config.request_timeout)
                    .map(|client| Arc::new(client) as Arc<dyn ChainClient>)
            })
            .collect::<Result<Vec<_>, _>>()?;

        let classifier = ErrorClassifier::new()
            .with_patterns(&config.transient_error_patterns)
            .map_err(|e| IndexerError::Config(format!("Invalid transient error pattern: {e}")))?;

        let retry = RetryPolicy::new(config.retry_attempts_per_endpoint, config.retry_backoff);

        Self::new(endpoints, classifier, retry)
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    pub fn urls(&self) -> Vec<&str> {
        self.endpoints.iter().map(|e| e.url()).collect()
    }

    /// Upper bound on attempts a single [`execute`](Self::execute) call makes.
    pub fn max_attempts(&self) -> usize {
        self.retry.max_attempts(self.endpoints.len())
    }

    /// Every endpoint once, starting at the cursor. The cursor advances by one
    /// per call so successive calls start on successive endpoints.
    pub fn select_order(&self) -> Vec<Arc<dyn ChainClient>> {
        let n = self.endpoints.len();
        let start = self.cursor.fetch_add(1, Ordering::Relaxed) % n;
        if n > 1 {
            debug!("Rotation starts at RPC provider #{}", start);
        }
        (0..n)
            .map(|i| Arc::clone(&self.endpoints[(start + i) % n]))
            .collect()
    }

    pub fn classify(&self, err: &ProviderError) -> ErrorClass {
        self.classifier.classify(err)
    }

    /// Runs `call` against the rotation: transient errors are retried on the
    /// same endpoint per the retry policy and then failed over; a fatal error
    /// aborts immediately.
    pub async fn execute<T, F, Fut>(
        &self,
        operation: &'static str,
        mut call: F,
    ) -> Result<T, IndexerError>
    where
        F: FnMut(Arc<dyn ChainClient>) -> Fut,
        Fut: Future<Output = Result<T, ProviderError>>,
    {
        let mut attempts = 0usize;
        let mut last_error = None;

        for endpoint in self.select_order() {
            let result = RetryIf::start(
                self.retry.backoff(),
                || {
                    attempts += 1;
                    call(Arc::clone(&endpoint))
                },
                |e: &ProviderError| {
                    let transient = self.classify(e).is_transient();
                    if transient {
                        warn!("{} transient error on {}: {}", operation, endpoint.url(), e);
                    }
                    transient
                },
            )
            .await;

            match result {
                Ok(value) => return Ok(value),
                Err(e) if self.classify(&e).is_transient() => {
                    warn!(
                        "{} retry budget spent on {}, failing over",
                        operation,
                        endpoint.url()
                    );
                    last_error = Some(e);
                }
                Err(e) => {
                    return Err(IndexerError::Provider {
                        operation,
                        endpoint: endpoint.url().to_string(),
                        source: e,
                    });
                }
            }
        }

        Err(IndexerError::ProviderExhausted {
            operation,
            attempts,
            last_error: last_error
                .unwrap_or_else(|| ProviderError::Transport("no endpoints attempted".into())),
        })
    }

    /// Current chain head via `eth_blockNumber`.
    pub async fn latest_block(&self) -> Result<u64, IndexerError> {
        self.execute("eth_blockNumber", |client| async move {
            client.block_number().await
        })
        .await
    }
}
