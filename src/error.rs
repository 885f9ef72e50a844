use alloy::transports::{RpcError, TransportError, TransportErrorKind};
use std::time::Duration;
use thiserror::Error;

/// A failure reported by a single data-provider endpoint.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    /// JSON-RPC error object returned by the node.
    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    /// Non-success HTTP status from the endpoint.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// Connection-level failure.
    #[error("transport error: {0}")]
    Transport(String),

    #[error("request timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    /// The response could not be interpreted.
    #[error("invalid response: {0}")]
    Decode(String),
}

impl From<TransportError> for ProviderError {
    fn from(err: TransportError) -> Self {
        if let Some(payload) = err.as_error_resp() {
            return ProviderError::Rpc {
                code: payload.code,
                message: payload.message.to_string(),
            };
        }

        match err {
            RpcError::Transport(TransportErrorKind::HttpError(http)) => ProviderError::Http {
                status: http.status,
                body: http.body,
            },
            other => ProviderError::Transport(other.to_string()),
        }
    }
}

/// Errors surfaced by the ownership indexer.
#[derive(Debug, Error)]
pub enum IndexerError {
    #[error("invalid wallet address: {0:?}")]
    InvalidWallet(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("no target contract address configured")]
    ContractNotConfigured,

    /// Every endpoint failed with transient errors until the retry budget ran out.
    #[error("{operation} failed on all endpoints after {attempts} attempts: {last_error}")]
    ProviderExhausted {
        operation: &'static str,
        attempts: usize,
        last_error: ProviderError,
    },

    /// A provider rejected the request with a non-retryable error.
    #[error("{operation} rejected by {endpoint}: {source}")]
    Provider {
        operation: &'static str,
        endpoint: String,
        source: ProviderError,
    },

    #[error("storage error: {0}")]
    Storage(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl IndexerError {
    /// Returns `true` if a caller may retry the whole operation later.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ProviderExhausted { .. } | Self::Storage(_))
    }
}

impl From<rusqlite::Error> for IndexerError {
    fn from(err: rusqlite::Error) -> Self {
        IndexerError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for IndexerError {
    fn from(err: serde_json::Error) -> Self {
        IndexerError::Storage(err.to_string())
    }
}

impl From<std::io::Error> for IndexerError {
    fn from(err: std::io::Error) -> Self {
        IndexerError::Storage(err.to_string())
    }
}
