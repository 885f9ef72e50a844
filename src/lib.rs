pub mod config;
pub mod error;
pub mod events;
pub mod indexer;
pub mod ownership;
pub mod query;
pub mod range;
pub mod repository;
pub mod rpc;

pub use error::{IndexerError, ProviderError};
pub use indexer::{IndexerSettings, OwnershipIndexer};
pub use query::{Freshness, OwnedTokens, OwnershipQuery};
pub use repository::{CheckpointStore, WalletCheckpoint};
