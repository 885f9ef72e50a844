pub mod classify;
pub mod client;
pub mod pool;
pub mod retry;

pub use classify::{ErrorClass, ErrorClassifier, RangeLimit, range_limit};
pub use client::{AlloyClient, ChainClient, LogQuery};
pub use pool::EndpointPool;
pub use retry::RetryPolicy;
