use std::time::Duration;
use tokio_retry::strategy::{FibonacciBackoff, jitter};

/// Per-endpoint retry budget and backoff schedule.
///
/// An endpoint gets `attempts_per_endpoint` tries; the delays between them come
/// from [`RetryPolicy::backoff`]. A whole pool call is therefore bounded by
/// `endpoints * attempts_per_endpoint` attempts.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub attempts_per_endpoint: usize,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts_per_endpoint: 2,
            initial_backoff: Duration::from_millis(250),
            max_backoff: Duration::from_secs(5),
            jitter: true,
        }
    }
}

impl RetryPolicy {
    pub fn new(attempts_per_endpoint: usize, initial_backoff: Duration) -> Self {
        Self {
            attempts_per_endpoint: attempts_per_endpoint.max(1),
            initial_backoff,
            ..Default::default()
        }
    }

    /// Fixed delays without jitter, used where timing must be predictable.
    pub fn without_jitter(mut self) -> Self {
        self.jitter = false;
        self
    }

    /// Delays between consecutive attempts on one endpoint.
    pub fn backoff(&self) -> Vec<Duration> {
        let retries = self.attempts_per_endpoint.saturating_sub(1);
        let base_ms = self.initial_backoff.as_millis().max(1) as u64;
        let jittered = self.jitter;

        FibonacciBackoff::from_millis(base_ms)
            .max_delay(self.max_backoff)
            .map(|d| if jittered { jitter(d) } else { d })
            .take(retries)
            .collect()
    }

    pub fn max_attempts(&self, endpoints: usize) -> usize {
        endpoints * self.attempts_per_endpoint.max(1)
    }
}
