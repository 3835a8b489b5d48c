use std::time::Duration;

use crate::retry::RetryOptions;

/// Processing limits for one pipeline run.
///
/// Controls authorization batching and the time budget of every suspension
/// point (chain reads and external API calls).
#[derive(Debug, Clone)]
pub struct ProcessingSettings {
    /// Maximum number of requests per batched authorization read.
    pub authorization_batch_size: usize,
    /// Hard timeout for a single chain read attempt.
    pub chain_call_timeout: Duration,
    /// Retries after the first failed chain read.
    pub chain_call_retries: u32,
    /// Hard timeout for an external API call. API calls are never retried.
    pub api_call_timeout: Duration,
}

impl ProcessingSettings {
    /// Retry policy applied to every chain read.
    #[must_use]
    pub fn chain_retry_options(&self) -> RetryOptions {
        RetryOptions {
            retries: self.chain_call_retries,
            timeout: self.chain_call_timeout,
        }
    }
}

impl Default for ProcessingSettings {
    fn default() -> Self {
        Self {
            authorization_batch_size: 10,
            chain_call_timeout: Duration::from_secs(10),
            chain_call_retries: 1,
            api_call_timeout: Duration::from_secs(20),
        }
    }
}
