//! Retry-with-timeout executor.
//!
//! Wraps one fallible async operation with a bounded number of retries. Each
//! attempt gets its own hard timeout; an attempt that exceeds it is dropped
//! and counts as a failure. The last failure is returned as a `RetryError`
//! instead of propagating further; earlier failures are discarded silently,
//! so callers decide what to log.

use std::future::Future;
use std::time::Duration;

/// Retry policy for a single operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryOptions {
    /// Attempts after the first one.
    pub retries: u32,
    /// Timeout of each attempt.
    pub timeout: Duration,
}

/// Failure of the final attempt.
#[derive(Debug, thiserror::Error)]
pub enum RetryError {
    #[error("operation timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },
    #[error(transparent)]
    Failed(#[from] anyhow::Error),
}

/// Runs `operation` until it succeeds or `options.retries` extra attempts
/// have failed.
///
/// # Errors
///
/// Returns the error of the last attempt: `RetryError::Timeout` if it timed
/// out, `RetryError::Failed` with the operation's error otherwise.
pub async fn go<T, F, Fut>(mut operation: F, options: RetryOptions) -> Result<T, RetryError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = anyhow::Result<T>>,
{
    let timeout_ms = u64::try_from(options.timeout.as_millis()).unwrap_or(u64::MAX);
    let mut attempt: u32 = 0;
    loop {
        let error = match tokio::time::timeout(options.timeout, operation()).await {
            Ok(Ok(value)) => return Ok(value),
            Ok(Err(error)) => RetryError::Failed(error),
            Err(_elapsed) => RetryError::Timeout { timeout_ms },
        };
        if attempt >= options.retries {
            return Err(error);
        }
        attempt += 1;
    }
}
