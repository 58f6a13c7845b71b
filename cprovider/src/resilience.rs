//! Fixed-backoff retry policy and operational hook contracts.
//!
//! ```rust
//! use std::time::Duration;
//! use cprovider::{ProviderError, RetryPolicy};
//!
//! let policy = RetryPolicy::new(2, Duration::from_millis(10));
//! assert!(policy.should_retry(1, &ProviderError::transport("reset")));
//! assert!(policy.should_retry(2, &ProviderError::transport("reset")));
//! assert!(!policy.should_retry(3, &ProviderError::transport("reset")));
//! assert!(!policy.should_retry(1, &ProviderError::authentication("bad key")));
//! ```

use std::future::Future;
use std::time::Duration;

use crate::ProviderError;

/// Retries transport faults up to `max_retries` times after the first attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 1,
            backoff: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, backoff: Duration) -> Self {
        Self {
            max_retries,
            backoff,
        }
    }

    pub fn no_retries() -> Self {
        Self::new(0, Duration::ZERO)
    }

    /// `attempt` is 1-based and names the attempt that just failed.
    pub fn should_retry(&self, attempt: u32, error: &ProviderError) -> bool {
        error.is_transport_fault() && attempt <= self.max_retries
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}

pub trait ProviderOperationHooks: Send + Sync {
    fn on_attempt_start(&self, _provider: &str, _operation: &str, _attempt: u32) {}

    fn on_retry_scheduled(
        &self,
        _provider: &str,
        _operation: &str,
        _attempt: u32,
        _delay: Duration,
        _error: &ProviderError,
    ) {
    }

    fn on_success(&self, _provider: &str, _operation: &str, _attempts: u32) {}

    fn on_failure(&self, _provider: &str, _operation: &str, _attempts: u32, _error: &ProviderError) {
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopOperationHooks;

impl ProviderOperationHooks for NoopOperationHooks {}

pub async fn execute_with_retry<T, Op, OpFuture, Sleep, SleepFuture>(
    provider: &str,
    operation: &str,
    policy: &RetryPolicy,
    hooks: &dyn ProviderOperationHooks,
    mut execute: Op,
    mut sleep: Sleep,
) -> Result<T, ProviderError>
where
    Op: FnMut(u32) -> OpFuture,
    OpFuture: Future<Output = Result<T, ProviderError>>,
    Sleep: FnMut(Duration) -> SleepFuture,
    SleepFuture: Future<Output = ()>,
{
    let mut attempt = 1;

    loop {
        hooks.on_attempt_start(provider, operation, attempt);

        match execute(attempt).await {
            Ok(value) => {
                hooks.on_success(provider, operation, attempt);
                return Ok(value);
            }
            Err(error) => {
                if policy.should_retry(attempt, &error) {
                    hooks.on_retry_scheduled(provider, operation, attempt, policy.backoff, &error);
                    sleep(policy.backoff).await;
                    attempt += 1;
                    continue;
                }

                hooks.on_failure(provider, operation, attempt, &error);
                return Err(error);
            }
        }
    }
}
