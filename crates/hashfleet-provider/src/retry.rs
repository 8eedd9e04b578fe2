//! Bounded exponential backoff for provider calls.
//!
//! Every call is retried only on [`SourceError::Transient`], at most
//! `max_attempts` times, and the whole operation (all pages, all retries)
//! is cut off at `timeout`. Either limit surfaces as
//! [`ProviderError::Unavailable`].

use std::future::Future;
use std::time::Duration;

use backoff::ExponentialBackoff;
use backoff::backoff::Backoff;
use tracing::{debug, warn};

use crate::error::{ProviderError, ProviderResult, SourceError};

/// Retry and time budget for one invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub initial_interval: Duration,
    pub max_interval: Duration,
    pub multiplier: f64,
    /// Attempts per call, including the first.
    pub max_attempts: u32,
    /// Overall budget for an operation, retries included.
    pub timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_interval: Duration::from_millis(100),
            max_interval: Duration::from_secs(2),
            multiplier: 2.0,
            max_attempts: 6,
            // Stays under the 10s function timeout the stack configures.
            timeout: Duration::from_secs(8),
        }
    }
}

impl RetryPolicy {
    fn backoff(&self) -> ExponentialBackoff {
        let mut backoff = ExponentialBackoff {
            current_interval: self.initial_interval,
            initial_interval: self.initial_interval,
            max_interval: self.max_interval,
            multiplier: self.multiplier,
            max_elapsed_time: Some(self.timeout),
            ..ExponentialBackoff::default()
        };
        backoff.reset();
        backoff
    }

    /// Run `call` until it succeeds, fails permanently, or the attempt
    /// budget runs out.
    pub async fn call<T, F, Fut>(&self, operation: &'static str, mut call: F) -> ProviderResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, SourceError>>,
    {
        let mut backoff = self.backoff();
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            let error = match call().await {
                Ok(value) => return Ok(value),
                Err(SourceError::Fatal(reason)) => {
                    return Err(ProviderError::Unavailable { operation, reason });
                }
                Err(SourceError::Transient(reason)) => reason,
            };

            if attempt >= self.max_attempts {
                warn!(operation, attempt, %error, "giving up after repeated transient failures");
                return Err(ProviderError::Unavailable {
                    operation,
                    reason: format!("{error} (gave up after {attempt} attempts)"),
                });
            }

            match backoff.next_backoff() {
                Some(delay) => {
                    debug!(operation, attempt, %error, ?delay, "transient provider failure, retrying");
                    tokio::time::sleep(delay).await;
                }
                None => {
                    return Err(ProviderError::Unavailable {
                        operation,
                        reason: format!("{error} (retry budget exhausted)"),
                    });
                }
            }
        }
    }

    /// Bound a whole operation by the overall timeout.
    pub async fn within_timeout<T, Fut>(&self, operation: &'static str, fut: Fut) -> ProviderResult<T>
    where
        Fut: Future<Output = ProviderResult<T>>,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result,
            Err(_) => {
                warn!(operation, timeout = ?self.timeout, "provider operation timed out");
                Err(ProviderError::Unavailable {
                    operation,
                    reason: format!("timed out after {:?}", self.timeout),
                })
            }
        }
    }
}
