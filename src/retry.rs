// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Fixed-delay retry for transient failures.
//!
//! The wait between attempts is an async sleep, so callers running on a
//! paused tokio clock observe exact timing without real delays.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use crate::error::DownloadError;

/// How many times an operation is attempted and how long to wait in between
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    /// Wait between two consecutive attempts
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            delay: Duration::from_secs(5),
        }
    }
}

/// Classifies errors as transient (worth another attempt) or permanent
pub trait IsRetryable {
    fn is_retryable(&self) -> bool;
}

impl IsRetryable for DownloadError {
    fn is_retryable(&self) -> bool {
        match self {
            // Anything that went wrong on the wire
            DownloadError::HttpFailed { .. } | DownloadError::StreamFailed { .. } => true,
            // Server-side and throttling statuses only
            DownloadError::HttpStatus { status, .. } => {
                *status >= 500 || matches!(status, 408 | 429)
            }
            DownloadError::FileCreateFailed { .. }
            | DownloadError::FileWriteFailed { .. }
            | DownloadError::FinalizeFailed { .. } => false,
            DownloadError::MissingEnclosure { .. } => false,
        }
    }
}

/// Run `operation` until it succeeds, fails permanently, or the policy is exhausted.
///
/// `operation` receives the 1-based attempt number. `on_retry` is called with
/// the failed attempt number and its error right before each wait.
pub async fn retry_with_policy<F, Fut, T, E, R>(
    policy: &RetryPolicy,
    mut on_retry: R,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: IsRetryable + Display,
    R: FnMut(u32, &E),
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match operation(attempt).await {
            Ok(result) => {
                if attempt > 1 {
                    tracing::info!(attempts = attempt, "Operation succeeded after retry");
                }
                return Ok(result);
            }
            Err(e) if e.is_retryable() && attempt < max_attempts => {
                tracing::warn!(
                    error = %e,
                    attempt,
                    max_attempts,
                    delay_ms = policy.delay.as_millis() as u64,
                    "Attempt failed, retrying"
                );
                on_retry(attempt, &e);

                tokio::time::sleep(policy.delay).await;
                attempt += 1;
            }
            Err(e) => {
                if e.is_retryable() {
                    tracing::error!(error = %e, attempts = attempt, "All attempts failed");
                } else {
                    tracing::error!(error = %e, attempt, "Permanent failure, not retrying");
                }
                return Err(e);
            }
        }
    }
}
