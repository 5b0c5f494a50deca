//! Retry with exponential backoff for transient network failures.
//!
//! Blocking: the sync job is single-threaded, so backoff is a thread sleep.

use std::thread;
use std::time::Duration;

use tracing::{debug, warn};

use blogsync_core::SyncConfig;

use crate::error::{FetchError, TransportError};

/// Configuration for retry behavior
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Maximum number of retry attempts (not including the initial attempt)
    pub max_retries: u32,

    /// Delay before the first retry
    pub initial_backoff: Duration,

    /// Upper bound on any single delay
    pub max_backoff: Duration,

    /// Backoff multiplier (2.0 for doubling)
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&SyncConfig::default())
    }
}

impl RetryPolicy {
    pub fn from_config(config: &SyncConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            initial_backoff: config.initial_backoff(),
            max_backoff: config.max_backoff(),
            multiplier: config.backoff_multiplier,
        }
    }

    /// No retries, no sleeping.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            initial_backoff: Duration::ZERO,
            max_backoff: Duration::ZERO,
            multiplier: 1.0,
        }
    }

    /// Delay before retry number `attempt + 1`.
    pub fn backoff_duration(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let base = self.initial_backoff.as_secs_f64() * self.multiplier.powi(exponent);
        let capped = base.min(self.max_backoff.as_secs_f64());
        Duration::from_secs_f64(capped.max(0.0))
    }
}

/// Run `operation`, retrying transient failures per `policy`.
///
/// Non-transient failures return immediately. The returned error records how
/// many attempts were made.
pub fn with_retry<T, F>(
    policy: &RetryPolicy,
    operation_name: &str,
    mut operation: F,
) -> Result<T, FetchError>
where
    F: FnMut() -> Result<T, TransportError>,
{
    let mut attempt = 0;

    loop {
        match operation() {
            Ok(value) => return Ok(value),
            Err(err) if !err.is_transient() => {
                debug!(
                    operation = operation_name,
                    attempt = attempt + 1,
                    cause = %err.cause(),
                    "non-retryable failure: {err}"
                );
                return Err(FetchError::Unavailable {
                    attempts: attempt + 1,
                    source: err,
                });
            }
            Err(err) if attempt >= policy.max_retries => {
                warn!(
                    operation = operation_name,
                    attempts = attempt + 1,
                    cause = %err.cause(),
                    "giving up after {} attempt(s): {err}",
                    attempt + 1
                );
                return Err(FetchError::Unavailable {
                    attempts: attempt + 1,
                    source: err,
                });
            }
            Err(err) => {
                let backoff = policy.backoff_duration(attempt);
                warn!(
                    operation = operation_name,
                    attempt = attempt + 1,
                    max_attempts = policy.max_retries + 1,
                    cause = %err.cause(),
                    backoff_ms = backoff.as_millis() as u64,
                    "retrying after error: {err}"
                );
                if !backoff.is_zero() {
                    thread::sleep(backoff);
                }
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailureCause;

    fn network(cause: FailureCause) -> TransportError {
        TransportError::Network {
            url: "http://wp/posts".into(),
            cause,
            detail: "test".into(),
        }
    }

    fn quick(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            ..RetryPolicy::none()
        }
    }

    #[test]
    fn backoff_doubles_and_caps() {
        let policy = RetryPolicy {
            max_retries: 5,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(2),
            multiplier: 2.0,
        };
        assert_eq!(policy.backoff_duration(0), Duration::from_millis(500));
        assert_eq!(policy.backoff_duration(1), Duration::from_secs(1));
        assert_eq!(policy.backoff_duration(2), Duration::from_secs(2));
        assert_eq!(policy.backoff_duration(6), Duration::from_secs(2));
    }

    #[test]
    fn default_policy_uses_two_retries() {
        assert_eq!(RetryPolicy::default().max_retries, 2);
    }

    #[test]
    fn succeeds_after_transient_failures() {
        let mut attempts = 0;
        let result = with_retry(&quick(2), "test", || {
            attempts += 1;
            if attempts < 3 {
                Err(network(FailureCause::Refused))
            } else {
                Ok("ok")
            }
        });
        assert_eq!(result.unwrap(), "ok");
        assert_eq!(attempts, 3);
    }

    #[test]
    fn gives_up_after_budget() {
        let mut attempts = 0;
        let result: Result<(), _> = with_retry(&quick(2), "test", || {
            attempts += 1;
            Err(network(FailureCause::Timeout))
        });
        assert_eq!(attempts, 3, "initial + 2 retries");
        match result {
            Err(FetchError::Unavailable { attempts, source }) => {
                assert_eq!(attempts, 3);
                assert_eq!(source.cause(), FailureCause::Timeout);
            }
            other => panic!("expected Unavailable, got {other:?}"),
        }
    }

    #[test]
    fn permanent_failure_is_not_retried() {
        let mut attempts = 0;
        let result: Result<(), _> = with_retry(&quick(5), "test", || {
            attempts += 1;
            Err(TransportError::Status {
                url: "http://wp/posts".into(),
                status: 404,
            })
        });
        assert!(result.is_err());
        assert_eq!(attempts, 1);
    }
}
