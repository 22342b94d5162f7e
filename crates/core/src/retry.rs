//! Bounded retry with backoff for collaborator calls.
//!
//! Only transport-level failures (`CoachError::is_transient`) are
//! re-attempted; schema and validation failures surface immediately.

use std::future::Future;
use std::time::Duration;

use crate::error::CoachError;

/// Retry bounds for one collaborator call.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts including the first one.
    pub max_attempts: u32,
    /// Delay before the first re-attempt.
    pub base_delay: Duration,
    /// Doubles the delay after each re-attempt when set.
    pub exponential: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(300),
            exponential: true,
        }
    }
}

impl RetryPolicy {
    /// A policy that never re-attempts. Used in tests.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::ZERO,
            exponential: false,
        }
    }
}

/// Runs `op` up to `policy.max_attempts` times, sleeping between
/// attempts. `on_retry` is invoked with the attempt number just failed,
/// before the backoff sleep.
pub async fn retry<T, F, Fut>(
    policy: RetryPolicy,
    mut on_retry: impl FnMut(u32),
    mut op: F,
) -> Result<T, CoachError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, CoachError>>,
{
    let mut delay = policy.base_delay;
    let mut attempt = 1;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_transient() && attempt < policy.max_attempts => {
                on_retry(attempt);
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                if policy.exponential {
                    delay *= 2;
                }
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn instant_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            base_delay: Duration::ZERO,
            exponential: false,
        }
    }

    #[tokio::test]
    async fn succeeds_after_transient_failures() {
        let calls = AtomicU32::new(0);
        let result = retry(instant_policy(3), |_| {}, || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(CoachError::Recoverable("timeout".into()))
                } else {
                    Ok(42)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let calls = AtomicU32::new(0);
        let retries = AtomicU32::new(0);
        let result: Result<(), _> = retry(
            instant_policy(3),
            |_| {
                retries.fetch_add(1, Ordering::SeqCst);
            },
            || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(CoachError::Recoverable("down".into())) }
            },
        )
        .await;
        assert!(matches!(result, Err(CoachError::Recoverable(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(retries.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn none_policy_makes_a_single_attempt() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = retry(RetryPolicy::none(), |_| {}, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(CoachError::Recoverable("timeout".into())) }
        })
        .await;
        assert!(matches!(result, Err(CoachError::Recoverable(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn schema_errors_are_not_retried() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = retry(instant_policy(3), |_| {}, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(CoachError::Schema("bad payload".into())) }
        })
        .await;
        assert!(matches!(result, Err(CoachError::Schema(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
