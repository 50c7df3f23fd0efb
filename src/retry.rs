//! Exponential-backoff retry: a composable wrapper around fallible async
//! operations.
//!
//! Retry is a cross-cutting policy, not dispatcher logic, so it lives here as
//! a generic combinator rather than inside the model-call site. The caller
//! supplies a transiency predicate; anything it rejects (bad credentials,
//! malformed requests) fails immediately instead of burning attempts.
//!
//! ## Backoff shape
//!
//! `base_delay_ms * 2^(attempt-1)`: with the 500 ms default and 3 retries the
//! wait sequence is 500 ms → 1 s → 2 s, under 4 s of total back-off. Doubling
//! avoids hammering a recovering endpoint with immediate re-sends.

use std::fmt::Display;
use std::future::Future;

use tokio::time::{sleep, Duration};
use tracing::warn;

/// Bounded-attempt exponential backoff parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    /// Additional attempts after the first; 3 means up to 4 calls total.
    pub max_retries: u32,
    /// Delay before the first retry; doubles for each one after.
    pub base_delay_ms: u64,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 500,
        }
    }
}

impl BackoffPolicy {
    /// Delay before retry number `attempt` (1-indexed).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.base_delay_ms * 2u64.pow(attempt.saturating_sub(1)))
    }

    /// Total calls this policy permits.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries + 1
    }
}

/// Run `op` under the policy, retrying errors `is_transient` accepts.
///
/// Returns the successful value together with the number of retries spent
/// (0 = first attempt succeeded). Non-transient errors surface immediately;
/// a transient error on the last permitted attempt surfaces as-is.
pub async fn with_backoff<T, E, F, Fut, P>(
    policy: &BackoffPolicy,
    is_transient: P,
    mut op: F,
) -> Result<(T, u32), E>
where
    E: Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
{
    let mut last_err = match op().await {
        Ok(value) => return Ok((value, 0)),
        Err(e) if is_transient(&e) => e,
        Err(e) => return Err(e),
    };

    for attempt in 1..=policy.max_retries {
        let delay = policy.delay_for(attempt);
        warn!(
            attempt,
            max_retries = policy.max_retries,
            delay_ms = delay.as_millis() as u64,
            error = %last_err,
            "retrying after backoff"
        );
        sleep(delay).await;

        match op().await {
            Ok(value) => return Ok((value, attempt)),
            Err(e) if is_transient(&e) => last_err = e,
            Err(e) => return Err(e),
        }
    }

    Err(last_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_policy(max_retries: u32) -> BackoffPolicy {
        BackoffPolicy {
            max_retries,
            base_delay_ms: 1,
        }
    }

    #[test]
    fn delay_doubles() {
        let policy = BackoffPolicy {
            max_retries: 3,
            base_delay_ms: 500,
        };
        assert_eq!(policy.delay_for(1), Duration::from_millis(500));
        assert_eq!(policy.delay_for(2), Duration::from_millis(1000));
        assert_eq!(policy.delay_for(3), Duration::from_millis(2000));
        assert_eq!(policy.max_attempts(), 4);
    }

    #[tokio::test]
    async fn first_attempt_success_spends_no_retries() {
        let (value, retries) = with_backoff(&fast_policy(3), |_: &String| true, || async {
            Ok::<_, String>(42)
        })
        .await
        .unwrap();
        assert_eq!(value, 42);
        assert_eq!(retries, 0);
    }

    #[tokio::test]
    async fn transient_errors_are_retried() {
        let calls = AtomicU32::new(0);
        let (value, retries) = with_backoff(&fast_policy(3), |_: &String| true, || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err("flaky".to_string())
                } else {
                    Ok(n)
                }
            }
        })
        .await
        .unwrap();
        assert_eq!(value, 2);
        assert_eq!(retries, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn fatal_errors_are_not_retried() {
        let calls = AtomicU32::new(0);
        let result: Result<(u32, u32), String> =
            with_backoff(&fast_policy(3), |e: &String| e.as_str() != "fatal", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err("fatal".to_string()) }
            })
            .await;
        assert_eq!(result.unwrap_err(), "fatal");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn exhaustion_surfaces_last_error() {
        let calls = AtomicU32::new(0);
        let result: Result<(u32, u32), String> =
            with_backoff(&fast_policy(2), |_: &String| true, || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move { Err(format!("boom {n}")) }
            })
            .await;
        assert_eq!(result.unwrap_err(), "boom 2");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
