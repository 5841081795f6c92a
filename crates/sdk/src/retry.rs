//! Retry logic with exponential backoff.
//!
//! Broker calls are retried when they fail with a transient error
//! (see [`SdkError::is_retryable`]), so a briefly unreachable broker delays a call
//! instead of failing it. Every wait observes a cancellation token.

use std::{future::Future, time::Duration};

use rand::Rng;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::{
    config::RetryPolicy,
    error::{Result, SdkError},
};

/// Execute an async operation with retry and cancellation support.
///
/// # Retry Strategy
///
/// - **Exponential backoff**: `initial_backoff * multiplier^(attempt-1)`
/// - **Jitter**: ±`jitter` randomness applied to prevent thundering herd
/// - **Cap**: Backoff capped at `max_backoff`
/// - **Termination**: After `max_attempts` failed attempts, returns
///   `SdkError::RetryExhausted`
///
/// Non-retryable errors (e.g. `INVALID_ARGUMENT`) are returned after the first
/// attempt.
///
/// # Cancellation Semantics
///
/// - If the token is already cancelled at call time, returns `Cancelled` immediately.
/// - If the token is cancelled during an attempt, the in-flight attempt is dropped and `Cancelled`
///   is returned.
/// - If the token is cancelled during a backoff sleep, the sleep is interrupted and `Cancelled` is
///   returned.
pub(crate) async fn with_retry_cancellable<F, Fut, T>(
    policy: &RetryPolicy,
    token: &CancellationToken,
    method: &str,
    mut operation: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    // Fail fast if already cancelled
    if token.is_cancelled() {
        return Err(SdkError::Cancelled);
    }

    let mut attempt: u32 = 0;
    let mut backoff_duration = policy.initial_backoff;

    loop {
        attempt += 1;

        // Race the operation against cancellation
        let result = tokio::select! {
            biased;
            () = token.cancelled() => {
                return Err(SdkError::Cancelled);
            }
            result = operation() => result,
        };

        let err = match result {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        // Non-retryable or out of attempts — return immediately
        if !err.is_retryable() {
            return Err(err);
        }
        if attempt >= policy.max_attempts {
            return Err(SdkError::RetryExhausted { attempts: attempt, last_error: err.to_string() });
        }

        let jittered = apply_jitter(backoff_duration, policy.jitter);

        debug!(
            method,
            attempt,
            backoff_ms = jittered.as_millis() as u64,
            error = %err,
            "retrying broker call after backoff"
        );

        // Sleep with cancellation
        tokio::select! {
            biased;
            () = token.cancelled() => {
                return Err(SdkError::Cancelled);
            }
            () = tokio::time::sleep(jittered) => {}
        }

        // Advance backoff for next attempt
        backoff_duration = next_backoff(backoff_duration, policy);
    }
}

fn next_backoff(current: Duration, policy: &RetryPolicy) -> Duration {
    std::cmp::min(
        Duration::from_nanos((current.as_nanos() as f64 * policy.multiplier) as u64),
        policy.max_backoff,
    )
}

/// Apply jitter to a duration.
///
/// Jitter adds randomness in the range `[dur * (1 - factor), dur * (1 + factor)]`
/// to prevent thundering herd when multiple clients retry simultaneously.
fn apply_jitter(dur: Duration, factor: f64) -> Duration {
    if factor <= 0.0 {
        return dur;
    }

    let factor = factor.clamp(0.0, 1.0);
    let mut rng = rand::rng();

    let base_nanos = dur.as_nanos() as f64;
    let min_nanos = base_nanos * (1.0 - factor);
    let max_nanos = base_nanos * (1.0 + factor);

    let jittered_nanos = rng.random_range(min_nanos..=max_nanos);
    Duration::from_nanos(jittered_nanos as u64)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, clippy::disallowed_methods)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicU32, Ordering},
    };

    use proptest::prelude::*;
    use tonic::Code;

    use super::*;

    fn test_policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(10),
            max_backoff: Duration::from_millis(100),
            multiplier: 2.0,
            jitter: 0.0, // No jitter for deterministic tests
        }
    }

    fn unavailable() -> SdkError {
        SdkError::Rpc { code: Code::Unavailable, message: "broker restarting".to_string() }
    }

    #[tokio::test]
    async fn test_success_on_first_attempt() {
        let token = CancellationToken::new();
        let calls = AtomicU32::new(0);

        let result = with_retry_cancellable(&test_policy(), &token, "hash", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok::<_, SdkError>("digest") }
        })
        .await;

        assert_eq!(result.unwrap(), "digest");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retries_until_success() {
        let token = CancellationToken::new();
        let calls = Arc::new(AtomicU32::new(0));

        let result = with_retry_cancellable(&test_policy(), &token, "hash", || {
            let calls = Arc::clone(&calls);
            async move {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 { Err(unavailable()) } else { Ok(42) }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_exhausts_retries() {
        let token = CancellationToken::new();
        let calls = AtomicU32::new(0);

        let result: Result<()> = with_retry_cancellable(&test_policy(), &token, "sign", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(unavailable()) }
        })
        .await;

        match result.unwrap_err() {
            SdkError::RetryExhausted { attempts, last_error } => {
                assert_eq!(attempts, 3);
                assert!(last_error.contains("broker restarting"));
            },
            other => panic!("expected RetryExhausted, got {other:?}"),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_non_retryable_returns_after_one_attempt() {
        let token = CancellationToken::new();
        let calls = AtomicU32::new(0);

        let result: Result<()> = with_retry_cancellable(&test_policy(), &token, "hash", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async {
                Err(SdkError::Rpc {
                    code: Code::InvalidArgument,
                    message: "unknown profile".to_string(),
                })
            }
        })
        .await;

        assert_eq!(result.unwrap_err().code(), Some(Code::InvalidArgument));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_pre_cancelled_token() {
        let token = CancellationToken::new();
        token.cancel();
        let calls = AtomicU32::new(0);

        let result: Result<()> = with_retry_cancellable(&test_policy(), &token, "hash", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok(()) }
        })
        .await;

        assert!(matches!(result, Err(SdkError::Cancelled)));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_cancelled_during_operation() {
        let token = CancellationToken::new();
        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            canceller.cancel();
        });

        let result: Result<()> = with_retry_cancellable(&test_policy(), &token, "hash", || async {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(())
        })
        .await;

        assert!(matches!(result, Err(SdkError::Cancelled)));
    }

    #[tokio::test]
    async fn test_cancelled_during_backoff() {
        let policy = RetryPolicy {
            initial_backoff: Duration::from_secs(30),
            max_backoff: Duration::from_secs(30),
            ..test_policy()
        };
        let token = CancellationToken::new();
        let canceller = token.clone();
        let calls = AtomicU32::new(0);

        let started = tokio::time::Instant::now();
        let retry = with_retry_cancellable(&policy, &token, "hash", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err::<(), _>(unavailable()) }
        });
        let cancel = async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            canceller.cancel();
        };
        let (result, ()) = tokio::join!(retry, cancel);

        assert!(matches!(result, Err(SdkError::Cancelled)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_next_backoff_is_capped() {
        let policy = test_policy();
        let mut backoff = policy.initial_backoff;
        let mut seen = Vec::new();
        for _ in 0..6 {
            seen.push(backoff);
            backoff = next_backoff(backoff, &policy);
        }
        assert_eq!(
            seen,
            [10, 20, 40, 80, 100, 100].map(Duration::from_millis).to_vec(),
        );
    }

    #[test]
    fn test_apply_jitter_zero_factor() {
        let dur = Duration::from_millis(100);
        assert_eq!(apply_jitter(dur, 0.0), dur);
    }

    proptest! {
        #[test]
        fn prop_jitter_within_bounds(base_ms in 1u64..10_000, factor in 0.0f64..=1.0) {
            let base = Duration::from_millis(base_ms);
            let jittered = apply_jitter(base, factor).as_nanos() as f64;
            let base = base.as_nanos() as f64;
            // One nanosecond of slack for float truncation
            prop_assert!(jittered >= base * (1.0 - factor) - 1.0);
            prop_assert!(jittered <= base * (1.0 + factor) + 1.0);
        }

        #[test]
        fn prop_large_factor_clamped(base_ms in 1u64..10_000, factor in 1.0f64..100.0) {
            let base = Duration::from_millis(base_ms);
            prop_assert!(apply_jitter(base, factor) <= base * 2 + Duration::from_nanos(1));
        }

        #[test]
        fn prop_backoff_never_exceeds_max(steps in 0usize..50, multiplier in 1.0f64..10.0) {
            let policy = RetryPolicy { multiplier, ..test_policy() };
            let mut backoff = policy.initial_backoff;
            for _ in 0..steps {
                backoff = next_backoff(backoff, &policy);
                prop_assert!(backoff <= policy.max_backoff);
            }
        }
    }
}
