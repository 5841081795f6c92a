//! Readiness verification for a freshly created broker connection.
//!
//! Two interchangeable strategies bring a [`BrokerConnection`] to
//! [`ConnectionState::Ready`]:
//!
//! - [`wait_for_ready`]: state-poll. Triggers connection attempts and waits on state
//!   transitions until the connection is ready, shut down, or the deadline passes.
//! - [`probe_until_ok`]: probe-call. Repeats a canary request with a fixed delay
//!   until one succeeds or the attempt budget runs out. Health checks reuse it.
//!
//! Both observe the caller's cancellation token and never wait past the deadline.

use std::{
    future::Future,
    sync::atomic::{AtomicU32, Ordering},
    time::Duration,
};

use backon::{ConstantBuilder, Retryable};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::{
    config::ProbePolicy,
    connection::{BrokerConnection, ConnectionState},
    error::{
        CancelledSnafu, ConnectionShutdownSnafu, ReadinessTimeoutSnafu, Result, SdkError,
        TimeoutSnafu,
    },
};

/// Waits for the connection to become ready by driving connection attempts.
///
/// After a failed attempt the loop pauses for `reconnect_backoff`, waking early if
/// the state changes (for example to `Shutdown` when the client is closed).
///
/// # Errors
///
/// - `Cancelled` if `token` fires
/// - `ReadinessTimeout` if `window` elapses first
/// - `ConnectionShutdown` if the connection is closed while waiting
pub(crate) async fn wait_for_ready(
    connection: &BrokerConnection,
    reconnect_backoff: Duration,
    window: Duration,
    token: &CancellationToken,
) -> Result<()> {
    if token.is_cancelled() {
        return CancelledSnafu.fail();
    }

    let deadline = Instant::now() + window;
    let mut states = connection.subscribe();
    let mut attempts: u32 = 0;

    loop {
        let state = *states.borrow_and_update();
        match state {
            ConnectionState::Ready => {
                debug!(attempts, "broker connection ready");
                return Ok(());
            },
            ConnectionState::Shutdown => return ConnectionShutdownSnafu.fail(),
            ConnectionState::Idle
            | ConnectionState::Connecting
            | ConnectionState::TransientFailure => {},
        }

        attempts += 1;
        debug!(attempt = attempts, state = %state, "triggering broker connection attempt");

        let outcome = tokio::select! {
            biased;
            () = token.cancelled() => return CancelledSnafu.fail(),
            () = tokio::time::sleep_until(deadline) => {
                return timed_out(window, connection.state());
            }
            outcome = connection.establish() => outcome,
        };

        match outcome {
            Ok(()) => continue,
            Err(SdkError::ConnectionShutdown) => return ConnectionShutdownSnafu.fail(),
            Err(e) => debug!(attempt = attempts, error = %e, "broker connection attempt failed"),
        }

        // Ignore transitions caused by the attempt itself
        states.borrow_and_update();

        tokio::select! {
            biased;
            () = token.cancelled() => return CancelledSnafu.fail(),
            () = tokio::time::sleep_until(deadline) => {
                return timed_out(window, connection.state());
            }
            changed = states.changed() => {
                if changed.is_err() {
                    return ConnectionShutdownSnafu.fail();
                }
            }
            () = tokio::time::sleep(reconnect_backoff) => {}
        }
    }
}

fn timed_out(window: Duration, state: ConnectionState) -> Result<()> {
    ReadinessTimeoutSnafu { duration_ms: window.as_millis() as u64, state }.fail()
}

/// Runs `probe` until it succeeds, pausing `policy.delay` between attempts.
///
/// Each attempt is bounded by `policy.attempt_timeout`; an attempt that overruns
/// counts as a failure with `SdkError::Timeout`.
///
/// # Errors
///
/// - `Cancelled` if `token` fires, without waiting for the current attempt
/// - `Unreachable` carrying the last failure once `policy.max_attempts` probes failed
pub(crate) async fn probe_until_ok<F, Fut, T>(
    policy: &ProbePolicy,
    token: &CancellationToken,
    what: &str,
    mut probe: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    if token.is_cancelled() {
        return CancelledSnafu.fail();
    }

    let attempts = AtomicU32::new(0);
    let attempt_timeout = policy.attempt_timeout;
    let backoff = ConstantBuilder::default()
        .with_delay(policy.delay)
        .with_max_times(policy.max_attempts.saturating_sub(1) as usize);

    let probing = (|| {
        attempts.fetch_add(1, Ordering::SeqCst);
        let attempt = probe();
        async move {
            match tokio::time::timeout(attempt_timeout, attempt).await {
                Ok(result) => result,
                Err(_) => {
                    TimeoutSnafu { duration_ms: attempt_timeout.as_millis() as u64 }.fail()
                },
            }
        }
    })
    .retry(backoff)
    .sleep(tokio::time::sleep)
    .notify(|err: &SdkError, delay: Duration| {
        debug!(
            what,
            attempt = attempts.load(Ordering::SeqCst),
            delay_ms = delay.as_millis() as u64,
            error = %err,
            "probe failed, retrying"
        );
    });

    let result = tokio::select! {
        biased;
        () = token.cancelled() => return CancelledSnafu.fail(),
        result = probing => result,
    };

    result.map_err(|last| SdkError::Unreachable {
        attempts: attempts.load(Ordering::SeqCst),
        source: Box::new(last),
    })
}
