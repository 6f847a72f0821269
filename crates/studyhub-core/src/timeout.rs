//! Bounded waits for unreliable remote calls.
//!
//! Every remote call the auth flow makes (session check, profile fetch) goes
//! through [`with_timeout`] so the wait is bounded by a configured duration.
//! Elapsing only stops the caller from waiting; the dropped future is the
//! only thing cancelled.

use std::future::Future;
use std::time::Duration;

use thiserror::Error;

/// The bounded wait elapsed before the operation resolved.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("{operation} did not resolve within {after:?}")]
pub struct TimeoutError {
    /// Name of the operation, used in logs.
    pub operation: &'static str,
    /// The bound that elapsed.
    pub after: Duration,
}

/// Races `operation` against `duration`.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use studyhub_core::timeout::with_timeout;
///
/// # tokio_test_block_on(async {
/// let value = with_timeout("answer", Duration::from_secs(1), async { 42 }).await;
/// assert_eq!(value, Ok(42));
/// # });
/// # fn tokio_test_block_on<F: std::future::Future>(f: F) -> F::Output {
/// #     tokio::runtime::Builder::new_current_thread().enable_time().build().unwrap().block_on(f)
/// # }
/// ```
pub async fn with_timeout<F>(
    operation: &'static str,
    duration: Duration,
    future: F,
) -> Result<F::Output, TimeoutError>
where
    F: Future,
{
    tokio::time::timeout(duration, future)
        .await
        .map_err(|_| TimeoutError {
            operation,
            after: duration,
        })
}
