//! Backoff strategies for rate-limited requests
//!
//! A backoff function maps the number of retries already performed to the
//! duration to wait before the next attempt.

use std::sync::Arc;
use std::time::Duration;

/// A backoff function returns the duration to wait before performing the
/// next retry. The `retries` argument specifies how many retries have
/// already been performed; when called for the first time it is 0.
///
/// Backoff functions are shared between in-flight requests and must be
/// safe to call concurrently.
pub type BackoffFn = Arc<dyn Fn(u32) -> Duration + Send + Sync>;

/// Returns a [`BackoffFn`] which backs off for a constant duration `d`,
/// regardless of the retry count.
pub fn constant(d: Duration) -> BackoffFn {
    Arc::new(move |_retries| d)
}

/// Returns a [`BackoffFn`] which implements an exponential backoff using
/// the formula `base^retries * d`.
///
/// There is no jitter and no cap; callers are responsible for choosing a
/// base and unit that bound the total wait time, or for cancelling the
/// call once they have waited long enough.
pub fn exponential(base: f64, d: Duration) -> BackoffFn {
    Arc::new(move |retries| d.mul_f64(base.powi(retries as i32)))
}
