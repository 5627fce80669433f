//! Polling with timeout.
//!
//! Pages change asynchronously: scripts run, requests finish, animations
//! end. A [`Waiter`] re-evaluates a condition at a fixed interval until it
//! yields a value or the time budget runs out.
//!
//! Each evaluation returns an [`Attempt`], which makes the difference
//! between "not yet" and "give up now" explicit:
//!
//! | Attempt | Loop behaviour |
//! |---------|----------------|
//! | `Ready(v)` | return `v` immediately |
//! | `Pending` | sleep, try again |
//! | `Retry(e)` | log `e`, sleep, try again |
//! | `Abort(e)` | return `e` immediately |
//!
//! The condition is always evaluated at least once, even with a zero
//! timeout. The elapsed time is checked after each failed attempt.
//!
//! # Example
//!
//! ```ignore
//! use webkit_driver::browser::{Attempt, Waiter};
//!
//! let waiter = Waiter::default();
//! let url = waiter
//!     .wait_for("redirect", || async {
//!         match client.url().await {
//!             Ok(url) if url.contains("/dashboard") => Attempt::Ready(url),
//!             Ok(_) => Attempt::Pending,
//!             Err(e) => Attempt::Retry(e),
//!         }
//!     })
//!     .await?;
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::future::Future;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::driver::WaitOptions;
use crate::driver::options::{DEFAULT_WAIT_INTERVAL, DEFAULT_WAIT_TIMEOUT};
use crate::error::{Error, Result};

// ============================================================================
// Attempt
// ============================================================================

/// Outcome of one evaluation of a polled condition.
#[derive(Debug)]
pub enum Attempt<T> {
    /// The condition holds; stop with this value.
    Ready(T),
    /// The condition does not hold yet.
    Pending,
    /// The evaluation failed in a way that may clear up; keep polling.
    Retry(Error),
    /// The evaluation failed for good; stop with this error.
    Abort(Error),
}

impl<T> Attempt<T> {
    /// `Ok` becomes `Ready`, `Err` becomes `Retry`.
    #[inline]
    pub fn from_result(result: Result<T>) -> Self {
        match result {
            Ok(value) => Self::Ready(value),
            Err(e) => Self::Retry(e),
        }
    }

    /// Returns `true` for `Ready`.
    #[inline]
    #[must_use]
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }
}

impl Attempt<()> {
    /// `true` becomes `Ready(())`, `false` becomes `Pending`.
    #[inline]
    #[must_use]
    pub fn from_bool(holds: bool) -> Self {
        if holds { Self::Ready(()) } else { Self::Pending }
    }
}

impl<T> From<Result<Option<T>>> for Attempt<T> {
    /// `Some` is ready, `None` is pending, errors are retried.
    fn from(result: Result<Option<T>>) -> Self {
        match result {
            Ok(Some(value)) => Self::Ready(value),
            Ok(None) => Self::Pending,
            Err(e) => Self::Retry(e),
        }
    }
}

// ============================================================================
// Waiter
// ============================================================================

/// Polling policy: how often to try and for how long.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Waiter {
    /// Pause between attempts.
    interval: Duration,
    /// Budget measured from the first attempt.
    timeout: Duration,
}

impl Default for Waiter {
    fn default() -> Self {
        Self::new(DEFAULT_WAIT_INTERVAL, DEFAULT_WAIT_TIMEOUT)
    }
}

impl Waiter {
    /// Creates a waiter.
    #[inline]
    #[must_use]
    pub const fn new(interval: Duration, timeout: Duration) -> Self {
        Self { interval, timeout }
    }

    /// Creates a waiter using the generic timeout of `options`.
    #[inline]
    #[must_use]
    pub const fn from_options(options: &WaitOptions) -> Self {
        Self::new(options.interval, options.timeout)
    }

    /// Creates a waiter using the presence timeout of `options`.
    #[inline]
    #[must_use]
    pub const fn presence(options: &WaitOptions) -> Self {
        Self::new(options.interval, options.presence_timeout)
    }

    /// Returns a copy with a different timeout.
    #[inline]
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns a copy with a different interval.
    #[inline]
    #[must_use]
    pub const fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Returns the polling interval.
    #[inline]
    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Returns the timeout.
    #[inline]
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }
}

// ============================================================================
// Waiter - Polling
// ============================================================================

impl Waiter {
    /// Polls `condition` until it is ready.
    ///
    /// `operation` names the wait in logs and in the timeout error.
    ///
    /// # Errors
    ///
    /// - [`Error::WaitTimeout`] if the budget ran out
    /// - the error of an [`Attempt::Abort`]
    pub async fn wait_for<T, F, Fut>(&self, operation: &str, mut condition: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Attempt<T>>,
    {
        let start = Instant::now();
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;

            match condition().await {
                Attempt::Ready(value) => {
                    if attempt > 1 {
                        debug!(operation, attempt, "Condition met");
                    }
                    return Ok(value);
                }
                Attempt::Pending => {}
                Attempt::Retry(e) => {
                    debug!(operation, attempt, error = %e, "Condition failed, retrying");
                }
                Attempt::Abort(e) => {
                    debug!(operation, attempt, error = %e, "Condition aborted");
                    return Err(e);
                }
            }

            if start.elapsed() > self.timeout {
                break;
            }

            tokio::time::sleep(self.interval).await;
        }

        let timeout_ms = saturating_millis(self.timeout);
        warn!(operation, attempt, timeout_ms, "Wait timed out");
        Err(Error::wait_timeout(operation, timeout_ms))
    }

    /// Like [`wait_for`](Self::wait_for), but a timeout yields `None`.
    ///
    /// # Errors
    ///
    /// Only the error of an [`Attempt::Abort`].
    pub async fn wait_for_safe<T, F, Fut>(&self, operation: &str, condition: F) -> Result<Option<T>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Attempt<T>>,
    {
        match self.wait_for(operation, condition).await {
            Ok(value) => Ok(Some(value)),
            Err(Error::WaitTimeout { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Polls until `condition` holds.
    ///
    /// Errors from `condition` are retried.
    pub async fn wait_until<F, Fut>(&self, operation: &str, mut condition: F) -> Result<()>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<bool>>,
    {
        self.wait_for(operation, || {
            let check = condition();
            async move {
                match check.await {
                    Ok(holds) => Attempt::from_bool(holds),
                    Err(e) => Attempt::Retry(e),
                }
            }
        })
        .await
    }

    /// Polls while `condition` holds, returning once it is false.
    ///
    /// Errors from `condition` are retried.
    pub async fn wait_while<F, Fut>(&self, operation: &str, mut condition: F) -> Result<()>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<bool>>,
    {
        self.wait_until(operation, || {
            let check = condition();
            async move { check.await.map(|holds| !holds) }
        })
        .await
    }
}

/// Whole milliseconds in `duration`, clamped to `u64::MAX`.
pub(crate) fn saturating_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

// ============================================================================
// Tests
// ============================================================================
