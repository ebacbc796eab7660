//! Bounded exponential-backoff retry for a single network call.
//!
//! Transient failures are retried after `delay`, growing by the policy's
//! multiplier each time. Cancellation aborts at once, including during the
//! backoff sleep. Anything else propagates the last error.

use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;

use crate::api::{ApiError, ErrorClass};
use crate::cancel::{CallSlot, CancelToken};
use crate::config::RetryConfig;

/// Backoff parameters shared by every call a widget issues.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub multiplier: f64,
}

impl RetryPolicy {
    /// Delays slept between consecutive attempts, in order.
    pub fn delays(&self) -> impl Iterator<Item = Duration> + '_ {
        let steps = self.max_attempts.saturating_sub(1) as usize;
        std::iter::successors(Some(self.initial_delay), move |d| Some(self.grow(*d)))
            .take(steps)
    }

    /// The delay after `delay`, saturating at [`Duration::MAX`].
    fn grow(&self, delay: Duration) -> Duration {
        Duration::try_from_secs_f64(delay.as_secs_f64() * self.multiplier)
            .unwrap_or(Duration::MAX)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(1000),
            multiplier: 1.5,
        }
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            initial_delay: Duration::from_millis(config.initial_delay_ms),
            multiplier: config.multiplier,
        }
    }
}

/// Per-call retry bookkeeping. Dropped when the call settles.
#[derive(Debug)]
pub struct RetryContext {
    pub attempt: u32,
    pub max_attempts: u32,
    pub delay: Duration,
    pub cancel: CancelToken,
}

impl RetryContext {
    fn new(policy: &RetryPolicy, cancel: CancelToken) -> Self {
        Self {
            attempt: 0,
            max_attempts: policy.max_attempts.max(1),
            delay: policy.initial_delay,
            cancel,
        }
    }
}

/// Run `operation` until it succeeds, fails for good, or is cancelled.
///
/// The operation receives the call's cancellation token and is expected to
/// abort its network I/O when the token fires.
pub async fn execute_with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    cancel: CancelToken,
    mut operation: F,
) -> Result<T, ApiError>
where
    F: FnMut(CancelToken) -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
{
    let mut ctx = RetryContext::new(policy, cancel);

    loop {
        if ctx.cancel.is_cancelled() {
            return Err(ApiError::Cancelled);
        }
        ctx.attempt += 1;

        let err = match operation(ctx.cancel.clone()).await {
            Ok(value) => {
                if ctx.attempt > 1 {
                    tracing::debug!(attempt = ctx.attempt, "Call succeeded after retry");
                }
                return Ok(value);
            }
            Err(err) => err,
        };

        if ctx.cancel.is_cancelled() {
            return Err(ApiError::Cancelled);
        }

        match err.class() {
            ErrorClass::Cancellation => return Err(err),
            ErrorClass::Permanent => return Err(err),
            ErrorClass::Transient if ctx.attempt >= ctx.max_attempts => {
                tracing::warn!(
                    attempts = ctx.attempt,
                    error = %err,
                    "Giving up after transient failures"
                );
                return Err(err);
            }
            ErrorClass::Transient => {
                tracing::warn!(
                    attempt = ctx.attempt,
                    max_attempts = ctx.max_attempts,
                    delay_ms = ctx.delay.as_millis() as u64,
                    error_type = err.error_type(),
                    "Transient failure, retrying"
                );
            }
        }

        tokio::select! {
            biased;
            _ = ctx.cancel.cancelled() => return Err(ApiError::Cancelled),
            _ = sleep(ctx.delay) => {}
        }
        ctx.delay = policy.grow(ctx.delay);
    }
}

/// Retry executor owned by one widget instance.
///
/// Each [`run`](Self::run) takes a fresh token from the widget's call slot,
/// superseding any call still in flight.
#[derive(Debug)]
pub struct RetryExecutor {
    policy: RetryPolicy,
    slot: CallSlot,
}

impl RetryExecutor {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            slot: CallSlot::new(),
        }
    }

    pub async fn run<T, F, Fut>(&self, operation: F) -> Result<T, ApiError>
    where
        F: FnMut(CancelToken) -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        let token = self.slot.begin();
        execute_with_retry(&self.policy, token, operation).await
    }

    /// Cancel the call in flight, if any, and fail every later `run` with
    /// [`ApiError::Cancelled`]. Idempotent.
    pub fn cancel(&self) {
        self.slot.close();
    }
}
