//! Per-widget sequential request queue.
//!
//! Requests are opaque thunks executed strictly one at a time in submission
//! order. [`RequestQueue::enqueue`] applies a trailing-edge debounce, so a
//! burst of calls inside the window collapses to the last one. After each
//! success the drain loop pauses before starting the next request.
//!
//! Failure handling per entry:
//! - cancellation discards everything still queued and stops the drain;
//! - any other failure drops that entry and draining continues.

use std::collections::VecDeque;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures_core::future::BoxFuture;
use parking_lot::Mutex;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::sleep;

use crate::api::ApiError;
use crate::cancel::CancelToken;
use crate::config::QueueConfig;

/// An opaque asynchronous operation waiting for its turn.
pub type QueuedRequest = Box<dyn FnOnce() -> BoxFuture<'static, Result<(), ApiError>> + Send>;

/// Counters for what happened to submitted requests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueStats {
    /// Requests that ran and succeeded.
    pub completed: u64,
    /// Requests that ran and failed with a non-cancellation error.
    pub failed: u64,
    /// Requests dropped without running (cancellation, clear, shutdown).
    pub discarded: u64,
    /// Requests replaced by a later call inside the debounce window.
    pub debounced: u64,
}

/// Handle to the pending debounce timer.
struct DebounceTimer {
    handle: JoinHandle<()>,
}

impl DebounceTimer {
    fn cancel(self) {
        self.handle.abort();
    }
}

#[derive(Default)]
struct QueueInner {
    pending: VecDeque<QueuedRequest>,
    /// Request waiting for the debounce window to close.
    debounced: Option<QueuedRequest>,
    timer: Option<DebounceTimer>,
    /// Bumped on every debounce reschedule; a timer only flushes its own.
    generation: u64,
    processing: bool,
    closed: bool,
    stats: QueueStats,
}

impl QueueInner {
    fn is_idle(&self) -> bool {
        !self.processing && self.pending.is_empty() && self.debounced.is_none()
    }

    /// Drop all waiting work. Returns how many requests were dropped.
    fn discard_waiting(&mut self) -> usize {
        if let Some(timer) = self.timer.take() {
            timer.cancel();
        }
        let dropped = self.pending.len() + usize::from(self.debounced.take().is_some());
        self.pending.clear();
        self.stats.discarded += dropped as u64;
        dropped
    }
}

/// Serializes requests for one widget instance. Clones share the queue.
#[derive(Clone)]
pub struct RequestQueue {
    inner: Arc<Mutex<QueueInner>>,
    idle: Arc<Notify>,
    closed: CancelToken,
    debounce: Duration,
    pacing: Duration,
    label: Arc<str>,
}

impl RequestQueue {
    pub fn new(label: impl Into<Arc<str>>, debounce: Duration, pacing: Duration) -> Self {
        Self {
            inner: Arc::new(Mutex::new(QueueInner::default())),
            idle: Arc::new(Notify::new()),
            closed: CancelToken::new(),
            debounce,
            pacing,
            label: label.into(),
        }
    }

    pub fn from_config(label: impl Into<Arc<str>>, config: &QueueConfig) -> Self {
        Self::new(label, config.debounce(), config.pacing())
    }

    /// Schedule a request behind the debounce window.
    ///
    /// A later call inside the window replaces this one before it is queued.
    pub fn enqueue<F, Fut>(&self, request: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), ApiError>> + Send + 'static,
    {
        let mut inner = self.inner.lock();
        if inner.closed {
            tracing::debug!(queue = %self.label, "Ignoring request on closed queue");
            return;
        }

        if let Some(timer) = inner.timer.take() {
            timer.cancel();
        }
        if inner.debounced.replace(boxed(request)).is_some() {
            inner.stats.debounced += 1;
            tracing::debug!(queue = %self.label, "Debounced superseded request");
        }

        inner.generation += 1;
        let generation = inner.generation;
        let queue = self.clone();
        let handle = tokio::spawn(async move {
            sleep(queue.debounce).await;
            queue.flush_debounced(generation);
        });
        inner.timer = Some(DebounceTimer { handle });
    }

    /// Append a request immediately, bypassing the debounce window.
    pub fn push<F, Fut>(&self, request: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), ApiError>> + Send + 'static,
    {
        let mut inner = self.inner.lock();
        if inner.closed {
            tracing::debug!(queue = %self.label, "Ignoring request on closed queue");
            return;
        }
        inner.pending.push_back(boxed(request));
        self.start_drain(&mut inner);
    }

    /// Drop queued requests and the pending debounce timer. The request in
    /// flight, if any, is left to its own cancellation token.
    pub fn clear(&self) {
        let dropped = self.inner.lock().discard_waiting();
        if dropped > 0 {
            tracing::debug!(queue = %self.label, dropped, "Cleared request queue");
        }
        self.notify_if_idle();
    }

    /// Clear the queue and refuse any further requests. Idempotent.
    pub fn shutdown(&self) {
        {
            let mut inner = self.inner.lock();
            if inner.closed {
                return;
            }
            inner.closed = true;
            let dropped = inner.discard_waiting();
            tracing::debug!(queue = %self.label, dropped, "Request queue shut down");
        }
        self.closed.cancel();
        self.notify_if_idle();
    }

    pub fn is_closed(&self) -> bool {
        self.inner.lock().closed
    }

    /// Number of requests queued behind the one in flight.
    pub fn len(&self) -> usize {
        self.inner.lock().pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True when nothing is queued, debounced, or running.
    pub fn is_idle(&self) -> bool {
        self.inner.lock().is_idle()
    }

    pub fn stats(&self) -> QueueStats {
        self.inner.lock().stats
    }

    /// Wait until the queue has no work left.
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if self.is_idle() {
                return;
            }
            notified.await;
        }
    }

    fn flush_debounced(&self, generation: u64) {
        let mut inner = self.inner.lock();
        if inner.generation != generation || inner.closed {
            return;
        }
        inner.timer = None;
        if let Some(request) = inner.debounced.take() {
            inner.pending.push_back(request);
            self.start_drain(&mut inner);
        }
    }

    fn start_drain(&self, inner: &mut QueueInner) {
        if inner.processing || inner.pending.is_empty() {
            return;
        }
        inner.processing = true;
        let queue = self.clone();
        tokio::spawn(async move { queue.drain().await });
    }

    async fn drain(self) {
        loop {
            let request = {
                let mut inner = self.inner.lock();
                match inner.pending.pop_front() {
                    Some(request) if !inner.closed => request,
                    _ => {
                        inner.processing = false;
                        break;
                    }
                }
            };

            match request().await {
                Ok(()) => {
                    self.inner.lock().stats.completed += 1;
                    tokio::select! {
                        biased;
                        _ = self.closed.cancelled() => {}
                        _ = sleep(self.pacing) => {}
                    }
                }
                Err(err) if err.is_cancellation() => {
                    let mut inner = self.inner.lock();
                    let dropped = inner.pending.len();
                    inner.pending.clear();
                    inner.stats.discarded += dropped as u64;
                    inner.processing = false;
                    tracing::debug!(queue = %self.label, dropped, "Request cancelled, queue discarded");
                    break;
                }
                Err(err) => {
                    self.inner.lock().stats.failed += 1;
                    tracing::warn!(
                        queue = %self.label,
                        error_type = err.error_type(),
                        error = %err,
                        "Queued request failed, continuing with next"
                    );
                }
            }
        }

        self.notify_if_idle();
    }

    fn notify_if_idle(&self) {
        if self.is_idle() {
            self.idle.notify_waiters();
        }
    }
}

fn boxed<F, Fut>(request: F) -> QueuedRequest
where
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = Result<(), ApiError>> + Send + 'static,
{
    Box::new(move || -> BoxFuture<'static, Result<(), ApiError>> { Box::pin(request()) })
}
