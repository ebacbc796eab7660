//! Cancellation tokens for in-flight network calls.
//!
//! A token is handed to every operation the retry executor runs. Cancelling
//! it wakes any task parked in [`CancelToken::cancelled`], so a torn-down
//! widget never leaves a request or a backoff sleep running.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::Notify;

#[derive(Debug, Default)]
struct CancelInner {
    cancelled: AtomicBool,
    notify: Notify,
}

/// Cloneable cancellation signal. All clones observe the same state.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    inner: Arc<CancelInner>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel the token. Returns `true` only for the call that flipped it.
    pub fn cancel(&self) -> bool {
        let first = !self.inner.cancelled.swap(true, Ordering::SeqCst);
        if first {
            self.inner.notify.notify_waiters();
        }
        first
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Resolve once the token is cancelled.
    pub async fn cancelled(&self) {
        // Register interest before checking the flag, otherwise a cancel()
        // landing between the check and the await is lost.
        let notified = self.inner.notify.notified();
        tokio::pin!(notified);
        notified.as_mut().enable();
        if self.is_cancelled() {
            return;
        }
        notified.await;
    }
}

/// Holds the token of the most recent call issued by one widget instance.
///
/// Starting a new call cancels the previous one, so at most one call per
/// widget is ever live. Once closed, the slot only hands out cancelled tokens.
#[derive(Debug, Default)]
pub struct CallSlot {
    inner: Mutex<SlotInner>,
}

#[derive(Debug, Default)]
struct SlotInner {
    current: Option<CancelToken>,
    closed: bool,
}

impl CallSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a fresh token, cancelling whichever call held the slot.
    pub fn begin(&self) -> CancelToken {
        let token = CancelToken::new();
        let mut inner = self.inner.lock();
        if inner.closed {
            token.cancel();
            return token;
        }
        if let Some(previous) = inner.current.replace(token.clone()) {
            if previous.cancel() {
                tracing::debug!("Superseded in-flight call");
            }
        }
        token
    }

    /// Cancel the live call, if any, and refuse every later one.
    /// Safe to call repeatedly.
    pub fn close(&self) {
        let mut inner = self.inner.lock();
        inner.closed = true;
        if let Some(token) = inner.current.take() {
            token.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn cancel_is_idempotent() {
        let token = CancelToken::new();
        assert!(!token.is_cancelled());
        assert!(token.cancel());
        assert!(!token.cancel());
        assert!(token.is_cancelled());
    }

    #[test]
    fn clones_share_state() {
        let token = CancelToken::new();
        let clone = token.clone();
        clone.cancel();
        assert!(token.is_cancelled());
    }

    #[tokio::test]
    async fn cancelled_resolves_immediately_when_already_cancelled() {
        let token = CancelToken::new();
        token.cancel();
        tokio::time::timeout(Duration::from_millis(50), token.cancelled())
            .await
            .expect("should resolve");
    }

    #[tokio::test]
    async fn cancelled_wakes_waiter() {
        let token = CancelToken::new();
        let waiter = {
            let token = token.clone();
            tokio::spawn(async move { token.cancelled().await })
        };
        tokio::task::yield_now().await;
        token.cancel();
        tokio::time::timeout(Duration::from_millis(100), waiter)
            .await
            .expect("waiter should wake")
            .unwrap();
    }

    #[test]
    fn begin_supersedes_previous_call() {
        let slot = CallSlot::new();
        let first = slot.begin();
        let second = slot.begin();
        assert!(first.is_cancelled());
        assert!(!second.is_cancelled());

        slot.close();
        slot.close();
        assert!(second.is_cancelled());
    }

    #[test]
    fn closed_slot_issues_cancelled_tokens() {
        let slot = CallSlot::new();
        slot.close();
        assert!(slot.begin().is_cancelled());
        assert!(slot.begin().is_cancelled());
    }
}
