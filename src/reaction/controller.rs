//! Controller for one post's reaction widget.
//!
//! Owns the widget's request queue, retry executor, and state store. Every
//! network call goes through the queue, so at most one request per widget is
//! in flight, and through the retry executor, so transient failures are
//! retried with backoff. Teardown (explicit or on drop) detaches the store
//! first: nothing that completes afterwards can touch widget state.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::watch;
use uuid::Uuid;

use crate::alert::{Alert, AlertSink};
use crate::api::{ApiError, ReactionApi, ReactionType};
use crate::config::Config;
use crate::mvi::Store;
use crate::queue::{QueueStats, RequestQueue};
use crate::retry::{RetryExecutor, RetryPolicy};
use crate::session::Session;

use super::intent::ReactionIntent;
use super::reducer::ReactionReducer;
use super::state::{ReactionAction, ReactionWidgetState};

pub const TOGGLE_FAILED_MESSAGE: &str = "Failed to update reaction. Please try again.";
pub const SIGN_IN_MESSAGE: &str = "Please sign in to react to posts.";

/// Pieces moved into queued requests.
#[derive(Clone)]
struct Shared {
    post_id: Arc<str>,
    session: Session,
    api: Arc<dyn ReactionApi>,
    retry: Arc<RetryExecutor>,
    store: Arc<Store<ReactionReducer>>,
    alerts: AlertSink,
}

pub struct ReactionController {
    shared: Shared,
    queue: RequestQueue,
    generation: AtomicU64,
}

impl ReactionController {
    pub fn new(
        post_id: impl Into<Arc<str>>,
        session: Session,
        api: Arc<dyn ReactionApi>,
        config: &Config,
        alerts: AlertSink,
    ) -> Self {
        let post_id: Arc<str> = post_id.into();
        // Several widgets may show the same post; label each queue uniquely.
        let queue = RequestQueue::from_config(
            format!("post:{}/{}", post_id, Uuid::new_v4()),
            &config.queue,
        );
        let retry = Arc::new(RetryExecutor::new(RetryPolicy::from(&config.retry)));

        Self {
            shared: Shared {
                post_id,
                session,
                api,
                retry,
                store: Arc::new(Store::new()),
                alerts,
            },
            queue,
            generation: AtomicU64::new(0),
        }
    }

    pub fn state(&self) -> ReactionWidgetState {
        self.shared.store.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<ReactionWidgetState> {
        self.shared.store.subscribe()
    }

    pub fn queue_stats(&self) -> QueueStats {
        self.queue.stats()
    }

    /// Wait until every queued request has finished.
    pub async fn settle(&self) {
        self.queue.wait_idle().await;
    }

    /// Load the aggregate counts and the user's own reaction.
    ///
    /// Both fetches are best-effort: a failure leaves zero counts and no
    /// reaction, and is only logged.
    pub fn mount(&self) {
        let shared = self.shared.clone();
        self.queue.push(move || async move {
            let result = shared
                .retry
                .run(|cancel| {
                    let api = shared.api.clone();
                    let post_id = shared.post_id.clone();
                    async move { api.fetch_summary(&post_id, &cancel).await }
                })
                .await;

            match result {
                Ok(summary) => {
                    shared.store.dispatch(ReactionIntent::CountsLoaded(summary));
                    Ok(())
                }
                Err(err) => {
                    if !err.is_cancellation() {
                        tracing::debug!(post_id = %shared.post_id, error = %err, "Failed to fetch reaction counts");
                    }
                    Err(err)
                }
            }
        });

        let Some(user_id) = self.shared.session.user_id() else {
            return;
        };
        let shared = self.shared.clone();
        self.queue.push(move || async move {
            let result = shared
                .retry
                .run(|cancel| {
                    let api = shared.api.clone();
                    let post_id = shared.post_id.clone();
                    let user_id = user_id.clone();
                    async move { api.fetch_user_reaction(&user_id, &post_id, &cancel).await }
                })
                .await;

            match result {
                Ok(reaction) => {
                    shared
                        .store
                        .dispatch(ReactionIntent::UserReactionLoaded(reaction));
                    Ok(())
                }
                Err(err) => {
                    if !err.is_cancellation() {
                        tracing::debug!(post_id = %shared.post_id, error = %err, "Failed to fetch user reaction");
                    }
                    Err(err)
                }
            }
        });
    }

    /// Press `reaction`: clears it if it is the user's current reaction,
    /// otherwise sets it. The widget enters `Loading` immediately and the
    /// request is queued behind the debounce window.
    pub fn toggle_reaction(&self, reaction: ReactionType) {
        if self.shared.session.user_id().is_none() {
            self.shared.alerts.raise(Alert::new(
                SIGN_IN_MESSAGE,
                format!("post {}", self.shared.post_id),
            ));
            return;
        }

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let Some(action) = self.shared.store.dispatch_with(|state| {
            let action = ReactionAction::for_toggle(state.current_reaction(), reaction);
            (ReactionIntent::Toggle { action, generation }, action)
        }) else {
            tracing::debug!(post_id = %self.shared.post_id, "Ignoring toggle on torn-down widget");
            return;
        };

        tracing::debug!(post_id = %self.shared.post_id, ?action, generation, "Reaction toggle queued");

        let shared = self.shared.clone();
        self.queue
            .enqueue(move || async move { shared.send_toggle(action, generation).await });
    }

    /// Stop all work for this widget. Idempotent.
    pub fn teardown(&self) {
        if self.shared.store.detach() {
            tracing::debug!(post_id = %self.shared.post_id, "Reaction widget torn down");
        }
        self.queue.shutdown();
        self.shared.retry.cancel();
    }

    pub fn is_torn_down(&self) -> bool {
        self.shared.store.is_detached()
    }
}

impl Shared {
    async fn send_toggle(&self, action: ReactionAction, generation: u64) -> Result<(), ApiError> {
        let state = self.store.snapshot();
        if action.outcome() == state.confirmed {
            // Flipped back to where the server already is.
            self.store.dispatch(ReactionIntent::ToggleSucceeded {
                generation,
                action,
                summary: state.reaction.summary(),
            });
            return Ok(());
        }

        let Some(user_id) = self.session.user_id() else {
            let err = ApiError::InvalidRequest("not signed in".to_string());
            self.fail_toggle(generation, &err);
            return Err(err);
        };

        let result = self
            .retry
            .run(|cancel| {
                let api = self.api.clone();
                let post_id = self.post_id.clone();
                let user_id = user_id.clone();
                async move {
                    match action {
                        ReactionAction::Set(reaction) => {
                            api.set_reaction(&user_id, &post_id, reaction, &cancel).await
                        }
                        ReactionAction::Clear => {
                            api.clear_reaction(&user_id, &post_id, &cancel).await
                        }
                    }
                }
            })
            .await;

        match result {
            Ok(summary) => {
                self.store.dispatch(ReactionIntent::ToggleSucceeded {
                    generation,
                    action,
                    summary,
                });
                Ok(())
            }
            Err(err) if err.is_cancellation() => Err(err),
            Err(err) => {
                self.fail_toggle(generation, &err);
                Err(err)
            }
        }
    }

    fn fail_toggle(&self, generation: u64, err: &ApiError) {
        let applied = self.store.dispatch(ReactionIntent::ToggleFailed {
            generation,
            message: err.to_string(),
        });
        if applied {
            self.alerts
                .raise(Alert::from_error(TOGGLE_FAILED_MESSAGE, err));
        }
    }
}

impl Drop for ReactionController {
    fn drop(&mut self) {
        self.teardown();
    }
}
