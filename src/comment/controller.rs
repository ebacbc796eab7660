use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::watch;
use uuid::Uuid;

use crate::alert::{Alert, AlertSink};
use crate::api::{ApiError, ReactionApi};
use crate::config::Config;
use crate::mvi::Store;
use crate::queue::{QueueStats, RequestQueue};
use crate::retry::{RetryExecutor, RetryPolicy};
use crate::session::Session;

use super::intent::CommentLikeIntent;
use super::reducer::CommentLikeReducer;
use super::state::{CommentLikeState, LikeState};

pub const LIKE_FAILED_MESSAGE: &str = "Failed to update like";
pub const LIKE_SIGN_IN_MESSAGE: &str = "Please sign in to like comments.";

#[derive(Clone)]
struct Shared {
    comment_id: Arc<str>,
    session: Session,
    api: Arc<dyn ReactionApi>,
    retry: Arc<RetryExecutor>,
    store: Arc<Store<CommentLikeReducer>>,
    alerts: AlertSink,
}

/// Controller for one comment's like button.
pub struct CommentLikeController {
    shared: Shared,
    queue: RequestQueue,
    generation: AtomicU64,
}

impl CommentLikeController {
    /// `initial` is the like state delivered with the comment listing.
    pub fn new(
        comment_id: impl Into<Arc<str>>,
        initial: LikeState,
        session: Session,
        api: Arc<dyn ReactionApi>,
        config: &Config,
        alerts: AlertSink,
    ) -> Self {
        let comment_id: Arc<str> = comment_id.into();
        let queue = RequestQueue::from_config(
            format!("comment:{}/{}", comment_id, Uuid::new_v4()),
            &config.queue,
        );

        Self {
            shared: Shared {
                comment_id,
                session,
                api,
                retry: Arc::new(RetryExecutor::new(RetryPolicy::from(&config.retry))),
                store: Arc::new(Store::with_state(CommentLikeState::new(initial))),
                alerts,
            },
            queue,
            generation: AtomicU64::new(0),
        }
    }

    pub fn state(&self) -> CommentLikeState {
        self.shared.store.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<CommentLikeState> {
        self.shared.store.subscribe()
    }

    pub fn queue_stats(&self) -> QueueStats {
        self.queue.stats()
    }

    pub async fn settle(&self) {
        self.queue.wait_idle().await;
    }

    pub fn toggle_like(&self) {
        if self.shared.session.user_id().is_none() {
            self.shared.alerts.raise(Alert::new(
                LIKE_SIGN_IN_MESSAGE,
                format!("comment {}", self.shared.comment_id),
            ));
            return;
        }

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let Some(wants_liked) = self.shared.store.dispatch_with(|state| {
            (
                CommentLikeIntent::Toggle { generation },
                !state.likes.user_liked,
            )
        }) else {
            return;
        };

        let shared = self.shared.clone();
        self.queue
            .enqueue(move || async move { shared.send_toggle(wants_liked, generation).await });
    }

    /// Stop all work for this button. Idempotent.
    pub fn teardown(&self) {
        if self.shared.store.detach() {
            tracing::debug!(comment_id = %self.shared.comment_id, "Comment like torn down");
        }
        self.queue.shutdown();
        self.shared.retry.cancel();
    }
}

impl Shared {
    async fn send_toggle(&self, wants_liked: bool, generation: u64) -> Result<(), ApiError> {
        let confirmed = self.store.snapshot().confirmed;
        if confirmed.user_liked == wants_liked {
            // Flipped back to where the server already is.
            self.store.dispatch(CommentLikeIntent::ToggleSucceeded {
                generation,
                likes: confirmed,
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
                let comment_id = self.comment_id.clone();
                let user_id = user_id.clone();
                async move { api.toggle_comment_like(&user_id, &comment_id, &cancel).await }
            })
            .await;

        match result {
            Ok(likes) => {
                if likes.user_liked != wants_liked {
                    tracing::debug!(
                        comment_id = %self.comment_id,
                        user_liked = likes.user_liked,
                        "Server like state differs from request, adopting server value"
                    );
                }
                self.store
                    .dispatch(CommentLikeIntent::ToggleSucceeded { generation, likes });
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
        let applied = self.store.dispatch(CommentLikeIntent::ToggleFailed {
            generation,
            message: err.to_string(),
        });
        if applied {
            self.alerts.raise(Alert::from_error(LIKE_FAILED_MESSAGE, err));
        }
    }
}

impl Drop for CommentLikeController {
    fn drop(&mut self) {
        self.teardown();
    }
}
