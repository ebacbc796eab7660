//! In-memory [`ReactionApi`] for controller tests.
//!
//! Keeps a tiny model of the backend (one reaction per user and post, a like
//! set per comment) and lets tests inject failures and latency per endpoint.

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::time::{sleep, Instant};

use crate::cancel::CancelToken;

use super::{ApiError, CommentLikeResponse, ReactionApi, ReactionSummary, ReactionType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum Endpoint {
    Summary,
    UserReaction,
    Set,
    Clear,
    CommentLike,
    Health,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Call {
    pub endpoint: Endpoint,
    pub reaction: Option<ReactionType>,
    pub at: Instant,
}

#[derive(Debug, Clone, Copy)]
pub(crate) enum Failure {
    Status(u16),
    Timeout,
}

impl Failure {
    fn into_error(self) -> ApiError {
        match self {
            Failure::Status(status) => ApiError::Status {
                status,
                message: format!("injected {}", status),
            },
            Failure::Timeout => ApiError::Timeout { duration_ms: 8000 },
        }
    }
}

#[derive(Default)]
struct FakeInner {
    reactions: HashMap<(String, String), ReactionType>,
    comment_likes: HashMap<String, HashSet<String>>,
    failures: HashMap<Endpoint, VecDeque<Failure>>,
    latency: Duration,
    calls: Vec<Call>,
}

#[derive(Default)]
pub(crate) struct FakeApi {
    inner: Mutex<FakeInner>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_latency(latency: Duration) -> Self {
        let fake = Self::default();
        fake.inner.lock().latency = latency;
        fake
    }

    pub fn seed_reaction(&self, user_id: &str, post_id: &str, reaction: ReactionType) {
        self.inner
            .lock()
            .reactions
            .insert((user_id.to_string(), post_id.to_string()), reaction);
    }

    pub fn seed_comment_likes(&self, comment_id: &str, users: &[&str]) {
        self.inner.lock().comment_likes.insert(
            comment_id.to_string(),
            users.iter().map(|u| u.to_string()).collect(),
        );
    }

    /// Fail the next calls to `endpoint`, one failure per call.
    pub fn fail(&self, endpoint: Endpoint, failures: impl IntoIterator<Item = Failure>) {
        self.inner
            .lock()
            .failures
            .entry(endpoint)
            .or_default()
            .extend(failures);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.inner.lock().calls.clone()
    }

    pub fn calls_to(&self, endpoint: Endpoint) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| c.endpoint == endpoint)
            .collect()
    }

    pub fn reaction_of(&self, user_id: &str, post_id: &str) -> Option<ReactionType> {
        self.inner
            .lock()
            .reactions
            .get(&(user_id.to_string(), post_id.to_string()))
            .copied()
    }

    /// Record the call, wait out the latency, then pop an injected failure.
    async fn enter(
        &self,
        endpoint: Endpoint,
        reaction: Option<ReactionType>,
        cancel: &CancelToken,
    ) -> Result<(), ApiError> {
        let latency = {
            let mut inner = self.inner.lock();
            inner.calls.push(Call {
                endpoint,
                reaction,
                at: Instant::now(),
            });
            inner.latency
        };

        if !latency.is_zero() {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(ApiError::Cancelled),
                _ = sleep(latency) => {}
            }
        }
        if cancel.is_cancelled() {
            return Err(ApiError::Cancelled);
        }

        let failure = self
            .inner
            .lock()
            .failures
            .get_mut(&endpoint)
            .and_then(VecDeque::pop_front);
        match failure {
            Some(failure) => Err(failure.into_error()),
            None => Ok(()),
        }
    }

    fn summary(&self, post_id: &str) -> ReactionSummary {
        let inner = self.inner.lock();
        let mut reactions = BTreeMap::new();
        for ((_, post), reaction) in &inner.reactions {
            if post == post_id {
                *reactions.entry(*reaction).or_insert(0) += 1;
            }
        }
        ReactionSummary {
            total: reactions.values().sum(),
            reactions,
        }
    }
}

#[async_trait]
impl ReactionApi for FakeApi {
    async fn fetch_summary(
        &self,
        post_id: &str,
        cancel: &CancelToken,
    ) -> Result<ReactionSummary, ApiError> {
        self.enter(Endpoint::Summary, None, cancel).await?;
        Ok(self.summary(post_id))
    }

    async fn fetch_user_reaction(
        &self,
        user_id: &str,
        post_id: &str,
        cancel: &CancelToken,
    ) -> Result<Option<ReactionType>, ApiError> {
        self.enter(Endpoint::UserReaction, None, cancel).await?;
        Ok(self.reaction_of(user_id, post_id))
    }

    async fn set_reaction(
        &self,
        user_id: &str,
        post_id: &str,
        reaction: ReactionType,
        cancel: &CancelToken,
    ) -> Result<ReactionSummary, ApiError> {
        self.enter(Endpoint::Set, Some(reaction), cancel).await?;
        self.seed_reaction(user_id, post_id, reaction);
        Ok(self.summary(post_id))
    }

    async fn clear_reaction(
        &self,
        user_id: &str,
        post_id: &str,
        cancel: &CancelToken,
    ) -> Result<ReactionSummary, ApiError> {
        self.enter(Endpoint::Clear, None, cancel).await?;
        self.inner
            .lock()
            .reactions
            .remove(&(user_id.to_string(), post_id.to_string()));
        Ok(self.summary(post_id))
    }

    async fn toggle_comment_like(
        &self,
        user_id: &str,
        comment_id: &str,
        cancel: &CancelToken,
    ) -> Result<CommentLikeResponse, ApiError> {
        self.enter(Endpoint::CommentLike, None, cancel).await?;
        let mut inner = self.inner.lock();
        let likes = inner.comment_likes.entry(comment_id.to_string()).or_default();
        let user_liked = if likes.remove(user_id) {
            false
        } else {
            likes.insert(user_id.to_string());
            true
        };
        Ok(CommentLikeResponse {
            like_count: likes.len() as u64,
            user_liked,
        })
    }

    async fn health(&self, cancel: &CancelToken) -> Result<(), ApiError> {
        self.enter(Endpoint::Health, None, cancel).await
    }
}
