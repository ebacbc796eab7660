//! REST access to the SkillBridge reaction endpoints.
//!
//! Controllers talk to the backend through the [`ReactionApi`] trait so the
//! queue and retry machinery can be exercised against an in-memory fake.
//! [`RestClient`] is the reqwest-backed implementation.

mod client;
mod error;
#[cfg(test)]
pub(crate) mod fake;
pub mod legacy;
mod types;

use async_trait::async_trait;

use crate::cancel::CancelToken;

pub use client::RestClient;
pub use error::{ApiError, ErrorClass};
pub use types::{
    CommentLikeResponse, ParseReactionError, ReactionSummary, ReactionType, UserReactionResponse,
};

/// Calls issued by reaction widgets.
///
/// Every call takes the cancellation token of its retry context and must
/// return [`ApiError::Cancelled`] promptly once the token fires.
#[async_trait]
pub trait ReactionApi: Send + Sync {
    /// `GET /api/reactions/post/{postId}`
    async fn fetch_summary(
        &self,
        post_id: &str,
        cancel: &CancelToken,
    ) -> Result<ReactionSummary, ApiError>;

    /// `GET /api/reactions/user?userId=&postId=`; `None` when the user has
    /// not reacted.
    async fn fetch_user_reaction(
        &self,
        user_id: &str,
        post_id: &str,
        cancel: &CancelToken,
    ) -> Result<Option<ReactionType>, ApiError>;

    /// `POST /api/reactions?userId=&postId=&type=`
    async fn set_reaction(
        &self,
        user_id: &str,
        post_id: &str,
        reaction: ReactionType,
        cancel: &CancelToken,
    ) -> Result<ReactionSummary, ApiError>;

    /// `DELETE /api/reactions?userId=&postId=`
    async fn clear_reaction(
        &self,
        user_id: &str,
        post_id: &str,
        cancel: &CancelToken,
    ) -> Result<ReactionSummary, ApiError>;

    /// `POST /api/comments/{commentId}/react?userId=&reactionType=like`
    async fn toggle_comment_like(
        &self,
        user_id: &str,
        comment_id: &str,
        cancel: &CancelToken,
    ) -> Result<CommentLikeResponse, ApiError>;

    /// `GET /api/health`
    async fn health(&self, cancel: &CancelToken) -> Result<(), ApiError>;
}
