//! Intents for the reaction widget.

use crate::api::{ReactionSummary, ReactionType};
use crate::mvi::Intent;

use super::state::ReactionAction;

#[derive(Debug, Clone)]
pub enum ReactionIntent {
    /// The user pressed a reaction; the request is now queued.
    Toggle {
        action: ReactionAction,
        generation: u64,
    },

    /// Background fetch of the post's aggregate counts finished.
    CountsLoaded(ReactionSummary),

    /// Background fetch of the user's own reaction finished.
    UserReactionLoaded(Option<ReactionType>),

    /// The server confirmed a set/clear request.
    ToggleSucceeded {
        generation: u64,
        action: ReactionAction,
        summary: ReactionSummary,
    },

    /// A set/clear request failed for good.
    ToggleFailed { generation: u64, message: String },
}

impl Intent for ReactionIntent {}
