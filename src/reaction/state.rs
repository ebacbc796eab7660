//! State of a post's reaction widget.

use std::collections::BTreeMap;

use crate::api::{ReactionSummary, ReactionType};
use crate::mvi::WidgetState;

/// Reaction data shown for one post.
///
/// Invariant: `total_count` equals the sum of `counts_by_type`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReactionState {
    pub current_reaction: Option<ReactionType>,
    pub total_count: u64,
    pub counts_by_type: BTreeMap<ReactionType, u64>,
}

impl ReactionState {
    /// Replace the counts with a server summary.
    ///
    /// The total is recomputed from the per-type counts; a disagreeing
    /// server total is logged and ignored.
    pub fn apply_summary(&mut self, summary: ReactionSummary) {
        let total: u64 = summary.reactions.values().sum();
        if total != summary.total {
            tracing::warn!(
                reported = summary.total,
                computed = total,
                "Reaction total disagrees with per-type counts"
            );
        }
        self.total_count = total;
        self.counts_by_type = summary.reactions;
    }

    /// The counts as a server summary.
    pub fn summary(&self) -> ReactionSummary {
        ReactionSummary {
            total: self.total_count,
            reactions: self.counts_by_type.clone(),
        }
    }

    pub fn count(&self, reaction: ReactionType) -> u64 {
        self.counts_by_type.get(&reaction).copied().unwrap_or(0)
    }

    pub fn is_consistent(&self) -> bool {
        self.total_count == self.counts_by_type.values().sum::<u64>()
    }
}

/// Whether a set/clear request is pending for the widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Loading,
}

/// What a toggle sends to the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactionAction {
    Set(ReactionType),
    Clear,
}

impl ReactionAction {
    /// Pressing the reaction the user already has clears it; anything else
    /// sets or replaces it.
    pub fn for_toggle(current: Option<ReactionType>, pressed: ReactionType) -> Self {
        if current == Some(pressed) {
            ReactionAction::Clear
        } else {
            ReactionAction::Set(pressed)
        }
    }

    /// The user's reaction once this action is confirmed.
    pub fn outcome(self) -> Option<ReactionType> {
        match self {
            ReactionAction::Set(reaction) => Some(reaction),
            ReactionAction::Clear => None,
        }
    }
}

/// Full widget state published to subscribers.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReactionWidgetState {
    pub phase: Phase,
    /// What the widget displays, including an optimistic toggle.
    pub reaction: ReactionState,
    /// The user's reaction as last confirmed by the server.
    pub confirmed: Option<ReactionType>,
    /// Generation of the most recent toggle.
    pub generation: u64,
    /// Message of the most recent failed toggle.
    pub last_error: Option<String>,
}

impl WidgetState for ReactionWidgetState {}

impl ReactionWidgetState {
    pub fn is_loading(&self) -> bool {
        self.phase == Phase::Loading
    }

    pub fn current_reaction(&self) -> Option<ReactionType> {
        self.reaction.current_reaction
    }
}
