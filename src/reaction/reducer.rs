//! Reducer for the reaction widget.
//!
//! A toggle applies its outcome optimistically and enters `Loading`. Only the
//! response to the most recent toggle (matching `generation`) returns the
//! widget to `Idle`; responses to older toggles update the confirmed state
//! and counts without disturbing a newer optimistic value.

use crate::mvi::Reducer;

use super::intent::ReactionIntent;
use super::state::{Phase, ReactionWidgetState};

pub struct ReactionReducer;

impl Reducer for ReactionReducer {
    type State = ReactionWidgetState;
    type Intent = ReactionIntent;

    fn reduce(mut state: Self::State, intent: Self::Intent) -> Self::State {
        match intent {
            ReactionIntent::Toggle { action, generation } => {
                state.phase = Phase::Loading;
                state.generation = generation;
                state.reaction.current_reaction = action.outcome();
                state.last_error = None;
            }

            ReactionIntent::CountsLoaded(summary) => {
                state.reaction.apply_summary(summary);
            }

            ReactionIntent::UserReactionLoaded(reaction) => {
                state.confirmed = reaction;
                if state.phase == Phase::Idle {
                    state.reaction.current_reaction = reaction;
                }
            }

            ReactionIntent::ToggleSucceeded {
                generation,
                action,
                summary,
            } => {
                state.confirmed = action.outcome();
                state.reaction.apply_summary(summary);
                if generation == state.generation {
                    state.phase = Phase::Idle;
                    state.reaction.current_reaction = state.confirmed;
                }
            }

            ReactionIntent::ToggleFailed {
                generation,
                message,
            } => {
                state.last_error = Some(message);
                if generation == state.generation {
                    state.phase = Phase::Idle;
                    state.reaction.current_reaction = state.confirmed;
                }
            }
        }
        state
    }
}
