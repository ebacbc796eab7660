use crate::mvi::Reducer;

use super::intent::CommentLikeIntent;
use super::state::{flipped, CommentLikeState};

pub struct CommentLikeReducer;

impl Reducer for CommentLikeReducer {
    type State = CommentLikeState;
    type Intent = CommentLikeIntent;

    fn reduce(mut state: Self::State, intent: Self::Intent) -> Self::State {
        match intent {
            CommentLikeIntent::Toggle { generation } => {
                state.loading = true;
                state.generation = generation;
                state.likes = flipped(state.likes);
                state.last_error = None;
            }
            CommentLikeIntent::ToggleSucceeded { generation, likes } => {
                state.confirmed = likes;
                if generation == state.generation {
                    state.loading = false;
                    state.likes = likes;
                }
            }
            CommentLikeIntent::ToggleFailed {
                generation,
                message,
            } => {
                state.last_error = Some(message);
                if generation == state.generation {
                    state.loading = false;
                    state.likes = state.confirmed;
                }
            }
        }
        state
    }
}
