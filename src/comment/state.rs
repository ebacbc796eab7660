//! State of a comment's like button.

use crate::api::CommentLikeResponse;
use crate::mvi::WidgetState;

/// Like count and whether the current user is among the likers.
pub type LikeState = CommentLikeResponse;

/// The state after the user presses the like button once.
pub fn flipped(likes: LikeState) -> LikeState {
    if likes.user_liked {
        LikeState {
            like_count: likes.like_count.saturating_sub(1),
            user_liked: false,
        }
    } else {
        LikeState {
            like_count: likes.like_count + 1,
            user_liked: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommentLikeState {
    pub loading: bool,
    /// What the button displays, including an optimistic flip.
    pub likes: LikeState,
    /// Last value confirmed by the server.
    pub confirmed: LikeState,
    pub generation: u64,
    pub last_error: Option<String>,
}

impl WidgetState for CommentLikeState {}

impl CommentLikeState {
    pub fn new(initial: LikeState) -> Self {
        Self {
            likes: initial,
            confirmed: initial,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flip_adjusts_count() {
        let unliked = LikeState {
            like_count: 2,
            user_liked: false,
        };
        let liked = flipped(unliked);
        assert_eq!(liked.like_count, 3);
        assert!(liked.user_liked);
        assert_eq!(flipped(liked), unliked);
    }

    #[test]
    fn flip_never_underflows() {
        let odd = LikeState {
            like_count: 0,
            user_liked: true,
        };
        assert_eq!(flipped(odd).like_count, 0);
    }
}
