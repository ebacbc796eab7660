use crate::mvi::Intent;

use super::state::LikeState;

#[derive(Debug, Clone)]
pub enum CommentLikeIntent {
    Toggle { generation: u64 },
    ToggleSucceeded { generation: u64, likes: LikeState },
    ToggleFailed { generation: u64, message: String },
}

impl Intent for CommentLikeIntent {}
