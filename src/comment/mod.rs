//! Like button for a single comment.
//!
//! Shares the queue and retry machinery of the post reaction widget. The
//! backend endpoint toggles the like server-side, so the controller only
//! sends a request when the user's final intent differs from the confirmed
//! server state.

mod controller;
mod intent;
mod reducer;
mod state;

pub use controller::{CommentLikeController, LIKE_FAILED_MESSAGE, LIKE_SIGN_IN_MESSAGE};
pub use intent::CommentLikeIntent;
pub use reducer::CommentLikeReducer;
pub use state::{flipped, CommentLikeState, LikeState};
