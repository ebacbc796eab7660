//! Post reaction widget: state, intents, reducer, and controller.

mod controller;
mod intent;
mod reducer;
mod state;

pub use controller::{ReactionController, SIGN_IN_MESSAGE, TOGGLE_FAILED_MESSAGE};
pub use intent::ReactionIntent;
pub use reducer::ReactionReducer;
pub use state::{Phase, ReactionAction, ReactionState, ReactionWidgetState};
