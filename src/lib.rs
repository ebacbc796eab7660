//! Client-side reaction handling for SkillBridge posts and comments.
//!
//! Every widget instance owns a [`queue::RequestQueue`] that runs its
//! requests one at a time with a trailing debounce, and a
//! [`retry::RetryExecutor`] that retries transient failures with
//! exponential backoff. Controllers publish state through an MVI
//! [`mvi::Store`] and report failed user actions on an [`alert`] channel.

pub mod alert;
pub mod api;
pub mod cancel;
pub mod comment;
pub mod config;
pub mod health;
pub mod logging;
pub mod mvi;
pub mod queue;
pub mod reaction;
pub mod retry;
pub mod session;
