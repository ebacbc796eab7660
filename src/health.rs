//! Backend availability probe.

use std::time::Duration;

use tokio::time::sleep;

use crate::api::ReactionApi;
use crate::cancel::CancelToken;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerStatus {
    pub is_running: bool,
    /// Health calls made, including the successful one.
    pub attempts: u32,
    pub last_error: Option<String>,
}

/// Ping the health endpoint until it answers, up to `max_attempts` times.
///
/// The pause between attempts starts at `initial_delay` and doubles. Any
/// failure counts as "not running yet", whatever its class.
pub async fn probe_server(
    api: &dyn ReactionApi,
    max_attempts: u32,
    initial_delay: Duration,
    cancel: &CancelToken,
) -> ServerStatus {
    let mut status = ServerStatus {
        is_running: false,
        attempts: 0,
        last_error: None,
    };
    let mut delay = initial_delay;

    while status.attempts < max_attempts.max(1) {
        status.attempts += 1;
        match api.health(cancel).await {
            Ok(()) => {
                tracing::info!(attempts = status.attempts, "Backend is reachable");
                status.is_running = true;
                status.last_error = None;
                return status;
            }
            Err(err) if err.is_cancellation() => {
                status.last_error = Some(err.to_string());
                return status;
            }
            Err(err) => {
                tracing::debug!(attempt = status.attempts, error = %err, "Health check failed");
                status.last_error = Some(err.to_string());
            }
        }

        if status.attempts >= max_attempts {
            break;
        }
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return status,
            _ = sleep(delay) => {}
        }
        delay *= 2;
    }

    tracing::warn!(attempts = status.attempts, "Backend unreachable");
    status
}
