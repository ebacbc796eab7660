//! User-facing error alerts.
//!
//! Controllers raise an [`Alert`] for every failed user action; the embedding
//! UI drains the receiving end and shows each one. Cancellations and failed
//! background refreshes never produce alerts.

use tokio::sync::mpsc;

use crate::api::ApiError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    /// Message shown to the user.
    pub message: String,
    /// Technical detail for logs or an expandable section.
    pub detail: String,
}

impl Alert {
    pub fn new(message: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            detail: detail.into(),
        }
    }

    pub fn from_error(message: impl Into<String>, err: &ApiError) -> Self {
        Self::new(message, err.to_string())
    }
}

/// Sending half handed to controllers. Clones share the channel.
#[derive(Debug, Clone)]
pub struct AlertSink {
    tx: mpsc::UnboundedSender<Alert>,
}

impl AlertSink {
    pub fn raise(&self, alert: Alert) {
        tracing::warn!(message = %alert.message, detail = %alert.detail, "User alert");
        // Nobody listening is fine: the alert was logged.
        let _ = self.tx.send(alert);
    }
}

pub fn alert_channel() -> (AlertSink, mpsc::UnboundedReceiver<Alert>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (AlertSink { tx }, rx)
}
