//! Notification sink

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Success,
    Error,
}

/// A message surfaced to the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub message: String,
    pub severity: Severity,
}

/// Fire-and-forget user notifications
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str, severity: Severity);
}

/// Forwards notifications to whoever owns the receiving end (the UI loop)
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    tx: mpsc::Sender<Notification>,
}

impl ChannelNotifier {
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<Notification>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, message: &str, severity: Severity) {
        let notification = Notification {
            message: message.to_string(),
            severity,
        };
        // 通知丢失不影响工作流本身
        if let Err(e) = self.tx.try_send(notification) {
            warn!("Dropping notification: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_channel_notifier_forwards() {
        let (notifier, mut rx) = ChannelNotifier::channel(4);
        notifier.notify("Copied!", Severity::Success);

        let received = rx.recv().await.unwrap();
        assert_eq!(received.message, "Copied!");
        assert_eq!(received.severity, Severity::Success);
    }

    #[test]
    fn test_severity_serializes_snake_case() {
        let json = serde_json::to_string(&Notification {
            message: "Failed".to_string(),
            severity: Severity::Error,
        })
        .unwrap();
        assert_eq!(json, r#"{"message":"Failed","severity":"error"}"#);
    }
}
