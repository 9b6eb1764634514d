//! User-facing notices
//!
//! Classification decides *what* went wrong; a `Notifier` decides how the
//! user hears about it. The request client dispatches exactly one notice
//! per classified failure.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Warning,
    Error,
}

/// A toast-style message for the user
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
    pub at: DateTime<Utc>,
}

impl Notice {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
            at: Utc::now(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
            at: Utc::now(),
        }
    }
}

/// Receives notices produced by the client
pub trait Notifier: Send + Sync + 'static {
    fn notify(&self, notice: &Notice);
}

/// Writes notices to the log; used by the command-line front-end
#[derive(Debug, Default, Clone)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notice: &Notice) {
        match notice.level {
            NoticeLevel::Warning => tracing::warn!(target: "notice", "{}", notice.message),
            NoticeLevel::Error => tracing::error!(target: "notice", "{}", notice.message),
        }
    }
}

/// Forwards notices to a UI event loop
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    sender: mpsc::UnboundedSender<Notice>,
}

impl ChannelNotifier {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Notice>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, notice: &Notice) {
        if self.sender.send(notice.clone()).is_err() {
            tracing::debug!("Notice dropped, receiver closed: {}", notice.message);
        }
    }
}
