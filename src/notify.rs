//! Single transient user-facing status message.
//!
//! There is exactly one [`Notification`] per screen. Each `show` overwrites
//! it; nothing is queued. `close` only hides it, so the last message and kind
//! stay readable until the next `show`.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::debug;

/// Whether a notification reports success or failure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NotificationKind {
    /// Operation completed.
    #[default]
    Success,
    /// Operation failed or was refused.
    Error,
}

impl NotificationKind {
    /// Returns the stable lowercase label.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of the notification singleton.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Notification {
    /// Message text.
    pub message: String,
    /// Success or error.
    pub kind: NotificationKind,
    /// Whether the banner is currently shown.
    pub visible: bool,
}

/// Shared handle to the notification singleton.
///
/// Cloning the handle shares the same underlying notification, so every
/// component can write to one sink.
#[derive(Debug, Clone, Default)]
pub struct NotificationChannel {
    inner: Arc<Mutex<Notification>>,
}

impl NotificationChannel {
    /// Creates a channel with a hidden, empty notification.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrites the notification and makes it visible.
    pub fn show(&self, message: impl Into<String>, kind: NotificationKind) {
        let message = message.into();
        debug!(kind = %kind, message = %message, "notification shown");
        let mut guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        *guard = Notification {
            message,
            kind,
            visible: true,
        };
    }

    /// Shorthand for `show(message, NotificationKind::Success)`.
    pub fn success(&self, message: impl Into<String>) {
        self.show(message, NotificationKind::Success);
    }

    /// Shorthand for `show(message, NotificationKind::Error)`.
    pub fn error(&self, message: impl Into<String>) {
        self.show(message, NotificationKind::Error);
    }

    /// Hides the notification without clearing its message or kind.
    pub fn close(&self) {
        let mut guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        guard.visible = false;
    }

    /// Returns a copy of the current notification.
    #[must_use]
    pub fn current(&self) -> Notification {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
