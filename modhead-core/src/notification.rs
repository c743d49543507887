//! Transient user notifications
//!
//! The store only records the current notification; whoever displays it owns
//! the auto-hide timer and uses [`NotificationVariant::display_duration`] to
//! know when to dispatch a clear.

use std::fmt;
use std::time::Duration;

/// Kind of notification, which determines how long it stays visible
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum NotificationVariant {
    #[default]
    Default,
    ImportProfileSuccess,
    ImportProfileError,
}

impl NotificationVariant {
    /// How long the notification is shown before it auto-hides
    pub fn display_duration(self) -> Duration {
        match self {
            NotificationVariant::Default => Duration::from_millis(2000),
            NotificationVariant::ImportProfileSuccess => Duration::from_millis(4000),
            NotificationVariant::ImportProfileError => Duration::from_millis(6000),
        }
    }

    pub fn is_error(self) -> bool {
        matches!(self, NotificationVariant::ImportProfileError)
    }
}

impl fmt::Display for NotificationVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotificationVariant::Default => write!(f, "default"),
            NotificationVariant::ImportProfileSuccess => write!(f, "import-success"),
            NotificationVariant::ImportProfileError => write!(f, "import-error"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationInfo {
    pub message: String,
    pub variant: NotificationVariant,
}

impl NotificationInfo {
    pub fn new(message: impl Into<String>, variant: NotificationVariant) -> Self {
        Self {
            message: message.into(),
            variant,
        }
    }

    /// True once the notification has been visible for its full duration
    pub fn is_expired(&self, elapsed: Duration) -> bool {
        elapsed >= self.variant.display_duration()
    }
}
