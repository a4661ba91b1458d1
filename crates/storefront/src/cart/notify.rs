//! Transient user notifications.
//!
//! Mutation and checkout outcomes surface as a banner that clears itself
//! five seconds after being set. Each set schedules its own independent
//! clear, and a clear wipes whatever banner is current at that moment, so
//! a banner set shortly before an earlier one's timer fires can be wiped
//! early. The state carries no generation counter.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// How long a banner stays up.
const AUTO_CLEAR: Duration = Duration::from_secs(5);

/// Banner flavor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Error,
}

/// One transient banner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
}

/// Sink for user-visible notifications, constructor-passed to the cart
/// session like every other collaborator.
pub trait NotificationSink: Send + Sync {
    /// Surface a notification. Fire-and-forget; must not block.
    fn push(&self, notification: Notification);

    /// Drop any currently visible notification.
    fn clear(&self);
}

/// The standard banner implementation with the five-second auto-clear.
///
/// The auto-clear timer needs a live Tokio runtime; without one the banner
/// is set but never expires on its own.
#[derive(Clone, Default)]
pub struct BannerNotifications {
    current: Arc<Mutex<Option<Notification>>>,
}

impl BannerNotifications {
    /// Create an empty banner holder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The currently visible notification, if any.
    #[must_use]
    pub fn current(&self) -> Option<Notification> {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<Notification>> {
        self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl NotificationSink for BannerNotifications {
    fn push(&self, notification: Notification) {
        *self.lock() = Some(notification);

        // Outside a runtime there is nothing to schedule the clear on; the
        // banner simply stays up until the next push or explicit clear.
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            return;
        };
        let current = Arc::clone(&self.current);
        handle.spawn(async move {
            tokio::time::sleep(AUTO_CLEAR).await;
            *current.lock().unwrap_or_else(PoisonError::into_inner) = None;
        });
    }

    fn clear(&self) {
        *self.lock() = None;
    }
}

impl std::fmt::Debug for BannerNotifications {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BannerNotifications")
            .field("current", &self.current())
            .finish()
    }
}
