//! Navigation badge feed.
//!
//! Replaces the push-based observable the navbar used to hang off: an
//! explicit subscriber registry. Each subscriber holds a token; dropping a
//! view means unsubscribing its token, after which it can never be called
//! again. Publishing is synchronous fire-and-forget.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use uuid::Uuid;

use super::line::CartAggregate;

type BadgeCallback = Box<dyn Fn(CartAggregate) + Send + Sync>;

/// Token identifying one badge subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BadgeSubscription(Uuid);

/// Registry of navigation badge subscribers.
#[derive(Default)]
pub struct BadgeFeed {
    subscribers: Mutex<HashMap<Uuid, BadgeCallback>>,
}

impl BadgeFeed {
    /// Create an empty feed.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a subscriber. The returned token is the only way to
    /// unsubscribe; keep it with the owning view.
    pub fn subscribe<F>(&self, callback: F) -> BadgeSubscription
    where
        F: Fn(CartAggregate) + Send + Sync + 'static,
    {
        let token = Uuid::new_v4();
        self.lock().insert(token, Box::new(callback));
        BadgeSubscription(token)
    }

    /// Remove a subscriber. Safe to call with an already removed token.
    pub fn unsubscribe(&self, subscription: &BadgeSubscription) {
        self.lock().remove(&subscription.0);
    }

    /// Push the current totals to every live subscriber.
    pub fn publish(&self, aggregate: CartAggregate) {
        for callback in self.lock().values() {
            callback(aggregate);
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<Uuid, BadgeCallback>> {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for BadgeFeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BadgeFeed")
            .field("subscribers", &self.lock().len())
            .finish()
    }
}
