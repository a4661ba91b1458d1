//! Cart mutation controller.
//!
//! One [`CartSession`] owns the view state for one displayed cart: the line
//! sequence, the loading flag, and whose cart is being looked at. All
//! backend collaborators are constructor-passed trait objects. Mutations are
//! optimistic - the local state changes first, the backend confirms or the
//! change is rolled back - and every local change or reload republishes the
//! aggregate totals to the badge feed.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, instrument, warn};

use spindle_core::{Email, RecordId};

use super::backend::{CartBackend, CatalogBackend, OrderBackend};
use super::badge::BadgeFeed;
use super::enrich::enrich_lines;
use super::line::{CartAggregate, CartLine, build_view_lines};
use super::notify::{Notification, NotificationKind, NotificationSink};
use super::payload::decode_cart_payload;

/// Outcome of one mutation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationOutcome {
    /// The backend confirmed the change and the cart was reloaded.
    Committed,
    /// The backend rejected the change; local state was restored.
    RolledBack,
    /// A guard held (mutation already in flight, no session, nothing to
    /// remove); nothing happened.
    Skipped,
}

/// View state owned exclusively by this session.
#[derive(Debug, Default)]
struct ViewState {
    lines: Vec<CartLine>,
    loading: bool,
    viewed_email: Option<Email>,
    admin_view: bool,
}

/// The cart view controller.
pub struct CartSession {
    cart: Arc<dyn CartBackend>,
    catalog: Arc<dyn CatalogBackend>,
    orders: Arc<dyn OrderBackend>,
    notifications: Arc<dyn NotificationSink>,
    badge: Arc<BadgeFeed>,
    state: Mutex<ViewState>,
    adding_to_cart: AtomicBool,
    creating_order: AtomicBool,
}

impl CartSession {
    /// Create a session over the given collaborators.
    #[must_use]
    pub fn new(
        cart: Arc<dyn CartBackend>,
        catalog: Arc<dyn CatalogBackend>,
        orders: Arc<dyn OrderBackend>,
        notifications: Arc<dyn NotificationSink>,
        badge: Arc<BadgeFeed>,
    ) -> Self {
        Self {
            cart,
            catalog,
            orders,
            notifications,
            badge,
            state: Mutex::new(ViewState::default()),
            adding_to_cart: AtomicBool::new(false),
            creating_order: AtomicBool::new(false),
        }
    }

    /// Start viewing the signed-in customer's own cart and load it.
    pub async fn view_own_cart(&self, email: Email) {
        {
            let mut state = self.lock_state();
            state.viewed_email = Some(email);
            state.admin_view = false;
        }
        self.reload().await;
    }

    /// Start viewing another customer's cart read-only (admin impersonation)
    /// and load it. Order creation is disabled in this mode.
    pub async fn view_as_admin(&self, target: Email) {
        {
            let mut state = self.lock_state();
            state.viewed_email = Some(target);
            state.admin_view = true;
        }
        self.reload().await;
    }

    /// Drop the viewed session and zero the badge.
    pub fn clear_session(&self) {
        {
            let mut state = self.lock_state();
            state.viewed_email = None;
            state.admin_view = false;
            state.lines = Vec::new();
            state.loading = false;
        }
        self.badge.publish(CartAggregate::ZERO);
    }

    /// Reload the cart from the backend and run the full normalization and
    /// enrichment pipeline. Load failures degrade to an empty cart; the
    /// loading flag always ends false and totals are always republished.
    #[instrument(skip(self))]
    pub async fn reload(&self) {
        let Some(email) = self.viewed_email() else {
            return;
        };

        {
            let mut state = self.lock_state();
            state.loading = true;
        }

        let lines = match self.cart.load_cart_by_email(&email).await {
            Ok(payload) => {
                let raw = decode_cart_payload(&payload);
                let view = build_view_lines(&raw);
                if view.is_empty() {
                    view
                } else {
                    enrich_lines(Arc::clone(&self.catalog), view).await
                }
            }
            Err(error) => {
                warn!(%error, "failed to load cart details");
                Vec::new()
            }
        };

        {
            let mut state = self.lock_state();
            state.lines = lines;
            state.loading = false;
        }
        self.publish_totals();
    }

    /// Add one unit of a record to the cart, optimistically.
    ///
    /// No-op while another add is in flight or without a viewed session. On
    /// backend failure the matching line's quantity is restored to its exact
    /// pre-call value.
    #[instrument(skip(self))]
    pub async fn add_line(&self, record_id: RecordId) -> MutationOutcome {
        let Some(_guard) = FlagGuard::try_acquire(&self.adding_to_cart) else {
            return MutationOutcome::Skipped;
        };
        let Some(email) = self.viewed_email() else {
            return MutationOutcome::Skipped;
        };

        self.notifications.clear();

        // Optimistic: bump the matching line now, stock carried forward.
        let pre_quantity = self.quantity_of(record_id);
        if let Some(pre) = pre_quantity {
            self.apply_quantity(record_id, pre.saturating_add(1));
            self.publish_totals();
        }

        match self.cart.increment_line(&email, record_id, 1).await {
            Ok(confirmed) => {
                if let Some(snapshot) = confirmed {
                    self.apply_stock(record_id, snapshot.stock);
                }
                self.reload().await;
                self.patch_stock(record_id).await;
                self.push_success("Product added to cart");
                MutationOutcome::Committed
            }
            Err(error) => {
                warn!(%record_id, %error, "failed to add product to cart");
                if let Some(pre) = pre_quantity {
                    self.apply_quantity(record_id, pre);
                    self.publish_totals();
                }
                self.push_error("Failed to add product to cart");
                MutationOutcome::RolledBack
            }
        }
    }

    /// Remove one unit of a record from the cart, optimistically.
    ///
    /// No-op when the line is absent or already at zero quantity. On backend
    /// failure the quantity is restored to its exact pre-call value, the
    /// same rollback policy as [`Self::add_line`].
    #[instrument(skip(self))]
    pub async fn remove_line(&self, record_id: RecordId) -> MutationOutcome {
        let Some(email) = self.viewed_email() else {
            return MutationOutcome::Skipped;
        };
        let Some(pre) = self.quantity_of(record_id).filter(|quantity| *quantity > 0) else {
            return MutationOutcome::Skipped;
        };

        self.apply_quantity(record_id, pre.saturating_sub(1));
        self.publish_totals();

        match self.cart.decrement_line(&email, record_id, 1).await {
            Ok(_confirmed) => {
                self.reload().await;
                self.patch_stock(record_id).await;
                self.push_success("Product removed from cart");
                MutationOutcome::Committed
            }
            Err(error) => {
                warn!(%record_id, %error, "failed to remove product from cart");
                self.apply_quantity(record_id, pre);
                self.publish_totals();
                self.push_error("Failed to remove product from cart");
                MutationOutcome::RolledBack
            }
        }
    }

    /// Turn the cart into an order.
    ///
    /// No-op without a session, in admin view, or while another order is in
    /// flight. On success the cart is reloaded (now empty) and the badge is
    /// explicitly zeroed; on failure the server's message is surfaced when
    /// it sent one.
    #[instrument(skip(self))]
    pub async fn create_order(&self, payment_method: &str) -> MutationOutcome {
        let Some(email) = self.viewed_email() else {
            return MutationOutcome::Skipped;
        };
        if self.is_admin_view() {
            return MutationOutcome::Skipped;
        }
        let Some(_guard) = FlagGuard::try_acquire(&self.creating_order) else {
            return MutationOutcome::Skipped;
        };

        self.notifications.clear();

        match self.orders.place_order(&email, payment_method).await {
            Ok(order) => {
                debug!(order_id = %order.order_id, "order created");
                self.push_success("Order created successfully");
                self.reload().await;
                self.badge.publish(CartAggregate::ZERO);
                MutationOutcome::Committed
            }
            Err(error) => {
                warn!(%error, "failed to create order");
                let message = error
                    .server_message()
                    .unwrap_or("Failed to create order")
                    .to_owned();
                self.notifications.push(Notification {
                    kind: NotificationKind::Error,
                    message,
                });
                MutationOutcome::RolledBack
            }
        }
    }

    /// Current view-model lines (a fresh clone, never shared state).
    #[must_use]
    pub fn lines(&self) -> Vec<CartLine> {
        self.lock_state().lines.clone()
    }

    /// Whether a load/enrichment pass is still in progress.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.lock_state().loading
    }

    /// Derived totals for the current lines.
    #[must_use]
    pub fn aggregate(&self) -> CartAggregate {
        CartAggregate::compute(&self.lock_state().lines)
    }

    /// Whose cart is being displayed.
    #[must_use]
    pub fn viewed_email(&self) -> Option<Email> {
        self.lock_state().viewed_email.clone()
    }

    /// Whether this is a read-only admin impersonation view.
    #[must_use]
    pub fn is_admin_view(&self) -> bool {
        self.lock_state().admin_view
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, ViewState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn quantity_of(&self, record_id: RecordId) -> Option<u32> {
        self.lock_state()
            .lines
            .iter()
            .find(|line| line.record_id == record_id)
            .map(|line| line.quantity)
    }

    /// Replace the line sequence with one where the first matching line has
    /// the given quantity. Wholesale replacement, no in-place mutation.
    fn apply_quantity(&self, record_id: RecordId, quantity: u32) {
        let mut state = self.lock_state();
        let Some(index) = state
            .lines
            .iter()
            .position(|line| line.record_id == record_id)
        else {
            return;
        };
        state.lines = state
            .lines
            .iter()
            .cloned()
            .enumerate()
            .map(|(i, line)| {
                if i == index {
                    CartLine { quantity, ..line }
                } else {
                    line
                }
            })
            .collect();
    }

    /// Same wholesale replacement, for the stock field.
    fn apply_stock(&self, record_id: RecordId, stock: Option<u32>) {
        let mut state = self.lock_state();
        let Some(index) = state
            .lines
            .iter()
            .position(|line| line.record_id == record_id)
        else {
            return;
        };
        state.lines = state
            .lines
            .iter()
            .cloned()
            .enumerate()
            .map(|(i, line)| {
                if i == index {
                    CartLine { stock, ..line }
                } else {
                    line
                }
            })
            .collect();
    }

    /// Re-fetch one record and patch its current stock into the view.
    async fn patch_stock(&self, record_id: RecordId) {
        match self.catalog.fetch_record(record_id).await {
            Ok(Some(snapshot)) => self.apply_stock(record_id, snapshot.stock),
            Ok(None) => {}
            Err(error) => debug!(%record_id, %error, "stock refresh failed"),
        }
    }

    fn publish_totals(&self) {
        let aggregate = self.aggregate();
        self.badge.publish(aggregate);
    }

    fn push_success(&self, message: &str) {
        self.notifications.push(Notification {
            kind: NotificationKind::Success,
            message: message.to_owned(),
        });
    }

    fn push_error(&self, message: &str) {
        self.notifications.push(Notification {
            kind: NotificationKind::Error,
            message: message.to_owned(),
        });
    }
}

impl std::fmt::Debug for CartSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock_state();
        f.debug_struct("CartSession")
            .field("viewed_email", &state.viewed_email)
            .field("admin_view", &state.admin_view)
            .field("lines", &state.lines.len())
            .field("loading", &state.loading)
            .finish()
    }
}

/// Re-entrancy guard over an atomic flag; released on drop.
struct FlagGuard<'a>(&'a AtomicBool);

impl<'a> FlagGuard<'a> {
    fn try_acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for FlagGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}
