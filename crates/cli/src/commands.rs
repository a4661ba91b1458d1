//! Command handlers: build the session, run one mutation, print the cart.

use std::sync::Arc;

use thiserror::Error;

use spindle_core::{Email, EmailError, RecordId, Role};
use spindle_storefront::{
    BadgeFeed, BannerNotifications, CartBackend, CartSession, CatalogBackend, ConfigError,
    MutationOutcome, NotificationKind, OrderBackend, ShopApiClient, ShopApiError, ShopConfig,
};

/// Errors that stop a command before the session is usable.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("invalid email: {0}")]
    Email(#[from] EmailError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("client error: {0}")]
    Client(#[from] ShopApiError),
}

/// A session plus the banner it reports into.
pub struct OpenSession {
    pub session: CartSession,
    pub banner: BannerNotifications,
}

/// Wire config, client, and session together and load the cart.
pub async fn open_session(email: &str, role: Role) -> Result<OpenSession, CliError> {
    let email = Email::parse(email)?;
    let config = ShopConfig::from_env()?;
    let client = Arc::new(ShopApiClient::new(&config)?);
    let banner = BannerNotifications::new();

    let session = CartSession::new(
        Arc::clone(&client) as Arc<dyn CartBackend>,
        Arc::clone(&client) as Arc<dyn CatalogBackend>,
        client as Arc<dyn OrderBackend>,
        Arc::new(banner.clone()),
        Arc::new(BadgeFeed::new()),
    );

    if role.is_admin() {
        session.view_as_admin(email).await;
    } else {
        session.view_own_cart(email).await;
    }

    Ok(OpenSession { session, banner })
}

pub async fn add(open: &OpenSession, record: i32) {
    if refuse_admin_mutation(open) {
        return;
    }
    let outcome = open.session.add_line(RecordId::new(record)).await;
    report_outcome(open, outcome);
}

pub async fn remove(open: &OpenSession, record: i32) {
    if refuse_admin_mutation(open) {
        return;
    }
    let outcome = open.session.remove_line(RecordId::new(record)).await;
    report_outcome(open, outcome);
}

pub async fn checkout(open: &OpenSession, payment_method: &str) {
    if refuse_admin_mutation(open) {
        return;
    }
    let outcome = open.session.create_order(payment_method).await;
    report_outcome(open, outcome);
}

/// Admin impersonation is read-only; the engine only guards order creation,
/// so the caller refuses the rest.
#[allow(clippy::print_stdout)]
fn refuse_admin_mutation(open: &OpenSession) -> bool {
    if open.session.is_admin_view() {
        println!("Read-only admin view; mutations are disabled.");
        return true;
    }
    false
}

#[allow(clippy::print_stdout, clippy::print_stderr)]
fn report_outcome(open: &OpenSession, outcome: MutationOutcome) {
    if outcome == MutationOutcome::Skipped {
        println!("Nothing to do.");
        return;
    }
    if let Some(banner) = open.banner.current() {
        match banner.kind {
            NotificationKind::Success => println!("{}", banner.message),
            NotificationKind::Error => eprintln!("{}", banner.message),
        }
    }
}

#[allow(clippy::print_stdout)]
pub fn print_cart(open: &OpenSession) {
    let lines = open.session.lines();
    if lines.is_empty() {
        println!("Cart is empty.");
        return;
    }

    for line in &lines {
        println!(
            "{quantity:>3} x {title} [{group}] @ {unit} = {total}{stock}",
            quantity = line.quantity,
            title = line.title,
            group = line.group_label,
            unit = line.unit_price,
            total = line.line_total(),
            stock = line
                .stock
                .map_or_else(String::new, |s| format!(" ({s} in stock)")),
        );
    }

    let aggregate = open.session.aggregate();
    println!("---");
    println!(
        "{items} item(s), total {total}",
        items = aggregate.total_items,
        total = aggregate.total_price,
    );
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use async_trait::async_trait;
    use serde_json::{Value, json};
    use spindle_storefront::RecordSnapshot;
    use spindle_storefront::cart::{BackendError, LineSnapshot, OrderSnapshot};

    use super::*;

    /// Counts every backend mutation reaching the server.
    struct FakeShop {
        mutations: AtomicU32,
    }

    #[async_trait]
    impl CartBackend for FakeShop {
        async fn load_cart_by_email(&self, _email: &Email) -> Result<Value, BackendError> {
            Ok(json!([{ "recordId": 1, "amount": 2, "price": 10.0 }]))
        }

        async fn increment_line(
            &self,
            _email: &Email,
            _record_id: RecordId,
            _delta: u32,
        ) -> Result<Option<LineSnapshot>, BackendError> {
            self.mutations.fetch_add(1, Ordering::SeqCst);
            Ok(None)
        }

        async fn decrement_line(
            &self,
            _email: &Email,
            _record_id: RecordId,
            _delta: u32,
        ) -> Result<Option<LineSnapshot>, BackendError> {
            self.mutations.fetch_add(1, Ordering::SeqCst);
            Ok(None)
        }
    }

    #[async_trait]
    impl CatalogBackend for FakeShop {
        async fn fetch_record(
            &self,
            _record_id: RecordId,
        ) -> Result<Option<RecordSnapshot>, BackendError> {
            Ok(None)
        }
    }

    #[async_trait]
    impl OrderBackend for FakeShop {
        async fn place_order(
            &self,
            _email: &Email,
            _payment_method: &str,
        ) -> Result<OrderSnapshot, BackendError> {
            self.mutations.fetch_add(1, Ordering::SeqCst);
            Err(BackendError::Transport("not under test".to_owned()))
        }
    }

    async fn open_with_fake(admin: bool) -> (Arc<FakeShop>, OpenSession) {
        let shop = Arc::new(FakeShop {
            mutations: AtomicU32::new(0),
        });
        let banner = BannerNotifications::new();
        let session = CartSession::new(
            Arc::clone(&shop) as Arc<dyn CartBackend>,
            Arc::clone(&shop) as Arc<dyn CatalogBackend>,
            Arc::clone(&shop) as Arc<dyn OrderBackend>,
            Arc::new(banner.clone()),
            Arc::new(BadgeFeed::new()),
        );

        let email = Email::parse("customer@example.com").expect("valid email");
        if admin {
            session.view_as_admin(email).await;
        } else {
            session.view_own_cart(email).await;
        }
        (shop, OpenSession { session, banner })
    }

    #[tokio::test]
    async fn test_admin_view_refuses_all_mutations() {
        let (shop, open) = open_with_fake(true).await;

        add(&open, 1).await;
        remove(&open, 1).await;
        checkout(&open, "credit-card").await;

        assert_eq!(shop.mutations.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_customer_view_mutations_reach_backend() {
        let (shop, open) = open_with_fake(false).await;

        add(&open, 1).await;

        assert_eq!(shop.mutations.load(Ordering::SeqCst), 1);
    }
}
