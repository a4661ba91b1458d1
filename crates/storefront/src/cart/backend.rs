//! Backend collaborator contracts.
//!
//! The cart engine never talks to the network itself; it is handed these
//! trait objects at construction. The production implementation lives in
//! [`crate::api`]; tests substitute in-memory fakes.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use spindle_core::{Email, OrderId, Price, RecordId};
use thiserror::Error;

use super::line::RecordSnapshot;

/// Failure reported by any backend call.
#[derive(Debug, Error, Clone)]
pub enum BackendError {
    /// The request never produced a usable response.
    #[error("transport error: {0}")]
    Transport(String),
    /// The API answered with a failure status, possibly carrying a
    /// human-readable message for the user.
    #[error("shop API error ({status})")]
    Api {
        status: u16,
        message: Option<String>,
    },
}

impl BackendError {
    /// The server-provided human-readable message, when there is one.
    #[must_use]
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Api {
                message: Some(message),
                ..
            } => Some(message),
            _ => None,
        }
    }
}

/// The server's view of one cart line after a mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineSnapshot {
    pub record_id: RecordId,
    pub quantity: u32,
    pub stock: Option<u32>,
}

/// A placed order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderSnapshot {
    pub order_id: OrderId,
    pub total: Price,
    pub placed_at: DateTime<Utc>,
}

/// Cart storage behind the shop API.
#[async_trait]
pub trait CartBackend: Send + Sync {
    /// Load the raw cart payload for a customer. The shape is whatever the
    /// API felt like sending; see [`crate::cart::payload`].
    async fn load_cart_by_email(&self, email: &Email) -> Result<Value, BackendError>;

    /// Increment a line's quantity by `delta`. `None` means the server
    /// accepted the change but returned no line body.
    async fn increment_line(
        &self,
        email: &Email,
        record_id: RecordId,
        delta: u32,
    ) -> Result<Option<LineSnapshot>, BackendError>;

    /// Decrement a line's quantity by `delta`.
    async fn decrement_line(
        &self,
        email: &Email,
        record_id: RecordId,
        delta: u32,
    ) -> Result<Option<LineSnapshot>, BackendError>;
}

/// Catalog record lookups.
#[async_trait]
pub trait CatalogBackend: Send + Sync {
    /// Fetch the current catalog snapshot for a record. `Ok(None)` means the
    /// record does not exist (or the API sent an empty body); callers treat
    /// it like a failed fetch.
    async fn fetch_record(&self, record_id: RecordId)
    -> Result<Option<RecordSnapshot>, BackendError>;
}

/// Order placement.
#[async_trait]
pub trait OrderBackend: Send + Sync {
    /// Turn the customer's cart into an order.
    async fn place_order(
        &self,
        email: &Email,
        payment_method: &str,
    ) -> Result<OrderSnapshot, BackendError>;
}
