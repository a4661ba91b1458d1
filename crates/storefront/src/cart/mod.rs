//! Cart reconciliation.
//!
//! The shop API reports cart contents in several inconsistent shapes; this
//! module turns whatever arrives into a stable, fully defaulted view model,
//! enriches each line with live catalog data, and applies optimistic
//! add/remove mutations with rollback.
//!
//! Pipeline, leaf to root:
//!
//! 1. [`payload`] - classify the HTTP payload and default every raw line
//! 2. [`line`] - filter to positive quantities and complete the view model
//! 3. [`enrich`] - merge per-record catalog snapshots as fetches settle
//! 4. [`session`] - the mutation controller tying it together

pub mod backend;
pub mod badge;
pub mod enrich;
pub mod group;
pub mod line;
pub mod notify;
pub mod payload;
pub mod session;

pub use backend::{
    BackendError, CartBackend, CatalogBackend, LineSnapshot, OrderBackend, OrderSnapshot,
};
pub use badge::{BadgeFeed, BadgeSubscription};
pub use group::extract_group_label;
pub use line::{CartAggregate, CartLine, RecordSnapshot, build_view_lines};
pub use notify::{BannerNotifications, Notification, NotificationKind, NotificationSink};
pub use payload::{RawCartLine, decode_cart_payload};
pub use session::{CartSession, MutationOutcome};
