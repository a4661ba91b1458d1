//! Spindle Storefront library.
//!
//! Client-side cart engine for the Spindle record shop. The cart's source of
//! truth lives behind a remote REST API; this crate reconciles that API's
//! partial, inconsistently shaped responses into a stable view model, applies
//! optimistic mutations with rollback, and republishes aggregate totals to
//! the navigation badge.
//!
//! # Modules
//!
//! - [`cart`] - Payload normalization, enrichment, and the mutation controller
//! - [`api`] - `reqwest` implementation of the backend traits
//! - [`config`] - Environment-driven configuration

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod cart;
pub mod config;

pub use api::{ShopApiClient, ShopApiError};
pub use cart::{
    BadgeFeed, BadgeSubscription, BannerNotifications, CartAggregate, CartBackend, CartLine,
    CartSession, CatalogBackend, MutationOutcome, Notification, NotificationKind,
    NotificationSink, OrderBackend, RecordSnapshot,
};
pub use config::{ConfigError, ShopConfig};
