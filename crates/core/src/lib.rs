//! Spindle Core - Shared domain types.
//!
//! This crate provides common types used across the Spindle components:
//! - `storefront` - Cart reconciliation library and shop API client
//! - `cli` - Command-line cart session driver
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients. This keeps
//! it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, prices, emails, and roles

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
