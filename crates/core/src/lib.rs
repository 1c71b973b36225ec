//! Dayliz Core - Shared domain types.
//!
//! This crate provides the types used across the Dayliz client workspace:
//! - `state` - Observable resource notifiers and the Supabase repositories
//! - `cli` - Command-line front end driving the notifiers
//! - `integration-tests` - Notifier behaviour against stub repositories
//!
//! # Architecture
//!
//! The core crate contains only types and traits - no I/O, no HTTP clients,
//! no async runtime. Row shapes mirror the Supabase tables so the same types
//! deserialize straight from PostgREST responses.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, email, price and status enums
//! - [`models`] - Entities mirrored from the backend (addresses, cart, orders, ...)
//! - [`entity`] - Identity and default-flag traits shared by collection resources

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod entity;
pub mod models;
pub mod types;

pub use entity::{DefaultFlag, Entity, Ordered};
pub use models::*;
pub use types::*;
