//! Dayliz client state layer.
//!
//! Observable resource notifiers over an async repository boundary, plus the
//! Supabase implementation of that boundary.
//!
//! # Layers
//!
//! - [`repository`] - async traits the notifiers depend on
//! - [`notifier`] - one notifier per remote resource, each owning a
//!   [`ResourceState`] behind a `watch` channel
//! - [`supabase`] - `reqwest` client implementing every repository
//! - [`store`] - the per-session bundle of notifiers

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod collection;
pub mod config;
pub mod failure;
pub mod notifier;
pub mod repository;
pub mod state;
pub mod store;
pub mod supabase;
pub mod telemetry;

pub use config::{ConfigError, DaylizConfig};
pub use failure::Failure;
pub use notifier::Outcome;
pub use state::{ResourceState, StateUpdate};
pub use store::{DaylizStore, Repositories};
pub use supabase::{SupabaseClient, SupabaseError};
