//! Identity traits shared by collection resources.

use std::fmt::{Debug, Display};
use std::hash::Hash;

/// A row that can live in a mirrored collection.
///
/// Collections are keyed by [`Entity::id`]; two elements with the same ID are
/// the same entity regardless of their other fields. `Draft` is the payload
/// used to create a new row: it never carries an ID because IDs are always
/// assigned by the server.
pub trait Entity: Clone + Debug + Send + Sync + 'static {
    /// Type-safe identifier.
    type Id: Copy + Eq + Hash + Debug + Display + Send + Sync + 'static;
    /// Creation payload.
    type Draft: Debug + Send + Sync + 'static;

    fn id(&self) -> Self::Id;
}

/// Entities where at most one element of a collection is the default.
pub trait DefaultFlag: Entity {
    fn is_default(&self) -> bool;

    /// Return a copy with the default flag set to `is_default`.
    #[must_use]
    fn with_default(self, is_default: bool) -> Self;
}

/// Entities with an explicit sort key overriding insertion order.
pub trait Ordered {
    fn display_order(&self) -> i32;
}
