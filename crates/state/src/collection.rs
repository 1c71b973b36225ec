//! Local edits applied to a mirrored collection after a confirmed mutation.
//!
//! Every helper returns a new `Vec` so the caller can publish the result as a
//! single state transition.

use dayliz_core::{DefaultFlag, Entity, Ordered};

/// Append a server-confirmed entity.
///
/// An element with the same ID is replaced instead, so a create that the
/// server answered with an existing row never produces duplicates.
#[must_use]
pub fn append<E: Entity>(items: &[E], item: E) -> Vec<E> {
    let mut next = items.to_vec();
    if let Some(slot) = next.iter_mut().find(|existing| existing.id() == item.id()) {
        *slot = item;
    } else {
        next.push(item);
    }
    next
}

/// Replace the element with the same ID, keeping its position.
///
/// Returns `None` when no element matches.
#[must_use]
pub fn replace<E: Entity>(items: &[E], item: E) -> Option<Vec<E>> {
    let position = items.iter().position(|existing| existing.id() == item.id())?;
    let mut next = items.to_vec();
    if let Some(slot) = next.get_mut(position) {
        *slot = item;
    }
    Some(next)
}

/// Remove the element with `id`. Returns `None` when no element matches.
#[must_use]
pub fn remove<E: Entity>(items: &[E], id: E::Id) -> Option<Vec<E>> {
    if !items.iter().any(|item| item.id() == id) {
        return None;
    }
    Some(items.iter().filter(|item| item.id() != id).cloned().collect())
}

/// Reassign the default flag on every element: only `id` stays default.
#[must_use]
pub fn assign_default<E: DefaultFlag>(items: &[E], id: E::Id) -> Vec<E> {
    items
        .iter()
        .cloned()
        .map(|item| {
            let is_default = item.id() == id;
            item.with_default(is_default)
        })
        .collect()
}

/// If `item` is default, clear the flag on every other element.
#[must_use]
pub fn enforce_single_default<E: DefaultFlag>(items: Vec<E>, item: &E) -> Vec<E> {
    if item.is_default() {
        assign_default(&items, item.id())
    } else {
        items
    }
}

/// Stable sort by display order; ties keep insertion order.
pub fn sort_by_display_order<T: Ordered>(items: &mut [T]) {
    items.sort_by_key(Ordered::display_order);
}

#[cfg(test)]
pub(crate) mod fixtures {
    use dayliz_core::{DefaultFlag, Entity};

    /// Minimal default-flagged entity for list-edit tests.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct Row {
        pub id: u32,
        pub name: &'static str,
        pub is_default: bool,
    }

    pub const fn row(id: u32, name: &'static str, is_default: bool) -> Row {
        Row {
            id,
            name,
            is_default,
        }
    }

    impl Entity for Row {
        type Id = u32;
        type Draft = &'static str;

        fn id(&self) -> u32 {
            self.id
        }
    }

    impl DefaultFlag for Row {
        fn is_default(&self) -> bool {
            self.is_default
        }

        fn with_default(self, is_default: bool) -> Self {
            Self { is_default, ..self }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::{Row, row};
    use super::*;

    fn defaults(items: &[Row]) -> Vec<u32> {
        items.iter().filter(|r| r.is_default).map(|r| r.id).collect()
    }

    #[test]
    fn test_append_adds_new_and_replaces_existing() {
        let items = vec![row(1, "a", false)];
        let grown = append(&items, row(2, "b", false));
        assert_eq!(grown.len(), 2);

        let same = append(&grown, row(2, "b2", false));
        assert_eq!(same.len(), 2);
        assert_eq!(same.get(1).map(|r| r.name), Some("b2"));
    }

    #[test]
    fn test_replace_keeps_position() {
        let items = vec![row(1, "a", false), row(2, "b", false), row(3, "c", false)];
        let next = replace(&items, row(2, "B", false)).unwrap_or_default();
        let names: Vec<_> = next.iter().map(|r| r.name).collect();
        assert_eq!(names, ["a", "B", "c"]);
        assert!(replace(&items, row(9, "x", false)).is_none());
    }

    #[test]
    fn test_remove_only_matching() {
        let items = vec![row(1, "a", false), row(2, "b", false)];
        let next = remove(&items, 1).unwrap_or_default();
        assert_eq!(next, vec![row(2, "b", false)]);
        assert!(remove(&items, 7).is_none());
    }

    #[test]
    fn test_assign_default_is_total() {
        let items = vec![row(1, "a", true), row(2, "b", true), row(3, "c", false)];
        let next = assign_default(&items, 3);
        assert_eq!(defaults(&next), vec![3]);
    }

    #[test]
    fn test_assign_default_unknown_id_clears_all() {
        let items = vec![row(1, "a", true)];
        assert!(defaults(&assign_default(&items, 5)).is_empty());
    }

    #[test]
    fn test_enforce_single_default_only_when_default() {
        let items = vec![row(1, "a", true), row(2, "b", false)];
        let untouched = enforce_single_default(items.clone(), &row(2, "b", false));
        assert_eq!(defaults(&untouched), vec![1]);

        let moved = enforce_single_default(items, &row(2, "b", true));
        assert_eq!(defaults(&moved), vec![2]);
    }
}
