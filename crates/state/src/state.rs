//! Immutable resource state snapshots.

use serde::Serialize;

/// Snapshot of a mirrored remote resource.
///
/// `D` is the resource payload: `Vec<E>` for collections, `Option<E>` for
/// singletons. Snapshots are replaced, never mutated; build the next one with
/// [`ResourceState::copy_with`].
///
/// Invariant: `error_message.is_some()` implies `!is_loading`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceState<D> {
    pub is_loading: bool,
    pub data: D,
    pub error_message: Option<String>,
}

impl<D: Default> Default for ResourceState<D> {
    fn default() -> Self {
        Self {
            is_loading: false,
            data: D::default(),
            error_message: None,
        }
    }
}

/// Selective overrides for [`ResourceState::copy_with`].
///
/// `None` means "leave unchanged". Because `error_message: None` cannot also
/// mean "clear the error", clearing is requested separately with
/// `clear_error`. A successful transition that forgets `clear_error` keeps
/// showing the stale error next to fresh data.
#[derive(Debug, Clone)]
pub struct StateUpdate<D> {
    pub is_loading: Option<bool>,
    pub data: Option<D>,
    pub error_message: Option<String>,
    pub clear_error: bool,
}

impl<D> Default for StateUpdate<D> {
    fn default() -> Self {
        Self {
            is_loading: None,
            data: None,
            error_message: None,
            clear_error: false,
        }
    }
}

impl<D> StateUpdate<D> {
    /// Enter the loading state, dropping any stale error.
    #[must_use]
    pub fn loading() -> Self {
        Self {
            is_loading: Some(true),
            clear_error: true,
            ..Self::default()
        }
    }

    /// Settle successfully with new data.
    #[must_use]
    pub fn loaded(data: D) -> Self {
        Self {
            is_loading: Some(false),
            data: Some(data),
            clear_error: true,
            ..Self::default()
        }
    }

    /// Settle successfully without touching data.
    #[must_use]
    pub fn settled() -> Self {
        Self {
            is_loading: Some(false),
            clear_error: true,
            ..Self::default()
        }
    }

    /// Settle with an error; data is retained.
    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            is_loading: Some(false),
            error_message: Some(message.into()),
            ..Self::default()
        }
    }
}

impl<D: Clone> ResourceState<D> {
    /// A fresh state holding `data`.
    #[must_use]
    pub const fn new(data: D) -> Self {
        Self {
            is_loading: false,
            data,
            error_message: None,
        }
    }

    /// Produce the next snapshot.
    ///
    /// `clear_error` wins over a concurrently supplied `error_message` only
    /// when no new message is given; a new message always replaces the old
    /// one. Entering a loading state always clears the error so the
    /// loading/error invariant holds.
    #[must_use]
    pub fn copy_with(&self, update: StateUpdate<D>) -> Self {
        let is_loading = update.is_loading.unwrap_or(self.is_loading);
        let error_message = if is_loading {
            None
        } else if update.error_message.is_some() {
            update.error_message
        } else if update.clear_error {
            None
        } else {
            self.error_message.clone()
        };

        Self {
            is_loading,
            data: update.data.unwrap_or_else(|| self.data.clone()),
            error_message,
        }
    }

    /// Whether the last operation left an error to show.
    #[must_use]
    pub const fn has_error(&self) -> bool {
        self.error_message.is_some()
    }
}
