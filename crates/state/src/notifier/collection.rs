//! Generic notifier for user-owned collections.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::instrument;

use dayliz_core::{Address, DefaultFlag, Entity, PaymentMethod, UserId};

use super::{Outcome, ResourceNotifier};
use crate::collection;
use crate::failure::Failure;
use crate::repository::{CollectionRepository, DefaultRepository};
use crate::state::ResourceState;

/// Saved delivery addresses.
pub type AddressNotifier =
    CollectionNotifier<Address, dyn DefaultRepository<Address, Scope = UserId>>;

/// Saved payment methods.
pub type PaymentMethodNotifier =
    CollectionNotifier<PaymentMethod, dyn DefaultRepository<PaymentMethod, Scope = UserId>>;

/// Post-processing applied to the collection after a create or update.
type Normalize<E> = fn(Vec<E>, &E) -> Vec<E>;

/// Mirrors a remote collection and patches it from mutation results.
///
/// Local data changes only after the repository confirms, so a rejected
/// write never needs rolling back.
pub struct CollectionNotifier<E, R: ?Sized> {
    state: ResourceNotifier<Vec<E>>,
    repository: Arc<R>,
    normalize: Normalize<E>,
}

impl<E, R> CollectionNotifier<E, R>
where
    E: Entity,
    R: CollectionRepository<E> + ?Sized,
{
    /// Create a notifier over `repository`.
    #[must_use]
    pub fn new(resource: &'static str, repository: Arc<R>) -> Self {
        Self {
            state: ResourceNotifier::new(resource),
            repository,
            normalize: |items, _| items,
        }
    }

    /// Current snapshot.
    #[must_use]
    pub fn state(&self) -> ResourceState<Vec<E>> {
        self.state.state()
    }

    /// Read-only subscription to state changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ResourceState<Vec<E>>> {
        self.state.subscribe()
    }

    /// Back to the initial empty state (e.g. on sign-out).
    pub fn reset(&self) {
        self.state.reset();
    }

    /// Look up an element by ID in the current snapshot.
    #[must_use]
    pub fn get(&self, id: E::Id) -> Option<E> {
        self.state
            .state()
            .data
            .into_iter()
            .find(|item| item.id() == id)
    }

    pub(crate) const fn inner(&self) -> &ResourceNotifier<Vec<E>> {
        &self.state
    }

    pub(crate) fn repository(&self) -> &R {
        &self.repository
    }

    /// Fetch the full collection.
    #[instrument(skip_all, fields(resource = self.state.resource()))]
    pub async fn load(&self, scope: &R::Scope) -> Outcome {
        self.state
            .load("load", self.repository.fetch_all(scope))
            .await
    }

    /// Create an entity and append the server's version of it.
    #[instrument(skip_all, fields(resource = self.state.resource()))]
    pub async fn create(&self, scope: &R::Scope, draft: E::Draft) -> Outcome {
        let normalize = self.normalize;
        self.state
            .mutate(
                "create",
                self.repository.create(scope, draft),
                move |items, created: E| {
                    let next = collection::append(items, created.clone());
                    Ok(normalize(next, &created))
                },
            )
            .await
    }

    /// Update an entity and replace the local copy in place.
    #[instrument(skip_all, fields(resource = self.state.resource(), id = %item.id()))]
    pub async fn update(&self, item: &E) -> Outcome {
        let normalize = self.normalize;
        self.state
            .mutate(
                "update",
                self.repository.update(item),
                move |items, updated: E| {
                    // The server confirmed the row exists; a stale local list
                    // gains it rather than dropping the update.
                    let next = collection::replace(items, updated.clone())
                        .unwrap_or_else(|| collection::append(items, updated.clone()));
                    Ok(normalize(next, &updated))
                },
            )
            .await
    }

    /// Delete an entity; only a confirmed delete removes it locally.
    #[instrument(skip_all, fields(resource = self.state.resource(), id = %id))]
    pub async fn delete(&self, id: E::Id) -> Outcome {
        self.state
            .mutate(
                "delete",
                self.repository.delete(id),
                move |items, deleted| {
                    if !deleted {
                        return Err(Failure::NotFound(String::new()));
                    }
                    Ok(collection::remove(items, id).unwrap_or_else(|| items.clone()))
                },
            )
            .await
    }
}

impl<E, R> CollectionNotifier<E, R>
where
    E: DefaultFlag,
    R: DefaultRepository<E> + ?Sized,
{
    /// Create a notifier that keeps at most one element flagged default.
    ///
    /// Creating or updating an element that is default clears the flag on
    /// every other element in the same transition.
    #[must_use]
    pub fn with_single_default(resource: &'static str, repository: Arc<R>) -> Self {
        Self {
            state: ResourceNotifier::new(resource),
            repository,
            normalize: collection::enforce_single_default,
        }
    }

    /// The element currently flagged default.
    #[must_use]
    pub fn default_item(&self) -> Option<E> {
        self.state
            .state()
            .data
            .into_iter()
            .find(DefaultFlag::is_default)
    }

    /// Make `id` the default and reassign the flag on every element.
    ///
    /// `id` must be in the local list; otherwise the call fails with
    /// `NotFound` without reaching the repository, since flags could not be
    /// reassigned locally afterwards.
    #[instrument(skip_all, fields(resource = self.state.resource(), id = %id))]
    pub async fn set_default(&self, scope: &R::Scope, id: E::Id) -> Outcome {
        let call = async move {
            if self.get(id).is_none() {
                return Err(Failure::NotFound(String::new()));
            }
            self.repository.set_default(scope, id).await
        };
        self.state
            .mutate("set_default", call, move |items, confirmed| {
                if !confirmed || !items.iter().any(|item| item.id() == id) {
                    return Err(Failure::NotFound(String::new()));
                }
                Ok(collection::assign_default(items, id))
            })
            .await
    }
}
