//! Notifiers: the bridge between caller actions and repositories.
//!
//! A notifier owns one [`ResourceState`] behind a `tokio::sync::watch`
//! channel. Callers trigger operations and observe state through
//! [`ResourceNotifier::subscribe`]; only the notifier writes.
//!
//! # Error policy
//!
//! Failures never escape a notifier as `Err`. They are mapped with
//! [`Failure::user_message`] into `error_message` and the operation returns
//! [`Outcome::Failed`]. A panic inside a repository future is caught at this
//! boundary and treated as [`Failure::Unknown`], so a caller sees the same
//! thing whether the repository returned an error or blew up.
//!
//! # Concurrency
//!
//! Each notifier serialises its own operations. An operation issued while
//! another one is still in flight is rejected with [`Outcome::Busy`] and does
//! not touch state. Independent notifiers run concurrently.

mod auth;
mod cart;
mod categories;
mod collection;
mod orders;
mod products;
mod profile;

pub use auth::{AuthNotifier, AuthSession};
pub use cart::{CartNotifier, NOT_ENOUGH_STOCK_MESSAGE, QUANTITY_TOO_LARGE_MESSAGE};
pub use categories::CategoryNotifier;
pub use collection::{AddressNotifier, CollectionNotifier, PaymentMethodNotifier};
pub use orders::{NOT_CANCELLABLE_MESSAGE, OrderNotifier};
pub use products::ProductNotifier;
pub use profile::ProfileNotifier;

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use tokio::sync::{Mutex, MutexGuard, watch};
use tracing::{debug, info};

use crate::failure::{self, Failure};
use crate::state::{ResourceState, StateUpdate};

/// How a notifier operation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The repository confirmed and state was updated.
    Applied,
    /// A failure was recorded in `error_message`.
    Failed,
    /// Another operation on the same notifier was still running.
    Busy,
    /// The user abandoned the flow; nothing is shown.
    Cancelled,
}

impl Outcome {
    #[must_use]
    pub const fn is_applied(self) -> bool {
        matches!(self, Self::Applied)
    }
}

/// Generic state owner used by every resource notifier.
pub struct ResourceNotifier<D> {
    resource: &'static str,
    tx: watch::Sender<ResourceState<D>>,
    in_flight: Mutex<()>,
}

impl<D> ResourceNotifier<D>
where
    D: Clone + Default + Send + Sync + 'static,
{
    /// Create a notifier in the initial (idle, empty) state.
    #[must_use]
    pub fn new(resource: &'static str) -> Self {
        let (tx, _rx) = watch::channel(ResourceState::default());
        Self {
            resource,
            tx,
            in_flight: Mutex::new(()),
        }
    }

    /// Drop all data and errors, back to the initial state.
    pub fn reset(&self) {
        self.tx.send_replace(ResourceState::default());
        debug!(resource = self.resource, "Resource reset");
    }
}

impl<D> ResourceNotifier<D>
where
    D: Clone + Send + Sync + 'static,
{
    /// Resource name used in logs and breadcrumbs.
    #[must_use]
    pub const fn resource(&self) -> &'static str {
        self.resource
    }

    /// Current snapshot.
    #[must_use]
    pub fn state(&self) -> ResourceState<D> {
        self.tx.borrow().clone()
    }

    /// Read-only subscription to state changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ResourceState<D>> {
        self.tx.subscribe()
    }

    /// Whether an operation is currently in flight.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.in_flight.try_lock().is_err()
    }

    /// Replace the data wholesale after a fetch.
    ///
    /// Sets `is_loading` and clears any stale error first; on failure the
    /// previous data is kept.
    pub async fn load<F>(&self, operation: &'static str, fetch: F) -> Outcome
    where
        F: Future<Output = failure::Result<D>> + Send,
    {
        let Some(_guard) = self.begin(operation) else {
            return Outcome::Busy;
        };

        self.apply(StateUpdate::loading());
        match guarded(fetch).await {
            Ok(data) => {
                self.apply(StateUpdate::loaded(data));
                debug!(resource = self.resource, operation, "Resource loaded");
                Outcome::Applied
            }
            Err(failure) => self.settle_failure(operation, &failure),
        }
    }

    /// Run a mutation and patch local data from its result.
    ///
    /// `patch` receives the current data and the repository's answer and
    /// returns the next data, or a failure when the answer cannot be applied
    /// (e.g. a delete that matched nothing). The new data is published as one
    /// transition.
    pub async fn mutate<T, F, P>(&self, operation: &'static str, call: F, patch: P) -> Outcome
    where
        F: Future<Output = failure::Result<T>> + Send,
        P: FnOnce(&D, T) -> failure::Result<D> + Send,
    {
        let Some(_guard) = self.begin(operation) else {
            return Outcome::Busy;
        };

        let result = guarded(call).await.and_then(|value| {
            let current = self.tx.borrow().data.clone();
            patch(&current, value)
        });

        match result {
            Ok(data) => {
                self.apply(StateUpdate::loaded(data));
                failure::add_breadcrumb(self.resource, operation);
                info!(resource = self.resource, operation, "Resource updated");
                Outcome::Applied
            }
            Err(failure) => self.settle_failure(operation, &failure),
        }
    }

    /// Record a failure detected before any repository call was made.
    ///
    /// Holds the in-flight guard while writing, like any other operation.
    pub fn reject(&self, operation: &'static str, failure: &Failure) -> Outcome {
        let Some(_guard) = self.begin(operation) else {
            return Outcome::Busy;
        };
        self.settle_failure(operation, failure)
    }

    fn begin(&self, operation: &'static str) -> Option<MutexGuard<'_, ()>> {
        let guard = self.in_flight.try_lock().ok();
        if guard.is_none() {
            debug!(
                resource = self.resource,
                operation, "Rejected operation: another one is in flight"
            );
        }
        guard
    }

    fn apply(&self, update: StateUpdate<D>) {
        self.tx.send_modify(|state| *state = state.copy_with(update));
    }

    fn settle_failure(&self, operation: &'static str, failure: &Failure) -> Outcome {
        failure::report(self.resource, operation, failure);
        if failure.is_cancellation() {
            self.apply(StateUpdate::settled());
            Outcome::Cancelled
        } else {
            self.apply(StateUpdate::failed(failure.user_message()));
            Outcome::Failed
        }
    }
}

/// Await a repository future, converting a panic into [`Failure::Unknown`].
async fn guarded<T, F>(call: F) -> failure::Result<T>
where
    F: Future<Output = failure::Result<T>> + Send,
{
    match AssertUnwindSafe(call).catch_unwind().await {
        Ok(result) => result,
        Err(payload) => Err(Failure::Unknown(panic_message(payload.as_ref()))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "repository call panicked".to_string())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tokio::sync::oneshot;

    use super::*;
    use crate::failure::UNKNOWN_MESSAGE;

    #[tokio::test]
    async fn test_load_success_sets_data() {
        let notifier = ResourceNotifier::<Vec<u32>>::new("numbers");
        let outcome = notifier.load("load", async { Ok(vec![1, 2]) }).await;

        assert_eq!(outcome, Outcome::Applied);
        let state = notifier.state();
        assert_eq!(state.data, vec![1, 2]);
        assert!(!state.is_loading);
        assert!(state.error_message.is_none());
    }

    #[tokio::test]
    async fn test_load_failure_keeps_data() {
        let notifier = ResourceNotifier::<Vec<u32>>::new("numbers");
        let _ = notifier.load("load", async { Ok(vec![7]) }).await;
        let outcome = notifier
            .load("load", async { Err(Failure::Network("timeout".into())) })
            .await;

        assert_eq!(outcome, Outcome::Failed);
        let state = notifier.state();
        assert_eq!(state.data, vec![7]);
        assert!(!state.is_loading);
        assert_eq!(
            state.error_message.as_deref(),
            Some(crate::failure::NETWORK_MESSAGE)
        );
    }

    #[tokio::test]
    async fn test_panic_maps_to_unknown() {
        let notifier = ResourceNotifier::<Vec<u32>>::new("numbers");
        let outcome = notifier
            .load("load", async {
                let decoded: Option<Vec<u32>> = None;
                Ok(decoded.expect("decoder exploded"))
            })
            .await;

        assert_eq!(outcome, Outcome::Failed);
        assert_eq!(notifier.state().error_message.as_deref(), Some(UNKNOWN_MESSAGE));
        assert!(!notifier.is_busy());
    }

    #[tokio::test]
    async fn test_mutate_patch_failure_leaves_data() {
        let notifier = ResourceNotifier::<Vec<u32>>::new("numbers");
        let _ = notifier.load("load", async { Ok(vec![1]) }).await;
        let outcome = notifier
            .mutate("delete", async { Ok(false) }, |_, _| {
                Err(Failure::NotFound(String::new()))
            })
            .await;

        assert_eq!(outcome, Outcome::Failed);
        assert_eq!(notifier.state().data, vec![1]);
        assert!(notifier.state().has_error());
    }

    #[tokio::test]
    async fn test_concurrent_operation_is_rejected() {
        let notifier = Arc::new(ResourceNotifier::<Vec<u32>>::new("numbers"));
        let (release_tx, release_rx) = oneshot::channel::<()>();

        let slow = {
            let notifier = Arc::clone(&notifier);
            tokio::spawn(async move {
                notifier
                    .load("load", async move {
                        let _ = release_rx.await;
                        Ok(vec![1])
                    })
                    .await
            })
        };

        while !notifier.is_busy() {
            tokio::task::yield_now().await;
        }
        let second = notifier.load("load", async { Ok(vec![2]) }).await;
        assert_eq!(second, Outcome::Busy);

        let _ = release_tx.send(());
        assert_eq!(slow.await.ok(), Some(Outcome::Applied));
        assert_eq!(notifier.state().data, vec![1]);
    }

    #[tokio::test]
    async fn test_reject_while_busy_leaves_state() {
        let notifier = Arc::new(ResourceNotifier::<Vec<u32>>::new("numbers"));
        let (release_tx, release_rx) = oneshot::channel::<()>();

        let slow = {
            let notifier = Arc::clone(&notifier);
            tokio::spawn(async move {
                notifier
                    .load("load", async move {
                        let _ = release_rx.await;
                        Ok(vec![3])
                    })
                    .await
            })
        };
        while !notifier.is_busy() {
            tokio::task::yield_now().await;
        }

        let rejected = notifier.reject("add", &Failure::Server("Quantity must be at least 1".into()));
        assert_eq!(rejected, Outcome::Busy);
        assert!(notifier.state().is_loading);
        assert!(notifier.state().error_message.is_none());

        let _ = release_tx.send(());
        assert_eq!(slow.await.ok(), Some(Outcome::Applied));

        let idle = notifier.reject("add", &Failure::Server("Quantity must be at least 1".into()));
        assert_eq!(idle, Outcome::Failed);
        assert_eq!(notifier.state().data, vec![3]);
        assert!(!notifier.is_busy());
    }

    #[tokio::test]
    async fn test_subscribers_see_each_transition() {
        let notifier = ResourceNotifier::<Vec<u32>>::new("numbers");
        let mut rx = notifier.subscribe();
        let _ = notifier.load("load", async { Ok(vec![4]) }).await;

        assert!(rx.has_changed().unwrap_or(false));
        assert_eq!(rx.borrow_and_update().data, vec![4]);

        notifier.reset();
        assert!(rx.borrow_and_update().data.is_empty());
    }
}
