//! Order history notifier.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::instrument;

use dayliz_core::{NewOrder, Order, OrderId, UserId};

use super::{CollectionNotifier, Outcome};
use crate::collection;
use crate::failure::Failure;
use crate::repository::OrderRepository;
use crate::state::ResourceState;

/// Message shown when the order has left the store or is already closed.
pub const NOT_CANCELLABLE_MESSAGE: &str = "This order can no longer be cancelled";

/// Mirrors the signed-in user's orders, newest last as returned by the server.
pub struct OrderNotifier {
    orders: CollectionNotifier<Order, dyn OrderRepository>,
}

impl OrderNotifier {
    #[must_use]
    pub fn new(repository: Arc<dyn OrderRepository>) -> Self {
        Self {
            orders: CollectionNotifier::new("orders", repository),
        }
    }

    #[must_use]
    pub fn state(&self) -> ResourceState<Vec<Order>> {
        self.orders.state()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ResourceState<Vec<Order>>> {
        self.orders.subscribe()
    }

    pub fn reset(&self) {
        self.orders.reset();
    }

    #[must_use]
    pub fn get(&self, id: OrderId) -> Option<Order> {
        self.orders.get(id)
    }

    /// Orders that have not reached a final state.
    #[must_use]
    pub fn active(&self) -> Vec<Order> {
        self.state()
            .data
            .into_iter()
            .filter(|order| !order.status.is_terminal())
            .collect()
    }

    pub async fn load(&self, user: &UserId) -> Outcome {
        self.orders.load(user).await
    }

    /// Place an order; the confirmed order is appended.
    ///
    /// Checkout rules (non-empty, minimum total, delivery address) are
    /// checked before anything is sent.
    #[instrument(skip_all, fields(lines = order.items.len(), total = %order.total_price))]
    pub async fn place(&self, user: &UserId, order: NewOrder) -> Outcome {
        if let Err(message) = order.validate() {
            return self
                .orders
                .inner()
                .reject("place", &Failure::Server(message.to_string()));
        }
        self.orders.create(user, order).await
    }

    /// Cancel an order that has not left the store yet.
    ///
    /// An order missing from the local list is left to the backend to judge.
    #[instrument(skip(self))]
    pub async fn cancel(&self, id: OrderId) -> Outcome {
        if let Some(order) = self.orders.get(id)
            && !order.is_cancellable()
        {
            return self.orders.inner().reject(
                "cancel",
                &Failure::Server(NOT_CANCELLABLE_MESSAGE.to_string()),
            );
        }

        self.orders
            .inner()
            .mutate(
                "cancel",
                self.orders.repository().cancel(id),
                |orders, cancelled: Order| Ok(collection::append(orders, cancelled)),
            )
            .await
    }
}
