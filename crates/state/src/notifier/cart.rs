//! Cart notifier.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::instrument;

use dayliz_core::{CartItem, CartItemId, CurrencyCode, NewCartItem, Price, ProductId, UserId};

use super::{CollectionNotifier, Outcome};
use crate::collection;
use crate::failure::Failure;
use crate::repository::{CartRepository, ProductRepository};
use crate::state::ResourceState;

pub const NOT_ENOUGH_STOCK_MESSAGE: &str = "Not enough stock available";
pub const QUANTITY_TOO_LARGE_MESSAGE: &str = "Quantity too large";

/// Mirrors the signed-in user's cart.
///
/// Adding a product that is already in the cart bumps the existing line's
/// quantity instead of creating a second line. Prices and stock come from
/// the product row, read fresh for every add or quantity change.
pub struct CartNotifier {
    lines: CollectionNotifier<CartItem, dyn CartRepository>,
    products: Arc<dyn ProductRepository>,
}

impl CartNotifier {
    #[must_use]
    pub fn new(repository: Arc<dyn CartRepository>, products: Arc<dyn ProductRepository>) -> Self {
        Self {
            lines: CollectionNotifier::new("cart", repository),
            products,
        }
    }

    #[must_use]
    pub fn state(&self) -> ResourceState<Vec<CartItem>> {
        self.lines.state()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ResourceState<Vec<CartItem>>> {
        self.lines.subscribe()
    }

    pub fn reset(&self) {
        self.lines.reset();
    }

    /// Sum of line totals.
    #[must_use]
    pub fn subtotal(&self) -> Price {
        self.state()
            .data
            .iter()
            .map(CartItem::line_total)
            .fold(Price::zero(CurrencyCode::INR), |acc, line| acc + line)
    }

    /// Total number of units in the cart (the badge count).
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.state()
            .data
            .iter()
            .map(|line| u64::from(line.quantity))
            .sum()
    }

    pub async fn load(&self, user: &UserId) -> Outcome {
        self.lines.load(user).await
    }

    /// Add `quantity` units of a product, merging with an existing line.
    ///
    /// Rejected when the merged quantity exceeds the product's stock.
    #[instrument(skip(self, user))]
    pub async fn add_item(&self, user: &UserId, product_id: ProductId, quantity: u32) -> Outcome {
        if quantity == 0 {
            return self.lines.inner().reject(
                "add_item",
                &Failure::Server("Quantity must be at least 1".to_string()),
            );
        }

        let lines = &self.lines;
        let products = &self.products;
        let call = async move {
            let product = products.product(product_id).await?;
            let existing = lines
                .state()
                .data
                .into_iter()
                .find(|line| line.product_id == product_id);

            let wanted = match &existing {
                Some(line) => line
                    .quantity
                    .checked_add(quantity)
                    .ok_or_else(|| Failure::Server(QUANTITY_TOO_LARGE_MESSAGE.to_string()))?,
                None => quantity,
            };
            if !product.has_stock(wanted) {
                return Err(Failure::Server(NOT_ENOUGH_STOCK_MESSAGE.to_string()));
            }

            match existing {
                Some(line) => {
                    let merged = CartItem {
                        quantity: wanted,
                        unit_price: product.effective_price(),
                        ..line
                    };
                    lines.repository().update(&merged).await
                }
                None => {
                    lines
                        .repository()
                        .create(user, NewCartItem::for_product(&product, quantity))
                        .await
                }
            }
        };

        self.lines
            .inner()
            .mutate("add_item", call, |lines, line| Ok(collection::append(lines, line)))
            .await
    }

    /// Set a line's quantity; zero removes the line.
    #[instrument(skip(self))]
    pub async fn update_quantity(&self, id: CartItemId, quantity: u32) -> Outcome {
        if quantity == 0 {
            return self.remove(id).await;
        }

        let lines = &self.lines;
        let products = &self.products;
        let call = async move {
            let line = lines.get(id).ok_or_else(|| Failure::NotFound(String::new()))?;
            let product = products.product(line.product_id).await?;
            if !product.has_stock(quantity) {
                return Err(Failure::Server(NOT_ENOUGH_STOCK_MESSAGE.to_string()));
            }
            lines
                .repository()
                .update(&CartItem { quantity, ..line })
                .await
        };

        self.lines
            .inner()
            .mutate("update_quantity", call, |lines, line| {
                Ok(collection::append(lines, line))
            })
            .await
    }

    pub async fn remove(&self, id: CartItemId) -> Outcome {
        self.lines.delete(id).await
    }

    /// Empty the cart (after checkout or on request).
    #[instrument(skip(self))]
    pub async fn clear(&self, user: &UserId) -> Outcome {
        self.lines
            .inner()
            .mutate(
                "clear",
                self.lines.repository().clear(user),
                |_, cleared| {
                    if cleared {
                        Ok(Vec::new())
                    } else {
                        Err(Failure::Server("Could not clear the cart".to_string()))
                    }
                },
            )
            .await
    }
}
