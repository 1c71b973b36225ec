//! Cart lines (`cart_items` table).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::entity::Entity;
use crate::models::Product;
use crate::types::{CartItemId, CurrencyCode, Price, ProductId, UserId};

/// One product line in the user's cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: CartItemId,
    pub user_id: UserId,
    pub product_id: ProductId,
    pub product_name: String,
    /// Unit price at the time the product was added.
    pub unit_price: Decimal,
    pub quantity: u32,
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub added_at: Option<DateTime<Utc>>,
}

impl CartItem {
    /// Unit price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Price {
        Price::new(self.unit_price, CurrencyCode::INR) * self.quantity
    }
}

/// Payload for adding a product to the cart.
///
/// Built from the catalogue row with [`NewCartItem::for_product`] so the
/// captured price is the one the store charges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCartItem {
    pub product_id: ProductId,
    pub product_name: String,
    pub unit_price: Decimal,
    pub quantity: u32,
    pub image_url: Option<String>,
}

impl NewCartItem {
    /// `quantity` units of `product` at its current effective price.
    #[must_use]
    pub fn for_product(product: &Product, quantity: u32) -> Self {
        Self {
            product_id: product.id,
            product_name: product.name.clone(),
            unit_price: product.effective_price(),
            quantity,
            image_url: product.image_url.clone(),
        }
    }
}

impl Entity for CartItem {
    type Id = CartItemId;
    type Draft = NewCartItem;

    fn id(&self) -> CartItemId {
        self.id
    }
}
