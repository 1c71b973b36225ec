//! Catalogue products (`products` table).

use std::convert::Infallible;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::entity::Entity;
use crate::types::{CategoryId, ProductId, SubcategoryId};

/// A product as listed in the catalogue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: Option<String>,
    /// List price in rupees.
    pub price: Decimal,
    /// Discounted price; charged instead of `price` when present.
    pub sale_price: Option<Decimal>,
    pub category_id: CategoryId,
    pub subcategory_id: Option<SubcategoryId>,
    pub image_url: Option<String>,
    /// Units on hand.
    #[serde(default)]
    pub stock: u32,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default = "active")]
    pub is_active: bool,
    pub created_at: Option<DateTime<Utc>>,
}

const fn active() -> bool {
    true
}

impl Product {
    /// The unit price a customer pays.
    #[must_use]
    pub fn effective_price(&self) -> Decimal {
        self.sale_price.unwrap_or(self.price)
    }

    #[must_use]
    pub fn is_on_sale(&self) -> bool {
        self.sale_price.is_some_and(|sale| sale < self.price)
    }

    /// Whether `quantity` units can be sold right now.
    #[must_use]
    pub const fn has_stock(&self, quantity: u32) -> bool {
        self.is_active && quantity <= self.stock
    }
}

// Products are read-only from the client.
impl Entity for Product {
    type Id = ProductId;
    type Draft = Infallible;

    fn id(&self) -> ProductId {
        self.id
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn butter() -> Product {
        Product {
            id: ProductId::generate(),
            name: "Amul Butter 500g".into(),
            description: None,
            price: Decimal::new(27500, 2),
            sale_price: None,
            category_id: CategoryId::generate(),
            subcategory_id: None,
            image_url: None,
            stock: 4,
            is_featured: false,
            is_active: true,
            created_at: None,
        }
    }

    #[test]
    fn test_sale_price_wins() {
        let mut product = butter();
        assert_eq!(product.effective_price(), Decimal::new(27500, 2));
        assert!(!product.is_on_sale());

        product.sale_price = Some(Decimal::new(26000, 2));
        assert_eq!(product.effective_price(), Decimal::new(26000, 2));
        assert!(product.is_on_sale());
    }

    #[test]
    fn test_stock_limits() {
        let mut product = butter();
        assert!(product.has_stock(4));
        assert!(!product.has_stock(5));

        product.is_active = false;
        assert!(!product.has_stock(1));
    }

    #[test]
    fn test_row_defaults() {
        let raw = format!(
            r#"{{"id":"{}","name":"Curd","description":null,"price":"35.00",
                "sale_price":null,"category_id":"{}","subcategory_id":null,
                "image_url":null,"created_at":null}}"#,
            ProductId::generate(),
            CategoryId::generate()
        );
        let product: Product = serde_json::from_str(&raw).unwrap();
        assert_eq!(product.stock, 0);
        assert!(product.is_active);
        assert!(!product.has_stock(1));
    }
}
