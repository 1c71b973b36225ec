//! Orders (`orders` table with embedded `order_items`).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::entity::Entity;
use crate::models::{Address, CartItem};
use crate::types::{
    OrderId, OrderStatus, PaymentMethodKind, PaymentStatus, ProductId, RefundStatus, UserId,
};

/// Smallest order total accepted at checkout, in rupees.
pub const MINIMUM_ORDER_RUPEES: i64 = 99;

/// Reason recorded on customer-initiated cancellations.
pub const CUSTOMER_CANCELLATION_REASON: &str = "User requested";

/// A placed order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default)]
    pub payment_status: PaymentStatus,
    pub payment_method: PaymentMethodKind,
    /// Address snapshot taken at checkout; later edits to the saved address
    /// do not change where a placed order goes.
    pub delivery_address: String,
    pub address_lat: Option<f64>,
    pub address_lng: Option<f64>,
    #[serde(default, rename = "order_items")]
    pub items: Vec<OrderItem>,
    pub subtotal: Decimal,
    #[serde(default)]
    pub delivery_fee: Decimal,
    pub total_price: Decimal,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub cancelled_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub cancellation_reason: Option<String>,
    #[serde(default)]
    pub refund_status: Option<RefundStatus>,
    #[serde(default)]
    pub refund_initiated_at: Option<DateTime<Utc>>,
}

impl Order {
    #[must_use]
    pub const fn is_cancellable(&self) -> bool {
        self.status.is_cancellable()
    }

    /// Columns written when the customer cancels at `at`.
    ///
    /// A paid order also gets a pending refund.
    #[must_use]
    pub fn cancellation(&self, at: DateTime<Utc>) -> Cancellation {
        let paid = self.payment_status == PaymentStatus::Paid;
        Cancellation {
            status: OrderStatus::Cancelled,
            cancelled_at: at,
            cancellation_reason: CUSTOMER_CANCELLATION_REASON.to_string(),
            updated_at: at,
            refund_status: paid.then_some(RefundStatus::Pending),
            refund_initiated_at: paid.then_some(at),
        }
    }

    /// This order with `cancellation` applied.
    #[must_use]
    pub fn cancelled(self, cancellation: &Cancellation) -> Self {
        Self {
            status: cancellation.status,
            cancelled_at: Some(cancellation.cancelled_at),
            cancellation_reason: Some(cancellation.cancellation_reason.clone()),
            updated_at: Some(cancellation.updated_at),
            refund_status: cancellation.refund_status.or(self.refund_status),
            refund_initiated_at: cancellation.refund_initiated_at.or(self.refund_initiated_at),
            ..self
        }
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn unit_count(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }
}

/// Patch applied to an `orders` row when the customer cancels it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Cancellation {
    pub status: OrderStatus,
    pub cancelled_at: DateTime<Utc>,
    pub cancellation_reason: String,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refund_status: Option<RefundStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refund_initiated_at: Option<DateTime<Utc>>,
}

/// A line of a placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: u32,
    pub price: Decimal,
}

/// A line of an order being placed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrderItem {
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: u32,
    pub price: Decimal,
}

/// Payload for placing an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewOrder {
    pub payment_method: PaymentMethodKind,
    pub delivery_address: String,
    pub address_lat: Option<f64>,
    pub address_lng: Option<f64>,
    pub items: Vec<NewOrderItem>,
    pub subtotal: Decimal,
    pub delivery_fee: Decimal,
    pub total_price: Decimal,
}

impl NewOrder {
    /// Build an order from the current cart lines.
    ///
    /// Totals are computed from the cart's captured unit prices; the backend
    /// re-prices on insert and rejects the order if they disagree.
    #[must_use]
    pub fn from_cart(
        cart: &[CartItem],
        address: &Address,
        payment_method: PaymentMethodKind,
        delivery_fee: Decimal,
    ) -> Self {
        let items: Vec<NewOrderItem> = cart
            .iter()
            .map(|line| NewOrderItem {
                product_id: line.product_id,
                product_name: line.product_name.clone(),
                quantity: line.quantity,
                price: line.unit_price,
            })
            .collect();
        let subtotal = cart.iter().map(|line| line.line_total().amount).sum();

        Self {
            payment_method,
            delivery_address: address.formatted(),
            address_lat: address.latitude,
            address_lng: address.longitude,
            items,
            subtotal,
            delivery_fee,
            total_price: subtotal + delivery_fee,
        }
    }

    /// Checkout rules applied before an order is sent.
    ///
    /// # Errors
    ///
    /// Returns the message to show when the order cannot be placed.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.items.is_empty() {
            return Err("Your cart is empty");
        }
        if self.total_price <= Decimal::ZERO {
            return Err("Order amount must be greater than zero");
        }
        if self.total_price < Decimal::from(MINIMUM_ORDER_RUPEES) {
            return Err("Minimum order amount is ₹99");
        }
        if self.delivery_address.trim().is_empty() {
            return Err("Delivery address is required");
        }
        Ok(())
    }
}

impl Entity for Order {
    type Id = OrderId;
    type Draft = NewOrder;

    fn id(&self) -> OrderId {
        self.id
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::types::{AddressId, CartItemId};

    fn placed(payment_status: PaymentStatus) -> Order {
        Order {
            id: OrderId::generate(),
            user_id: UserId::generate(),
            status: OrderStatus::Processing,
            payment_status,
            payment_method: PaymentMethodKind::Upi,
            delivery_address: "12 MG Road, Tura".into(),
            address_lat: None,
            address_lng: None,
            items: Vec::new(),
            subtotal: Decimal::new(15000, 2),
            delivery_fee: Decimal::ZERO,
            total_price: Decimal::new(15000, 2),
            created_at: None,
            updated_at: None,
            delivered_at: None,
            cancelled_at: None,
            cancellation_reason: None,
            refund_status: None,
            refund_initiated_at: None,
        }
    }

    fn cart_line(name: &str, paise: i64, quantity: u32) -> CartItem {
        CartItem {
            id: CartItemId::generate(),
            user_id: UserId::generate(),
            product_id: ProductId::generate(),
            product_name: name.into(),
            unit_price: Decimal::new(paise, 2),
            quantity,
            image_url: None,
            added_at: None,
        }
    }

    #[test]
    fn test_from_cart_totals() {
        let address = Address {
            id: AddressId::generate(),
            user_id: UserId::generate(),
            label: "Home".into(),
            recipient_name: "Asha".into(),
            phone: "9800000000".into(),
            address_line1: "12 MG Road".into(),
            address_line2: None,
            landmark: None,
            city: "Tura".into(),
            state: "Meghalaya".into(),
            postal_code: "794001".into(),
            country: "India".into(),
            latitude: Some(25.51),
            longitude: Some(90.22),
            is_default: true,
            created_at: None,
        };
        let cart = [cart_line("Milk 1L", 6400, 2), cart_line("Bread", 4500, 1)];

        let order = NewOrder::from_cart(
            &cart,
            &address,
            PaymentMethodKind::Cod,
            Decimal::new(2500, 2),
        );

        assert_eq!(order.items.len(), 2);
        assert_eq!(order.subtotal, Decimal::new(17300, 2));
        assert_eq!(order.total_price, Decimal::new(19800, 2));
        assert_eq!(order.address_lat, Some(25.51));
        assert!(order.delivery_address.starts_with("12 MG Road, Tura"));
    }

    #[test]
    fn test_cancelling_paid_order_starts_refund() {
        let at = Utc.with_ymd_and_hms(2025, 3, 14, 9, 30, 0).unwrap();
        let order = placed(PaymentStatus::Paid);

        let cancellation = order.cancellation(at);
        let cancelled = order.cancelled(&cancellation);

        assert_eq!(cancelled.status, OrderStatus::Cancelled);
        assert_eq!(cancelled.cancelled_at, Some(at));
        assert_eq!(cancelled.cancellation_reason.as_deref(), Some("User requested"));
        assert_eq!(cancelled.refund_status, Some(RefundStatus::Pending));
        assert_eq!(cancelled.refund_initiated_at, Some(at));
    }

    #[test]
    fn test_cancelling_unpaid_order_has_no_refund() {
        let at = Utc.with_ymd_and_hms(2025, 3, 14, 9, 30, 0).unwrap();
        let cancellation = placed(PaymentStatus::Pending).cancellation(at);

        assert!(cancellation.refund_status.is_none());
        let patch = serde_json::to_value(&cancellation).unwrap();
        assert!(patch.get("refund_status").is_none());
        assert_eq!(patch["status"], "cancelled");
    }

    #[test]
    fn test_validate_checkout_rules() {
        let line = NewOrderItem {
            product_id: ProductId::generate(),
            product_name: "Atta 5kg".into(),
            quantity: 1,
            price: Decimal::new(26000, 2),
        };
        let order = NewOrder {
            payment_method: PaymentMethodKind::Cod,
            delivery_address: "12 MG Road, Tura".into(),
            address_lat: None,
            address_lng: None,
            items: vec![line],
            subtotal: Decimal::new(26000, 2),
            delivery_fee: Decimal::ZERO,
            total_price: Decimal::new(26000, 2),
        };
        assert_eq!(order.validate(), Ok(()));

        let small = NewOrder {
            total_price: Decimal::new(9850, 2),
            ..order.clone()
        };
        assert_eq!(small.validate(), Err("Minimum order amount is ₹99"));

        let empty = NewOrder {
            items: Vec::new(),
            ..order.clone()
        };
        assert_eq!(empty.validate(), Err("Your cart is empty"));

        let nowhere = NewOrder {
            delivery_address: "  ".into(),
            ..order
        };
        assert_eq!(nowhere.validate(), Err("Delivery address is required"));
    }
}
