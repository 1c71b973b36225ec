//! Status enums for orders and payments.
//!
//! Values match the text columns used by the Dayliz Supabase tables.

use serde::{Deserialize, Serialize};

/// Order lifecycle status.
///
/// New orders start as `processing`. The other pre-dispatch states are
/// written by the store back office.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Processing,
    Pending,
    Confirmed,
    Packed,
    Shipped,
    OutForDelivery,
    Delivered,
    Cancelled,
    Refunded,
}

impl OrderStatus {
    /// States from which the customer can no longer cancel: the order has
    /// left the store or is already closed.
    pub const NOT_CANCELLABLE: [Self; 5] = [
        Self::Shipped,
        Self::OutForDelivery,
        Self::Delivered,
        Self::Cancelled,
        Self::Refunded,
    ];

    /// Whether the customer may still cancel the order.
    #[must_use]
    pub const fn is_cancellable(self) -> bool {
        !matches!(
            self,
            Self::Shipped | Self::OutForDelivery | Self::Delivered | Self::Cancelled | Self::Refunded
        )
    }

    /// Whether the order has reached a final state.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled | Self::Refunded)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Processing => "processing",
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Packed => "packed",
            Self::Shipped => "shipped",
            Self::OutForDelivery => "out_for_delivery",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
            Self::Refunded => "refunded",
        };
        f.write_str(label)
    }
}

/// Payment status of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
    Failed,
    Refunded,
}

/// Refund progress of a cancelled order that had been paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefundStatus {
    Pending,
    Processed,
    Failed,
}

/// How a saved payment method settles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethodKind {
    /// Cash on delivery.
    Cod,
    Upi,
    Card,
    Wallet,
}

impl std::fmt::Display for PaymentMethodKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cod => write!(f, "cod"),
            Self::Upi => write!(f, "upi"),
            Self::Card => write!(f, "card"),
            Self::Wallet => write!(f, "wallet"),
        }
    }
}

impl std::str::FromStr for PaymentMethodKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cod" => Ok(Self::Cod),
            "upi" => Ok(Self::Upi),
            "card" => Ok(Self::Card),
            "wallet" => Ok(Self::Wallet),
            _ => Err(format!("invalid payment method kind: {s}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_cancellable_statuses() {
        assert!(OrderStatus::Processing.is_cancellable());
        assert!(OrderStatus::Pending.is_cancellable());
        assert!(OrderStatus::Packed.is_cancellable());
        for status in OrderStatus::NOT_CANCELLABLE {
            assert!(!status.is_cancellable(), "{status} should not be cancellable");
        }
    }

    #[test]
    fn test_new_orders_start_processing() {
        assert_eq!(OrderStatus::default(), OrderStatus::Processing);
        let status: OrderStatus = serde_json::from_str("\"processing\"").unwrap();
        assert_eq!(status, OrderStatus::Processing);
    }

    #[test]
    fn test_backend_only_statuses_deserialize() {
        for (raw, expected) in [
            ("\"shipped\"", OrderStatus::Shipped),
            ("\"refunded\"", OrderStatus::Refunded),
        ] {
            assert_eq!(serde_json::from_str::<OrderStatus>(raw).unwrap(), expected);
        }
        assert!(OrderStatus::Refunded.is_terminal());
    }

    #[test]
    fn test_order_status_wire_format() {
        let json = serde_json::to_string(&OrderStatus::OutForDelivery).unwrap();
        assert_eq!(json, "\"out_for_delivery\"");
        assert_eq!(OrderStatus::OutForDelivery.to_string(), "out_for_delivery");
    }

    #[test]
    fn test_payment_method_kind_parse() {
        assert_eq!("upi".parse::<PaymentMethodKind>(), Ok(PaymentMethodKind::Upi));
        assert!("cheque".parse::<PaymentMethodKind>().is_err());
    }
}
