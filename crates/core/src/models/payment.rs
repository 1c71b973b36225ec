//! Saved payment methods (`payment_methods` table).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::{DefaultFlag, Entity};
use crate::types::{PaymentMethodId, PaymentMethodKind, UserId};

/// A saved payment method. Card numbers are never stored; only the last four
/// digits are kept for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentMethod {
    pub id: PaymentMethodId,
    pub user_id: UserId,
    pub kind: PaymentMethodKind,
    pub label: String,
    pub card_last4: Option<String>,
    pub card_network: Option<String>,
    pub upi_id: Option<String>,
    #[serde(default)]
    pub is_default: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl PaymentMethod {
    /// Text shown in the checkout picker, e.g. `Visa •••• 4242`.
    #[must_use]
    pub fn summary(&self) -> String {
        match (self.kind, &self.card_last4, &self.upi_id) {
            (PaymentMethodKind::Card, Some(last4), _) => {
                let network = self.card_network.as_deref().unwrap_or("Card");
                format!("{network} •••• {last4}")
            }
            (PaymentMethodKind::Upi, _, Some(vpa)) => format!("UPI {vpa}"),
            (PaymentMethodKind::Cod, _, _) => "Cash on delivery".to_string(),
            _ => self.label.clone(),
        }
    }
}

/// Payload for saving a payment method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPaymentMethod {
    pub kind: PaymentMethodKind,
    pub label: String,
    pub card_last4: Option<String>,
    pub card_network: Option<String>,
    pub upi_id: Option<String>,
    #[serde(default)]
    pub is_default: bool,
}

impl Entity for PaymentMethod {
    type Id = PaymentMethodId;
    type Draft = NewPaymentMethod;

    fn id(&self) -> PaymentMethodId {
        self.id
    }
}

impl DefaultFlag for PaymentMethod {
    fn is_default(&self) -> bool {
        self.is_default
    }

    fn with_default(self, is_default: bool) -> Self {
        Self { is_default, ..self }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn method(kind: PaymentMethodKind) -> PaymentMethod {
        PaymentMethod {
            id: PaymentMethodId::generate(),
            user_id: UserId::generate(),
            kind,
            label: "Saved".into(),
            card_last4: Some("4242".into()),
            card_network: Some("Visa".into()),
            upi_id: Some("asha@okaxis".into()),
            is_default: false,
            created_at: None,
        }
    }

    #[test]
    fn test_summary_by_kind() {
        assert_eq!(method(PaymentMethodKind::Card).summary(), "Visa •••• 4242");
        assert_eq!(method(PaymentMethodKind::Upi).summary(), "UPI asha@okaxis");
        assert_eq!(method(PaymentMethodKind::Cod).summary(), "Cash on delivery");
        assert_eq!(method(PaymentMethodKind::Wallet).summary(), "Saved");
    }
}
