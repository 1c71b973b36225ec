//! Delivery addresses (`addresses` table).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::{DefaultFlag, Entity};
use crate::types::{AddressId, UserId};

/// A saved delivery address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Address {
    pub id: AddressId,
    pub user_id: UserId,
    /// Short label shown in pickers ("Home", "Work", ...).
    pub label: String,
    pub recipient_name: String,
    pub phone: String,
    pub address_line1: String,
    pub address_line2: Option<String>,
    pub landmark: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    #[serde(default)]
    pub is_default: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Address {
    /// Single-line form used in order snapshots and confirmations.
    #[must_use]
    pub fn formatted(&self) -> String {
        let mut parts = vec![self.address_line1.as_str()];
        if let Some(line2) = self.address_line2.as_deref().filter(|s| !s.is_empty()) {
            parts.push(line2);
        }
        if let Some(landmark) = self.landmark.as_deref().filter(|s| !s.is_empty()) {
            parts.push(landmark);
        }
        parts.push(&self.city);
        let head = parts.join(", ");
        format!("{head}, {} {}, {}", self.state, self.postal_code, self.country)
    }
}

/// Payload for creating an address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAddress {
    pub label: String,
    pub recipient_name: String,
    pub phone: String,
    pub address_line1: String,
    pub address_line2: Option<String>,
    pub landmark: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    #[serde(default)]
    pub is_default: bool,
}

impl Entity for Address {
    type Id = AddressId;
    type Draft = NewAddress;

    fn id(&self) -> AddressId {
        self.id
    }
}

impl DefaultFlag for Address {
    fn is_default(&self) -> bool {
        self.is_default
    }

    fn with_default(self, is_default: bool) -> Self {
        Self { is_default, ..self }
    }
}
