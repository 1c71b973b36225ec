//! Wire types for GoTrue and PostgREST.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use dayliz_core::{
    Email, NewOrder, NewOrderItem, OrderId, OrderStatus, PaymentMethodKind, User, UserId,
};

use crate::failure::Failure;

// =============================================================================
// Errors
// =============================================================================

/// Error body returned by either service. GoTrue uses `error_description` or
/// `msg`, PostgREST uses `message`.
#[derive(Debug, Default, Deserialize)]
pub struct ErrorBody {
    pub error_description: Option<String>,
    pub msg: Option<String>,
    pub message: Option<String>,
    pub error: Option<String>,
}

impl ErrorBody {
    #[must_use]
    pub fn into_message(self) -> Option<String> {
        [self.error_description, self.msg, self.message, self.error]
            .into_iter()
            .flatten()
            .find(|m| !m.trim().is_empty())
    }
}

// =============================================================================
// Auth
// =============================================================================

/// GoTrue user object.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthUser {
    pub id: UserId,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub email_confirmed_at: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub user_metadata: UserMetadata,
}

/// Free-form metadata written at sign-up (or by the Google provider).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserMetadata {
    pub full_name: Option<String>,
    pub name: Option<String>,
    pub phone: Option<String>,
}

impl TryFrom<AuthUser> for User {
    type Error = Failure;

    fn try_from(user: AuthUser) -> Result<Self, Self::Error> {
        let email = user
            .email
            .as_deref()
            .ok_or_else(|| Failure::Unknown("auth user has no email".to_string()))
            .and_then(|raw| Email::parse(raw).map_err(|e| Failure::Unknown(e.to_string())))?;

        let non_empty = |value: Option<String>| value.filter(|v| !v.trim().is_empty());
        let UserMetadata {
            full_name,
            name,
            phone: metadata_phone,
        } = user.user_metadata;

        Ok(Self {
            id: user.id,
            email,
            name: non_empty(full_name).or_else(|| non_empty(name)),
            phone: non_empty(user.phone).or_else(|| non_empty(metadata_phone)),
            email_confirmed: user.email_confirmed_at.is_some(),
            created_at: user.created_at,
        })
    }
}

/// Response of the token endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub user: AuthUser,
}

/// Sign-up answers with a session when auto-confirm is on, otherwise with the
/// bare user awaiting email confirmation.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SignUpResponse {
    Session(TokenResponse),
    Pending(AuthUser),
}

#[derive(Debug, Serialize)]
pub struct PasswordGrant<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Serialize)]
pub struct IdTokenGrant<'a> {
    pub provider: &'static str,
    pub id_token: &'a str,
}

#[derive(Debug, Serialize)]
pub struct SignUpBody<'a> {
    pub email: &'a str,
    pub password: &'a str,
    pub data: SignUpData<'a>,
}

#[derive(Debug, Serialize)]
pub struct SignUpData<'a> {
    pub full_name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<&'a str>,
}

#[derive(Debug, Serialize)]
pub struct PasswordUpdate<'a> {
    pub password: &'a str,
}

#[derive(Debug, Serialize)]
pub struct RecoverBody<'a> {
    pub email: &'a str,
}

// =============================================================================
// Rows
// =============================================================================

/// A draft row stamped with its owner.
#[derive(Debug, Serialize)]
pub struct Owned<'a, T: Serialize> {
    pub user_id: &'a UserId,
    #[serde(flatten)]
    pub row: &'a T,
}

#[derive(Debug, Serialize)]
pub struct DefaultPatch {
    pub is_default: bool,
}

/// `orders` row for a new order; lines go to `order_items` separately.
#[derive(Debug, Serialize)]
pub struct OrderInsert<'a> {
    pub user_id: &'a UserId,
    pub status: OrderStatus,
    pub payment_method: PaymentMethodKind,
    pub delivery_address: &'a str,
    pub address_lat: Option<f64>,
    pub address_lng: Option<f64>,
    pub subtotal: Decimal,
    pub delivery_fee: Decimal,
    pub total_price: Decimal,
}

impl<'a> OrderInsert<'a> {
    #[must_use]
    pub fn new(user_id: &'a UserId, order: &'a NewOrder) -> Self {
        Self {
            user_id,
            status: OrderStatus::Processing,
            payment_method: order.payment_method,
            delivery_address: &order.delivery_address,
            address_lat: order.address_lat,
            address_lng: order.address_lng,
            subtotal: order.subtotal,
            delivery_fee: order.delivery_fee,
            total_price: order.total_price,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct OrderItemInsert<'a> {
    pub order_id: OrderId,
    #[serde(flatten)]
    pub item: &'a NewOrderItem,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_user_prefers_full_name_and_confirmed_flag() {
        let raw = r#"{
            "id": "7b1c2d3e-4f50-4a6b-8c9d-0e1f2a3b4c5d",
            "email": "Meera@Dayliz.in",
            "phone": "",
            "email_confirmed_at": "2025-01-05T10:00:00Z",
            "created_at": "2025-01-05T09:59:00Z",
            "user_metadata": {"full_name": "Meera Sangma", "phone": "+919800000000"}
        }"#;
        let user = User::try_from(serde_json::from_str::<AuthUser>(raw).unwrap()).unwrap();

        assert_eq!(user.email.as_str(), "meera@dayliz.in");
        assert_eq!(user.name.as_deref(), Some("Meera Sangma"));
        assert_eq!(user.phone.as_deref(), Some("+919800000000"));
        assert!(user.email_confirmed);
    }

    #[test]
    fn test_auth_user_without_email_is_unknown() {
        let raw = r#"{"id": "7b1c2d3e-4f50-4a6b-8c9d-0e1f2a3b4c5d", "phone": "+919800000000"}"#;
        let result = User::try_from(serde_json::from_str::<AuthUser>(raw).unwrap());
        assert!(matches!(result, Err(Failure::Unknown(_))));
    }

    #[test]
    fn test_sign_up_response_shapes() {
        let pending = r#"{"id": "7b1c2d3e-4f50-4a6b-8c9d-0e1f2a3b4c5d", "email": "a@b.in"}"#;
        assert!(matches!(
            serde_json::from_str::<SignUpResponse>(pending).unwrap(),
            SignUpResponse::Pending(_)
        ));

        let session = r#"{"access_token": "t", "user": {"id": "7b1c2d3e-4f50-4a6b-8c9d-0e1f2a3b4c5d", "email": "a@b.in"}}"#;
        assert!(matches!(
            serde_json::from_str::<SignUpResponse>(session).unwrap(),
            SignUpResponse::Session(_)
        ));
    }

    #[test]
    fn test_owned_row_flattens() {
        #[derive(Serialize)]
        struct Draft {
            label: &'static str,
        }

        let user_id = UserId::generate();
        let json = serde_json::to_value(Owned {
            user_id: &user_id,
            row: &Draft { label: "Home" },
        })
        .unwrap();

        assert_eq!(json["label"], "Home");
        assert_eq!(json["user_id"], user_id.to_string());
    }
}
