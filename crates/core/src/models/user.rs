//! Signed-in user and profile types.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{Email, UserId};

/// An authenticated Supabase user.
///
/// This is the auth identity, not the editable profile row; see
/// [`UserProfile`] for the latter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: Email,
    pub name: Option<String>,
    pub phone: Option<String>,
    /// Whether the email address has been confirmed.
    #[serde(default)]
    pub email_confirmed: bool,
    pub created_at: Option<DateTime<Utc>>,
}

impl User {
    /// Name to greet the user with, falling back to the email local part.
    #[must_use]
    pub fn display_name(&self) -> &str {
        match self.name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => self
                .email
                .as_str()
                .split_once('@')
                .map_or_else(|| self.email.as_str(), |(local, _)| local),
        }
    }
}

/// The editable profile row (`user_profiles` table).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: UserId,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub avatar_url: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<String>,
    /// Free-form app preferences (notification toggles, dietary filters, ...).
    #[serde(default)]
    pub preferences: serde_json::Value,
    pub updated_at: Option<DateTime<Utc>>,
}

impl UserProfile {
    /// An empty profile for a user who has not filled anything in yet.
    #[must_use]
    pub const fn empty(user_id: UserId) -> Self {
        Self {
            user_id,
            full_name: None,
            phone: None,
            avatar_url: None,
            date_of_birth: None,
            gender: None,
            preferences: serde_json::Value::Null,
            updated_at: None,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn user(name: Option<&str>) -> User {
        User {
            id: UserId::generate(),
            email: Email::parse("ravi@dayliz.in").unwrap(),
            name: name.map(String::from),
            phone: None,
            email_confirmed: true,
            created_at: None,
        }
    }

    #[test]
    fn test_display_name_prefers_name() {
        assert_eq!(user(Some("Ravi Kumar")).display_name(), "Ravi Kumar");
    }

    #[test]
    fn test_display_name_falls_back_to_email() {
        assert_eq!(user(None).display_name(), "ravi");
        assert_eq!(user(Some("  ")).display_name(), "ravi");
    }
}
