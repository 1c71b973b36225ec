//! Email address type used for sign-in and registration.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Reasons an email address is rejected before it reaches the auth backend.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EmailError {
    /// Nothing was entered.
    #[error("Please enter your email address")]
    Empty,
    /// Longer than RFC 5321 allows.
    #[error("Email address must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// Not shaped like `local@domain.tld`.
    #[error("Please enter a valid email address")]
    Malformed,
}

/// A syntactically valid, normalised email address.
///
/// Surrounding whitespace is trimmed and the address is lower-cased, matching
/// how Supabase Auth stores identities. Validation is deliberately shallow:
/// one `@`, a non-empty local part, and a domain containing a dot that does
/// not start or end with one.
///
/// ```
/// use dayliz_core::Email;
///
/// let email = Email::parse("  Shopper@Dayliz.in ").unwrap();
/// assert_eq!(email.as_str(), "shopper@dayliz.in");
///
/// assert!(Email::parse("").is_err());
/// assert!(Email::parse("no-at-symbol").is_err());
/// assert!(Email::parse("user@localhost").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    /// Maximum length of an email address (RFC 5321).
    pub const MAX_LENGTH: usize = 254;

    /// Parse and normalise an email address.
    ///
    /// # Errors
    ///
    /// Returns [`EmailError`] when the input is empty, too long, or malformed.
    pub fn parse(raw: &str) -> Result<Self, EmailError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(EmailError::Empty);
        }
        if trimmed.len() > Self::MAX_LENGTH {
            return Err(EmailError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }

        let (local, domain) = trimmed.split_once('@').ok_or(EmailError::Malformed)?;
        let domain_ok = domain.contains('.')
            && !domain.starts_with('.')
            && !domain.ends_with('.')
            && !domain.contains('@');
        if local.is_empty() || !domain_ok || trimmed.contains(char::is_whitespace) {
            return Err(EmailError::Malformed);
        }

        Ok(Self(trimmed.to_lowercase()))
    }

    /// Returns the address as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the domain part (after the `@`).
    #[must_use]
    pub fn domain(&self) -> &str {
        self.0.split_once('@').map_or("", |(_, domain)| domain)
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Email {
    type Err = EmailError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Email {
    type Error = EmailError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Email> for String {
    fn from(email: Email) -> Self {
        email.0
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_normalises_case_and_whitespace() {
        let email = Email::parse(" Priya.K+veg@Example.CO.IN ").unwrap();
        assert_eq!(email.as_str(), "priya.k+veg@example.co.in");
        assert_eq!(email.domain(), "example.co.in");
    }

    #[test]
    fn test_parse_rejects_empty_and_blank() {
        assert_eq!(Email::parse(""), Err(EmailError::Empty));
        assert_eq!(Email::parse("   "), Err(EmailError::Empty));
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for raw in ["plain", "@dayliz.in", "user@", "user@nodot", "user@.in", "a b@x.in", "a@b@c.in"] {
            assert_eq!(Email::parse(raw), Err(EmailError::Malformed), "{raw}");
        }
    }

    #[test]
    fn test_parse_rejects_too_long() {
        let raw = format!("{}@dayliz.in", "a".repeat(250));
        assert_eq!(Email::parse(&raw), Err(EmailError::TooLong { max: 254 }));
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: Email = serde_json::from_str("\"USER@dayliz.in\"").unwrap();
        assert_eq!(ok.as_str(), "user@dayliz.in");
        assert!(serde_json::from_str::<Email>("\"broken\"").is_err());
    }
}
