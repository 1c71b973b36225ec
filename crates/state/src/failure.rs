//! Failure taxonomy shared by every repository and notifier.
//!
//! Repositories return [`Failure`] for every expected error. Notifiers turn a
//! failure into the text shown to the user with [`Failure::user_message`],
//! which is the only place user-facing error wording lives.

use thiserror::Error;

use dayliz_core::User;

pub const NETWORK_MESSAGE: &str = "Please check your internet connection and try again.";
pub const SERVER_MESSAGE: &str = "A server error occurred. Please try again later.";
pub const AUTH_MESSAGE: &str = "Authentication failed.";
pub const CACHE_MESSAGE: &str = "A local storage error occurred. Please restart the app.";
pub const NOT_FOUND_MESSAGE: &str = "The requested item could not be found.";
pub const CANCELLED_MESSAGE: &str = "The request was cancelled.";
pub const UNKNOWN_MESSAGE: &str = "An unexpected error occurred. Please try again.";

/// Closed set of failure categories a repository can report.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Failure {
    /// The backend answered with an error.
    #[error("server failure: {0}")]
    Server(String),

    /// The backend could not be reached.
    #[error("network failure: {0}")]
    Network(String),

    /// Local persistence failed.
    #[error("cache failure: {0}")]
    Cache(String),

    /// Credentials or session rejected. Messages are already user-appropriate
    /// (e.g. "Current password is incorrect").
    #[error("auth failure: {0}")]
    Auth(String),

    /// The requested row does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The user abandoned an external flow such as the Google account picker.
    #[error("cancelled by user")]
    Cancelled,

    /// Anything else, including panics caught at the notifier boundary.
    #[error("unexpected failure: {0}")]
    Unknown(String),
}

impl Failure {
    /// The message to display for this failure.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Network(_) => NETWORK_MESSAGE.to_string(),
            Self::Server(msg) => non_empty_or(msg, SERVER_MESSAGE),
            Self::Auth(msg) => non_empty_or(msg, AUTH_MESSAGE),
            Self::Cache(_) => CACHE_MESSAGE.to_string(),
            Self::NotFound(msg) => non_empty_or(msg, NOT_FOUND_MESSAGE),
            Self::Cancelled => CANCELLED_MESSAGE.to_string(),
            Self::Unknown(_) => UNKNOWN_MESSAGE.to_string(),
        }
    }

    /// True for a user-initiated cancellation, which is never shown as an error.
    #[must_use]
    pub const fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Whether the failure points at a bug or outage worth alerting on.
    #[must_use]
    pub const fn is_reportable(&self) -> bool {
        matches!(self, Self::Server(_) | Self::Unknown(_))
    }
}

fn non_empty_or(message: &str, fallback: &str) -> String {
    let trimmed = message.trim();
    if trimmed.is_empty() {
        fallback.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Result alias for repository calls.
pub type Result<T> = std::result::Result<T, Failure>;

/// Log a failure and, for server/unknown failures, capture it to Sentry.
pub fn report(resource: &'static str, operation: &'static str, failure: &Failure) {
    if failure.is_reportable() {
        let event_id = sentry::capture_error(failure);
        tracing::error!(
            resource,
            operation,
            error = %failure,
            sentry_event_id = %event_id,
            "Resource operation failed"
        );
    } else if failure.is_cancellation() {
        tracing::debug!(resource, operation, "Resource operation cancelled by user");
    } else {
        tracing::warn!(resource, operation, error = %failure, "Resource operation failed");
    }
}

/// Associate subsequent Sentry events with the signed-in user.
pub fn set_sentry_user(user: &User) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user.id.to_string()),
            email: Some(user.email.as_str().to_string()),
            ..Default::default()
        }));
    });
}

/// Stop associating Sentry events with a user (on logout).
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Record a breadcrumb for a successful state change.
///
/// Breadcrumbs show up in Sentry reports as the trail of actions leading to
/// an error.
pub fn add_breadcrumb(resource: &'static str, message: &str) {
    sentry::add_breadcrumb(sentry::Breadcrumb {
        category: Some(resource.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    });
}
