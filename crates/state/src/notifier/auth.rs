//! Auth session notifier.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::watch;
use tracing::{info, instrument};

use dayliz_core::{Email, User};

use super::{Outcome, ResourceNotifier};
use crate::failure::{self, Failure};
use crate::repository::{AuthRepository, SignUp};
use crate::state::ResourceState;

/// Who is signed in.
///
/// Only constructible as [`AuthSession::signed_in`] or
/// [`AuthSession::signed_out`], so `is_authenticated` and `user` can never
/// disagree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AuthSession {
    is_authenticated: bool,
    user: Option<User>,
}

impl AuthSession {
    #[must_use]
    pub const fn signed_in(user: User) -> Self {
        Self {
            is_authenticated: true,
            user: Some(user),
        }
    }

    #[must_use]
    pub const fn signed_out() -> Self {
        Self {
            is_authenticated: false,
            user: None,
        }
    }

    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.is_authenticated
    }

    #[must_use]
    pub const fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }
}

impl From<Option<User>> for AuthSession {
    fn from(user: Option<User>) -> Self {
        user.map_or_else(Self::signed_out, Self::signed_in)
    }
}

/// Drives sign-in, sign-up and sign-out.
///
/// Closing the Google account picker is not a failure: the notifier settles
/// with no error and returns [`Outcome::Cancelled`].
pub struct AuthNotifier {
    state: ResourceNotifier<AuthSession>,
    repository: Arc<dyn AuthRepository>,
}

impl AuthNotifier {
    #[must_use]
    pub fn new(repository: Arc<dyn AuthRepository>) -> Self {
        Self {
            state: ResourceNotifier::new("auth"),
            repository,
        }
    }

    #[must_use]
    pub fn state(&self) -> ResourceState<AuthSession> {
        self.state.state()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ResourceState<AuthSession>> {
        self.state.subscribe()
    }

    /// The signed-in user, if any.
    #[must_use]
    pub fn current_user(&self) -> Option<User> {
        self.state().data.user
    }

    /// Pick up a session persisted by the backend client.
    #[instrument(skip(self))]
    pub async fn restore(&self) -> Outcome {
        let repository = Arc::clone(&self.repository);
        let outcome = self
            .state
            .load("restore", async move {
                repository.current_user().await.map(AuthSession::from)
            })
            .await;
        self.after_sign_in(outcome)
    }

    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Outcome {
        let repository = Arc::clone(&self.repository);
        let email = Email::parse(email);
        let password = password.to_string();
        let outcome = self
            .state
            .load("login", async move {
                let email = email.map_err(|e| Failure::Auth(e.to_string()))?;
                let user = repository.sign_in_with_password(&email, &password).await?;
                Ok(AuthSession::signed_in(user))
            })
            .await;
        self.after_sign_in(outcome)
    }

    #[instrument(skip(self, password, phone))]
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
        phone: Option<&str>,
    ) -> Outcome {
        let repository = Arc::clone(&self.repository);
        let email = Email::parse(email);
        let details = (name.trim().to_string(), password.to_string(), phone.map(String::from));
        let outcome = self
            .state
            .load("register", async move {
                let email = email.map_err(|e| Failure::Auth(e.to_string()))?;
                let (name, password, phone) = details;
                if name.is_empty() {
                    return Err(Failure::Auth("Please enter your name".to_string()));
                }
                let user = repository
                    .sign_up(SignUp {
                        name,
                        email,
                        password,
                        phone,
                    })
                    .await?;
                Ok(AuthSession::signed_in(user))
            })
            .await;
        self.after_sign_in(outcome)
    }

    #[instrument(skip(self))]
    pub async fn sign_in_with_google(&self) -> Outcome {
        let repository = Arc::clone(&self.repository);
        let outcome = self
            .state
            .load("google_sign_in", async move {
                repository.sign_in_with_google().await.map(AuthSession::signed_in)
            })
            .await;
        self.after_sign_in(outcome)
    }

    /// Sign out. The session is cleared only once the backend confirms.
    #[instrument(skip(self))]
    pub async fn logout(&self) -> Outcome {
        let outcome = self
            .state
            .mutate("logout", self.repository.sign_out(), |_, ()| {
                Ok(AuthSession::signed_out())
            })
            .await;
        if outcome.is_applied() {
            failure::clear_sentry_user();
            info!("User signed out");
        }
        outcome
    }

    /// Change the signed-in user's password.
    ///
    /// Wrong-current-password and password-policy errors come back from the
    /// backend with user-ready messages and are shown verbatim.
    #[instrument(skip_all)]
    pub async fn change_password(&self, current: &str, new: &str) -> Outcome {
        if !self.state().data.is_authenticated() {
            return self.state.reject(
                "change_password",
                &Failure::Auth("Please sign in again".to_string()),
            );
        }
        self.state
            .mutate(
                "change_password",
                self.repository.change_password(current, new),
                |session, ()| Ok(session.clone()),
            )
            .await
    }

    #[instrument(skip(self))]
    pub async fn request_password_reset(&self, email: &str) -> Outcome {
        let email = match Email::parse(email) {
            Ok(email) => email,
            Err(e) => {
                return self
                    .state
                    .reject("password_reset", &Failure::Auth(e.to_string()));
            }
        };
        let repository = Arc::clone(&self.repository);
        self.state
            .mutate(
                "password_reset",
                async move { repository.request_password_reset(&email).await },
                |session, ()| Ok(session.clone()),
            )
            .await
    }

    fn after_sign_in(&self, outcome: Outcome) -> Outcome {
        if outcome.is_applied()
            && let Some(user) = self.current_user()
        {
            failure::set_sentry_user(&user);
            info!(user_id = %user.id, "User signed in");
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::failure::Result;
    use dayliz_core::UserId;

    /// Scripted backend: each sign-in returns the next queued result.
    struct Scripted {
        results: Mutex<Vec<Result<User>>>,
    }

    impl Scripted {
        fn new(results: Vec<Result<User>>) -> Arc<Self> {
            Arc::new(Self {
                results: Mutex::new(results),
            })
        }

        fn next(&self) -> Result<User> {
            self.results
                .lock()
                .ok()
                .and_then(|mut results| results.pop())
                .unwrap_or_else(|| Err(Failure::Unknown("script exhausted".into())))
        }
    }

    #[async_trait]
    impl AuthRepository for Scripted {
        async fn current_user(&self) -> Result<Option<User>> {
            Ok(None)
        }

        async fn sign_in_with_password(&self, _email: &Email, _password: &str) -> Result<User> {
            self.next()
        }

        async fn sign_up(&self, _details: SignUp) -> Result<User> {
            self.next()
        }

        async fn sign_in_with_google(&self) -> Result<User> {
            self.next()
        }

        async fn sign_out(&self) -> Result<()> {
            Ok(())
        }

        async fn change_password(&self, current: &str, _new: &str) -> Result<()> {
            if current == "right" {
                Ok(())
            } else {
                Err(Failure::Auth("Current password is incorrect".into()))
            }
        }

        async fn request_password_reset(&self, _email: &Email) -> Result<()> {
            Ok(())
        }
    }

    fn user() -> User {
        User {
            id: UserId::generate(),
            email: Email::parse("meera@dayliz.in").unwrap_or_else(|_| unreachable!()),
            name: Some("Meera".into()),
            phone: None,
            email_confirmed: true,
            created_at: None,
        }
    }

    #[tokio::test]
    async fn test_login_sets_session_atomically() {
        let notifier = AuthNotifier::new(Scripted::new(vec![Ok(user())]));
        assert_eq!(notifier.login("meera@dayliz.in", "pw").await, Outcome::Applied);

        let session = notifier.state().data;
        assert!(session.is_authenticated());
        assert_eq!(session.user().map(|u| u.email.as_str()), Some("meera@dayliz.in"));
    }

    #[tokio::test]
    async fn test_invalid_email_never_reaches_backend() {
        let notifier = AuthNotifier::new(Scripted::new(Vec::new()));
        assert_eq!(notifier.login("meera", "pw").await, Outcome::Failed);
        assert_eq!(
            notifier.state().error_message.as_deref(),
            Some("Please enter a valid email address")
        );
    }

    #[tokio::test]
    async fn test_google_cancellation_is_silent() {
        let notifier = AuthNotifier::new(Scripted::new(vec![Err(Failure::Cancelled)]));
        assert_eq!(notifier.sign_in_with_google().await, Outcome::Cancelled);

        let state = notifier.state();
        assert!(!state.is_loading);
        assert!(state.error_message.is_none());
        assert!(!state.data.is_authenticated());
    }

    #[tokio::test]
    async fn test_google_auth_failure_is_shown() {
        let notifier = AuthNotifier::new(Scripted::new(vec![Err(Failure::Auth(
            "Google account is disabled".into(),
        ))]));
        assert_eq!(notifier.sign_in_with_google().await, Outcome::Failed);
        assert_eq!(
            notifier.state().error_message.as_deref(),
            Some("Google account is disabled")
        );
    }

    #[tokio::test]
    async fn test_logout_clears_both_fields() {
        let notifier = AuthNotifier::new(Scripted::new(vec![Ok(user())]));
        let _ = notifier.login("meera@dayliz.in", "pw").await;
        assert_eq!(notifier.logout().await, Outcome::Applied);
        assert_eq!(notifier.state().data, AuthSession::signed_out());
    }

    #[tokio::test]
    async fn test_change_password_messages() {
        let notifier = AuthNotifier::new(Scripted::new(vec![Ok(user())]));
        assert_eq!(notifier.change_password("right", "n3w").await, Outcome::Failed);

        let _ = notifier.login("meera@dayliz.in", "pw").await;
        assert_eq!(notifier.change_password("wrong", "n3w").await, Outcome::Failed);
        assert_eq!(
            notifier.state().error_message.as_deref(),
            Some("Current password is incorrect")
        );
        assert_eq!(notifier.change_password("right", "n3w").await, Outcome::Applied);
        assert!(notifier.state().error_message.is_none());
        assert!(notifier.state().data.is_authenticated());
    }
}
