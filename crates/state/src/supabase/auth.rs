//! GoTrue-backed [`AuthRepository`].

use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use secrecy::SecretString;
use tracing::{info, instrument, warn};

use dayliz_core::{Email, User};

use super::types::{
    AuthUser, IdTokenGrant, PasswordGrant, PasswordUpdate, RecoverBody, SignUpBody, SignUpData,
    SignUpResponse, TokenResponse,
};
use super::{Session, SupabaseClient, SupabaseError};
use crate::failure::{Failure, Result};
use crate::repository::{AuthRepository, SignUp};

/// Shown when the current password does not verify during a change.
pub const WRONG_CURRENT_PASSWORD_MESSAGE: &str = "Current password is incorrect";

/// Shown after sign-up when the project requires email confirmation.
pub const CONFIRM_EMAIL_MESSAGE: &str =
    "Account created. Please confirm your email address, then sign in.";

impl SupabaseClient {
    async fn token_grant<B: serde::Serialize + Sync>(
        &self,
        grant_type: &str,
        body: &B,
    ) -> std::result::Result<TokenResponse, SupabaseError> {
        let mut url = self.endpoint("auth/v1/token")?;
        url.query_pairs_mut().append_pair("grant_type", grant_type);
        let request = self.request(Method::POST, url).await.json(body);
        self.send_json(request).await
    }

    /// Store the session and hand back the signed-in user.
    async fn start_session(&self, token: TokenResponse) -> Result<User> {
        let user = User::try_from(token.user)?;
        *self.inner.session.write().await = Some(Session {
            access_token: SecretString::from(token.access_token),
            user: user.clone(),
        });
        Ok(user)
    }

    async fn session_email(&self) -> Option<Email> {
        self.inner
            .session
            .read()
            .await
            .as_ref()
            .map(|session| session.user.email.clone())
    }
}

/// GoTrue answers credential problems with 400/422; surface those as auth
/// failures carrying the backend's wording.
fn auth_failure(err: SupabaseError) -> Failure {
    match err {
        SupabaseError::Status { status, message }
            if status == StatusCode::BAD_REQUEST || status == StatusCode::UNPROCESSABLE_ENTITY =>
        {
            Failure::Auth(message)
        }
        other => other.into(),
    }
}

#[async_trait]
impl AuthRepository for SupabaseClient {
    #[instrument(skip(self))]
    async fn current_user(&self) -> Result<Option<User>> {
        if !self.has_session().await {
            return Ok(None);
        }

        let url = self.endpoint("auth/v1/user")?;
        let request = self.request(Method::GET, url).await;
        match self.send_json::<AuthUser>(request).await {
            Ok(user) => User::try_from(user).map(Some),
            Err(SupabaseError::Status { status, .. }) if status == StatusCode::UNAUTHORIZED => {
                warn!("Stored session rejected, clearing it");
                *self.inner.session.write().await = None;
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    #[instrument(skip(self, password), fields(email = %email))]
    async fn sign_in_with_password(&self, email: &Email, password: &str) -> Result<User> {
        let token = self
            .token_grant(
                "password",
                &PasswordGrant {
                    email: email.as_str(),
                    password,
                },
            )
            .await
            .map_err(auth_failure)?;
        self.start_session(token).await
    }

    #[instrument(skip(self, details), fields(email = %details.email))]
    async fn sign_up(&self, details: SignUp) -> Result<User> {
        let url = self.endpoint("auth/v1/signup")?;
        let body = SignUpBody {
            email: details.email.as_str(),
            password: &details.password,
            data: SignUpData {
                full_name: &details.name,
                phone: details.phone.as_deref(),
            },
        };
        let request = self.request(Method::POST, url).await.json(&body);

        match self.send_json(request).await.map_err(auth_failure)? {
            SignUpResponse::Session(token) => self.start_session(token).await,
            SignUpResponse::Pending(user) => {
                info!(user_id = %user.id, "Sign-up awaiting email confirmation");
                Err(Failure::Auth(CONFIRM_EMAIL_MESSAGE.to_string()))
            }
        }
    }

    #[instrument(skip(self))]
    async fn sign_in_with_google(&self) -> Result<User> {
        let Some(provider) = self.inner.id_tokens.as_ref() else {
            return Err(Failure::Auth(
                "Google sign-in is not available on this device".to_string(),
            ));
        };
        let Some(id_token) = provider.google_id_token().await? else {
            return Err(Failure::Cancelled);
        };

        let token = self
            .token_grant(
                "id_token",
                &IdTokenGrant {
                    provider: "google",
                    id_token: &id_token,
                },
            )
            .await
            .map_err(auth_failure)?;
        self.start_session(token).await
    }

    #[instrument(skip(self))]
    async fn sign_out(&self) -> Result<()> {
        if !self.has_session().await {
            return Ok(());
        }

        let url = self.endpoint("auth/v1/logout")?;
        let request = self.request(Method::POST, url).await;
        match self.send_empty(request).await {
            // An already-expired token means the server side is signed out too.
            Ok(()) | Err(SupabaseError::Status { .. }) => {}
            Err(e) => return Err(e.into()),
        }
        *self.inner.session.write().await = None;
        Ok(())
    }

    #[instrument(skip_all)]
    async fn change_password(&self, current: &str, new: &str) -> Result<()> {
        let email = self
            .session_email()
            .await
            .ok_or(SupabaseError::NotSignedIn)?;

        // GoTrue does not check the old password on update, so verify it by
        // signing in again first.
        let token = self
            .token_grant(
                "password",
                &PasswordGrant {
                    email: email.as_str(),
                    password: current,
                },
            )
            .await
            .map_err(|e| match auth_failure(e) {
                Failure::Auth(_) => Failure::Auth(WRONG_CURRENT_PASSWORD_MESSAGE.to_string()),
                other => other,
            })?;
        self.start_session(token).await?;

        let url = self.endpoint("auth/v1/user")?;
        let request = self
            .request(Method::PUT, url)
            .await
            .json(&PasswordUpdate { password: new });
        self.send_json::<AuthUser>(request)
            .await
            .map_err(auth_failure)?;
        info!("Password changed");
        Ok(())
    }

    #[instrument(skip(self), fields(email = %email))]
    async fn request_password_reset(&self, email: &Email) -> Result<()> {
        let url = self.endpoint("auth/v1/recover")?;
        let request = self.request(Method::POST, url).await.json(&RecoverBody {
            email: email.as_str(),
        });
        self.send_empty(request).await.map_err(auth_failure)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bad_request_is_auth_failure() {
        let failure = auth_failure(SupabaseError::Status {
            status: StatusCode::BAD_REQUEST,
            message: "Invalid login credentials".into(),
        });
        assert_eq!(failure, Failure::Auth("Invalid login credentials".into()));
    }

    #[test]
    fn test_server_error_stays_server() {
        let failure = auth_failure(SupabaseError::Status {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: "database unavailable".into(),
        });
        assert_eq!(failure, Failure::Server("database unavailable".into()));
    }
}
