//! Supabase-backed repositories.
//!
//! # Architecture
//!
//! - GoTrue (`/auth/v1`) for sessions; the access token lives in memory only
//! - PostgREST (`/rest/v1`) for every table, filtered with `eq.` operators
//! - Writes send `Prefer: return=representation` so the stored row comes back
//! - Categories are cached via `moka` (TTL from config)
//!
//! Transport problems surface as [`SupabaseError`] and are converted into a
//! [`Failure`] at the repository edge.

mod auth;
mod rest;
pub mod types;

use std::sync::Arc;

use moka::future::Cache;
use reqwest::{Method, RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, error};
use url::Url;

use dayliz_core::{Category, User};

use crate::config::DaylizConfig;
use crate::failure::Failure;
use crate::repository::IdTokenProvider;

use types::ErrorBody;

/// Message used when a call needs a session and there is none.
pub const SESSION_EXPIRED_MESSAGE: &str = "Your session has expired. Please sign in again.";

const CATEGORY_CACHE_KEY: &str = "categories";

/// Errors that can occur when talking to Supabase.
#[derive(Debug, Error)]
pub enum SupabaseError {
    /// HTTP request failed before a response arrived.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body was not the expected JSON.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Endpoint path could not be joined onto the project URL.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// Non-success status with the backend's message.
    #[error("HTTP {status}: {message}")]
    Status { status: StatusCode, message: String },

    /// A write matched no row.
    #[error("No matching row in {0}")]
    MissingRow(&'static str),

    /// The call requires a signed-in session.
    #[error("Not signed in")]
    NotSignedIn,
}

impl From<SupabaseError> for Failure {
    fn from(err: SupabaseError) -> Self {
        match err {
            SupabaseError::Http(e) if e.is_builder() || e.is_decode() => Self::Unknown(e.to_string()),
            SupabaseError::Http(e) => Self::Network(e.to_string()),
            SupabaseError::Parse(e) => Self::Unknown(e.to_string()),
            SupabaseError::Url(e) => Self::Unknown(e.to_string()),
            SupabaseError::Status { status, message } => match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Self::Auth(message),
                StatusCode::NOT_FOUND => Self::NotFound(message),
                _ => Self::Server(message),
            },
            SupabaseError::MissingRow(_) => Self::NotFound(String::new()),
            SupabaseError::NotSignedIn => Self::Auth(SESSION_EXPIRED_MESSAGE.to_string()),
        }
    }
}

/// An authenticated session.
struct Session {
    access_token: SecretString,
    user: User,
}

/// Client for a Supabase project.
///
/// Cheap to clone; clones share the session and the category cache. One
/// client implements every repository trait, so the same value is handed to
/// each notifier.
#[derive(Clone)]
pub struct SupabaseClient {
    inner: Arc<SupabaseClientInner>,
}

struct SupabaseClientInner {
    http: reqwest::Client,
    base_url: Url,
    anon_key: SecretString,
    session: RwLock<Option<Session>>,
    categories: Cache<&'static str, Vec<Category>>,
    id_tokens: Option<Arc<dyn IdTokenProvider>>,
}

impl SupabaseClient {
    /// Create a client for the configured project.
    ///
    /// `id_tokens` is the Google account picker; without one, Google sign-in
    /// reports an auth failure.
    ///
    /// # Errors
    ///
    /// Returns `SupabaseError::Http` if the HTTP client cannot be built.
    pub fn new(
        config: &DaylizConfig,
        id_tokens: Option<Arc<dyn IdTokenProvider>>,
    ) -> Result<Self, SupabaseError> {
        let http = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()?;

        let categories = Cache::builder()
            .max_capacity(1)
            .time_to_live(config.category_cache_ttl)
            .build();

        Ok(Self {
            inner: Arc::new(SupabaseClientInner {
                http,
                base_url: config.supabase_url.clone(),
                anon_key: config.supabase_anon_key.clone(),
                session: RwLock::new(None),
                categories,
                id_tokens,
            }),
        })
    }

    /// Whether a session token is held.
    pub async fn has_session(&self) -> bool {
        self.inner.session.read().await.is_some()
    }

    fn endpoint(&self, path: &str) -> Result<Url, SupabaseError> {
        Ok(self.inner.base_url.join(path)?)
    }

    /// Start a request with the project key and the best available bearer
    /// token (the session's, else the anon key).
    async fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let bearer = match self.inner.session.read().await.as_ref() {
            Some(session) => session.access_token.expose_secret().to_string(),
            None => self.inner.anon_key.expose_secret().to_string(),
        };

        self.inner
            .http
            .request(method, url)
            .header("apikey", self.inner.anon_key.expose_secret())
            .bearer_auth(bearer)
    }

    /// Send and decode a JSON body.
    async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, SupabaseError> {
        let body = self.send_raw(request).await?;
        serde_json::from_str(&body).map_err(|e| {
            error!(
                error = %e,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to parse Supabase response"
            );
            SupabaseError::Parse(e)
        })
    }

    /// Send and discard the body.
    async fn send_empty(&self, request: RequestBuilder) -> Result<(), SupabaseError> {
        self.send_raw(request).await.map(drop)
    }

    async fn send_raw(&self, request: RequestBuilder) -> Result<String, SupabaseError> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if status.is_success() {
            return Ok(body);
        }

        let message = error_message(&body);
        debug!(status = %status, message = %message, "Supabase returned non-success status");
        Err(SupabaseError::Status { status, message })
    }
}

/// Pull the human-readable message out of a GoTrue or PostgREST error body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(ErrorBody::into_message)
        .unwrap_or_else(|| body.chars().take(200).collect())
}
