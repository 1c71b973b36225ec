//! Command implementations.
//!
//! Each command builds a [`DaylizStore`] over Supabase, drives one or more
//! notifier operations and prints the resulting state.

pub mod account;
pub mod cart;
pub mod catalog;
pub mod orders;

use serde::Serialize;
use thiserror::Error;

use dayliz_core::{User, UserId};
use dayliz_state::{
    DaylizConfig, DaylizStore, Outcome, Repositories, ResourceState, SupabaseClient,
    SupabaseError,
};

/// Errors that can end a command.
#[derive(Debug, Error)]
pub enum CliError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// The HTTP client could not be built.
    #[error("Client error: {0}")]
    Client(#[from] SupabaseError),

    /// A notifier operation did not apply.
    #[error("{resource}: {message}")]
    Failed {
        resource: &'static str,
        message: String,
    },

    /// Output could not be serialised.
    #[error("Output error: {0}")]
    Output(#[from] serde_json::Error),
}

/// A signed-in store plus the user it belongs to.
pub struct Session {
    pub store: DaylizStore,
    pub user: User,
}

impl Session {
    /// Sign in with `DAYLIZ_EMAIL` / `DAYLIZ_PASSWORD`.
    pub async fn sign_in(config: &DaylizConfig) -> Result<Self, CliError> {
        let email =
            std::env::var("DAYLIZ_EMAIL").map_err(|_| CliError::MissingEnvVar("DAYLIZ_EMAIL"))?;
        let password = std::env::var("DAYLIZ_PASSWORD")
            .map_err(|_| CliError::MissingEnvVar("DAYLIZ_PASSWORD"))?;

        let store = store(config)?;
        let outcome = store.auth().login(&email, &password).await;
        ensure_applied("auth", outcome, &store.auth().state())?;

        let user = store
            .auth()
            .current_user()
            .ok_or_else(|| CliError::Failed {
                resource: "auth",
                message: "Signed in without a user".to_string(),
            })?;
        tracing::info!(user_id = %user.id, "Signed in as {}", user.display_name());

        Ok(Self { store, user })
    }

    #[must_use]
    pub const fn user_id(&self) -> &UserId {
        &self.user.id
    }
}

/// Build a store backed by Supabase. No Google account picker is available
/// from a terminal.
pub fn store(config: &DaylizConfig) -> Result<DaylizStore, CliError> {
    let client = SupabaseClient::new(config, None)?;
    Ok(DaylizStore::new(Repositories::supabase(&client)))
}

/// Turn a non-applied outcome into an error carrying the state's message.
pub fn ensure_applied<D>(
    resource: &'static str,
    outcome: Outcome,
    state: &ResourceState<D>,
) -> Result<(), CliError> {
    match outcome {
        Outcome::Applied => Ok(()),
        Outcome::Failed => Err(CliError::Failed {
            resource,
            message: state
                .error_message
                .clone()
                .unwrap_or_else(|| "Operation failed".to_string()),
        }),
        Outcome::Busy => Err(CliError::Failed {
            resource,
            message: "Another operation is still running".to_string(),
        }),
        Outcome::Cancelled => Err(CliError::Failed {
            resource,
            message: "Cancelled".to_string(),
        }),
    }
}

/// Print a value as pretty JSON on stdout.
#[allow(clippy::print_stdout)]
pub fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
