//! User profile notifier.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::instrument;

use dayliz_core::{UserId, UserProfile};

use super::{Outcome, ResourceNotifier};
use crate::repository::ProfileRepository;
use crate::state::ResourceState;

/// Mirrors the signed-in user's profile row.
///
/// `data == None` means "not loaded" or "no profile yet", never an error.
pub struct ProfileNotifier {
    state: ResourceNotifier<Option<UserProfile>>,
    repository: Arc<dyn ProfileRepository>,
}

impl ProfileNotifier {
    #[must_use]
    pub fn new(repository: Arc<dyn ProfileRepository>) -> Self {
        Self {
            state: ResourceNotifier::new("profile"),
            repository,
        }
    }

    #[must_use]
    pub fn state(&self) -> ResourceState<Option<UserProfile>> {
        self.state.state()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ResourceState<Option<UserProfile>>> {
        self.state.subscribe()
    }

    pub fn reset(&self) {
        self.state.reset();
    }

    #[instrument(skip(self))]
    pub async fn load(&self, user: &UserId) -> Outcome {
        self.state.load("load", self.repository.fetch(user)).await
    }

    /// Save the profile and keep the server's copy.
    #[instrument(skip_all, fields(user_id = %profile.user_id))]
    pub async fn update(&self, profile: &UserProfile) -> Outcome {
        self.state
            .mutate("update", self.repository.update(profile), |_, saved| {
                Ok(Some(saved))
            })
            .await
    }
}
