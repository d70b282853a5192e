// User identity: who is calling, and which `"User"` row they map to.
//
// Authentication itself is delegated to Clerk. This module only reads the
// already-authenticated user id from the request, fetches the profile and
// reconciles it with the local user table.

pub mod clerk;
pub mod extract;
pub mod handlers;
pub mod reconcile;

use async_trait::async_trait;
use axum::http::HeaderMap;
use serde::Deserialize;
use thiserror::Error;

pub use clerk::ClerkIdentityProvider;
pub use extract::{CurrentIdentity, CurrentUser, Session};
pub use reconcile::{reconcile, PgUserStore, UserStore};

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Identity provider error (status {status}): {message}")]
    Api { status: u16, message: String },
}

/// The authenticated user as the identity provider describes them.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct ExternalIdentity {
    pub id: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub image_url: Option<String>,
    /// Primary address first.
    pub email_addresses: Vec<String>,
}

impl ExternalIdentity {
    pub fn primary_email(&self) -> Option<&str> {
        self.email_addresses.first().map(String::as_str)
    }

    /// First and last name joined by a space and trimmed; empty when both are absent.
    pub fn full_name(&self) -> String {
        format!(
            "{} {}",
            self.first_name.as_deref().unwrap_or_default(),
            self.last_name.as_deref().unwrap_or_default()
        )
        .trim()
        .to_string()
    }
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Resolves the caller of a request. `Ok(None)` means not signed in.
    async fn current_identity(
        &self,
        headers: &HeaderMap,
    ) -> Result<Option<ExternalIdentity>, IdentityError>;
}
