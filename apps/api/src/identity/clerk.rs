use std::time::Duration;

use async_trait::async_trait;
use axum::http::HeaderMap;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::Config;
use crate::identity::{ExternalIdentity, IdentityError, IdentityProvider};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Deserialize)]
struct ClerkUser {
    id: String,
    first_name: Option<String>,
    last_name: Option<String>,
    image_url: Option<String>,
    primary_email_address_id: Option<String>,
    #[serde(default)]
    email_addresses: Vec<ClerkEmailAddress>,
}

#[derive(Debug, Deserialize)]
struct ClerkEmailAddress {
    id: String,
    email_address: String,
}

#[derive(Debug, Deserialize)]
struct ClerkErrorBody {
    errors: Vec<ClerkErrorEntry>,
}

#[derive(Debug, Deserialize)]
struct ClerkErrorEntry {
    message: String,
}

impl From<ClerkUser> for ExternalIdentity {
    fn from(user: ClerkUser) -> Self {
        let mut addresses = user.email_addresses;
        if let Some(primary) = &user.primary_email_address_id {
            if let Some(pos) = addresses.iter().position(|a| &a.id == primary) {
                addresses.swap(0, pos);
            }
        }
        ExternalIdentity {
            id: user.id,
            first_name: user.first_name,
            last_name: user.last_name,
            image_url: user.image_url,
            email_addresses: addresses.into_iter().map(|a| a.email_address).collect(),
        }
    }
}

/// Looks up the signed-in user in the Clerk backend API.
///
/// The user id is read from a header set by the authenticating proxy in
/// front of this service; the profile comes from `GET /users/{id}`.
#[derive(Clone)]
pub struct ClerkIdentityProvider {
    client: Client,
    api_url: String,
    secret_key: String,
    identity_header: String,
}

impl ClerkIdentityProvider {
    pub fn new(
        api_url: impl Into<String>,
        secret_key: impl Into<String>,
        identity_header: impl Into<String>,
    ) -> Result<Self, IdentityError> {
        Ok(Self {
            client: Client::builder().timeout(REQUEST_TIMEOUT).build()?,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            secret_key: secret_key.into(),
            identity_header: identity_header.into(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, IdentityError> {
        Self::new(
            config.clerk_api_url.clone(),
            config.clerk_secret_key.clone(),
            config.identity_header.clone(),
        )
    }

    fn user_id<'h>(&self, headers: &'h HeaderMap) -> Option<&'h str> {
        headers
            .get(self.identity_header.as_str())
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    }

    pub async fn fetch_user(&self, user_id: &str) -> Result<Option<ExternalIdentity>, IdentityError> {
        let response = self
            .client
            .get(format!("{}/users/{}", self.api_url, user_id))
            .bearer_auth(&self.secret_key)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            warn!("Clerk user {user_id} not found");
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ClerkErrorBody>(&body)
                .ok()
                .and_then(|b| b.errors.into_iter().next())
                .map(|e| e.message)
                .unwrap_or(body);
            return Err(IdentityError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let user: ClerkUser = response.json().await?;
        debug!("Fetched Clerk user {}", user.id);
        Ok(Some(user.into()))
    }
}

#[async_trait]
impl IdentityProvider for ClerkIdentityProvider {
    async fn current_identity(
        &self,
        headers: &HeaderMap,
    ) -> Result<Option<ExternalIdentity>, IdentityError> {
        match self.user_id(headers) {
            Some(user_id) => self.fetch_user(user_id).await,
            None => Ok(None),
        }
    }
}
