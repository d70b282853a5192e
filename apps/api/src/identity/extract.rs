use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::errors::AppError;
use crate::identity::{reconcile, ExternalIdentity};
use crate::models::UserRecord;
use crate::state::AppState;

/// Caller of the request and their reconciled user row, either possibly absent.
/// Only rejects when the identity provider itself fails.
#[derive(Debug, Clone)]
pub struct Session {
    pub identity: Option<ExternalIdentity>,
    pub user: Option<UserRecord>,
}

#[axum::async_trait]
impl FromRequestParts<AppState> for Session {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let identity = state
            .identity
            .current_identity(&parts.headers)
            .await
            .map_err(anyhow::Error::from)?;
        let user = reconcile(state.users.as_ref(), identity.as_ref()).await;
        Ok(Session { identity, user })
    }
}

/// Requires a signed-in caller; does not touch the user table.
#[derive(Debug, Clone)]
pub struct CurrentIdentity(pub ExternalIdentity);

#[axum::async_trait]
impl FromRequestParts<AppState> for CurrentIdentity {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        state
            .identity
            .current_identity(&parts.headers)
            .await
            .map_err(anyhow::Error::from)?
            .map(CurrentIdentity)
            .ok_or(AppError::Unauthorized)
    }
}

/// Requires a signed-in caller with a user row.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub identity: ExternalIdentity,
    pub user: UserRecord,
}

#[axum::async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state).await?;
        let identity = session.identity.ok_or(AppError::Unauthorized)?;
        let user = session
            .user
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
        Ok(CurrentUser { identity, user })
    }
}
