//! Maps an external identity onto exactly one `"User"` row.

use anyhow::anyhow;
use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{error, info};
use uuid::Uuid;

use crate::identity::ExternalIdentity;
use crate::models::user::USER_COLUMNS;
use crate::models::{NewUser, UserRecord};

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_clerk_id(&self, clerk_user_id: &str) -> Result<Option<UserRecord>, sqlx::Error>;

    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, sqlx::Error>;

    /// Points an existing user at a new external id.
    async fn relink_clerk_id(&self, id: Uuid, clerk_user_id: &str)
        -> Result<UserRecord, sqlx::Error>;

    async fn create(&self, user: NewUser) -> Result<UserRecord, sqlx::Error>;
}

/// Returns the user row for `identity`, creating or relinking it as needed.
///
/// Lookup is by external id first, then by primary email (the external id
/// changed, e.g. the account was recreated), then a new row is inserted.
/// Failures are logged and reported as `None`; callers treat that the same
/// as "no user".
pub async fn reconcile<U: UserStore + ?Sized>(
    store: &U,
    identity: Option<&ExternalIdentity>,
) -> Option<UserRecord> {
    let identity = identity?;
    match try_reconcile(store, identity).await {
        Ok(user) => Some(user),
        Err(e) => {
            error!("Failed to reconcile user {}: {e:#}", identity.id);
            None
        }
    }
}

async fn try_reconcile<U: UserStore + ?Sized>(
    store: &U,
    identity: &ExternalIdentity,
) -> anyhow::Result<UserRecord> {
    if let Some(user) = store.find_by_clerk_id(&identity.id).await? {
        return Ok(user);
    }

    let email = identity
        .primary_email()
        .ok_or_else(|| anyhow!("identity {} has no email address", identity.id))?;

    if let Some(existing) = store.find_by_email(email).await? {
        let user = store.relink_clerk_id(existing.id, &identity.id).await?;
        info!("Relinked user {} to Clerk id {}", user.id, identity.id);
        return Ok(user);
    }

    let user = store
        .create(NewUser {
            clerk_user_id: identity.id.clone(),
            name: identity.full_name(),
            image_url: identity.image_url.clone(),
            email: email.to_string(),
        })
        .await?;
    info!("Created user {} for Clerk id {}", user.id, identity.id);
    Ok(user)
}

#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_clerk_id(&self, clerk_user_id: &str) -> Result<Option<UserRecord>, sqlx::Error> {
        let sql = format!(r#"SELECT {USER_COLUMNS} FROM "User" WHERE "clerkUserId" = $1"#);
        sqlx::query_as::<_, UserRecord>(&sql)
            .bind(clerk_user_id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, sqlx::Error> {
        let sql = format!(r#"SELECT {USER_COLUMNS} FROM "User" WHERE email = $1"#);
        sqlx::query_as::<_, UserRecord>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await
    }

    async fn relink_clerk_id(
        &self,
        id: Uuid,
        clerk_user_id: &str,
    ) -> Result<UserRecord, sqlx::Error> {
        let sql = format!(
            r#"UPDATE "User" SET "clerkUserId" = $2, "updatedAt" = NOW()
               WHERE id = $1
               RETURNING {USER_COLUMNS}"#
        );
        sqlx::query_as::<_, UserRecord>(&sql)
            .bind(id)
            .bind(clerk_user_id)
            .fetch_one(&self.pool)
            .await
    }

    async fn create(&self, user: NewUser) -> Result<UserRecord, sqlx::Error> {
        let sql = format!(
            r#"INSERT INTO "User" ("clerkUserId", name, "imageUrl", email)
               VALUES ($1, $2, $3, $4)
               RETURNING {USER_COLUMNS}"#
        );
        sqlx::query_as::<_, UserRecord>(&sql)
            .bind(&user.clerk_user_id)
            .bind(&user.name)
            .bind(&user.image_url)
            .bind(&user.email)
            .fetch_one(&self.pool)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryUserStore;

    fn identity(id: &str, email: &str) -> ExternalIdentity {
        ExternalIdentity {
            id: id.into(),
            first_name: Some("Ada".into()),
            last_name: Some("Lovelace".into()),
            image_url: Some("https://img.example.com/ada.png".into()),
            email_addresses: vec![email.into()],
        }
    }

    #[tokio::test]
    async fn test_no_identity_yields_none() {
        let store = MemoryUserStore::default();
        assert!(reconcile(&store, None).await.is_none());
        assert_eq!(store.len(), 0);
    }

    #[tokio::test]
    async fn test_creates_user_on_first_sight() {
        let store = MemoryUserStore::default();
        let user = reconcile(&store, Some(&identity("user_1", "ada@example.com")))
            .await
            .unwrap();

        assert_eq!(user.clerk_user_id, "user_1");
        assert_eq!(user.email, "ada@example.com");
        assert_eq!(user.name.as_deref(), Some("Ada Lovelace"));
        assert_eq!(user.image_url.as_deref(), Some("https://img.example.com/ada.png"));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_reconcile_is_idempotent() {
        let store = MemoryUserStore::default();
        let id = identity("user_1", "ada@example.com");
        let first = reconcile(&store, Some(&id)).await.unwrap();
        let second = reconcile(&store, Some(&id)).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_email_match_relinks_without_duplicate() {
        let store = MemoryUserStore::default();
        let original = reconcile(&store, Some(&identity("user_old", "ada@example.com")))
            .await
            .unwrap();

        let relinked = reconcile(&store, Some(&identity("user_new", "ada@example.com")))
            .await
            .unwrap();

        assert_eq!(relinked.id, original.id);
        assert_eq!(relinked.clerk_user_id, "user_new");
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_name_empty_when_both_parts_absent() {
        let store = MemoryUserStore::default();
        let mut id = identity("user_1", "ada@example.com");
        id.first_name = None;
        id.last_name = None;

        let user = reconcile(&store, Some(&id)).await.unwrap();
        assert_eq!(user.name.as_deref(), Some(""));
    }

    #[tokio::test]
    async fn test_store_error_yields_none() {
        let store = MemoryUserStore::failing();
        assert!(reconcile(&store, Some(&identity("user_1", "ada@example.com")))
            .await
            .is_none());
    }

    #[tokio::test]
    async fn test_identity_without_email_yields_none() {
        let store = MemoryUserStore::default();
        let mut id = identity("user_1", "ada@example.com");
        id.email_addresses.clear();

        assert!(reconcile(&store, Some(&id)).await.is_none());
        assert_eq!(store.len(), 0);
    }
}
