//! In-memory stores and a fixed identity provider for handler and reconciler tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::http::HeaderMap;
use chrono::Utc;
use uuid::Uuid;

use crate::config::{Config, DEFAULT_CLERK_API_URL, DEFAULT_IDENTITY_HEADER};
use crate::export::{ExportGate, MarkdownPdfConverter};
use crate::identity::{ExternalIdentity, IdentityError, IdentityProvider, UserStore};
use crate::models::{NewUser, ResumeRecord, UserRecord};
use crate::resume::ResumeStore;
use crate::state::AppState;

pub const TEST_USER_HEADER: &str = DEFAULT_IDENTITY_HEADER;

#[derive(Default)]
pub struct MemoryUserStore {
    users: Mutex<Vec<UserRecord>>,
    fail: bool,
}

impl MemoryUserStore {
    /// Every call fails with a database error.
    pub fn failing() -> Self {
        Self {
            users: Mutex::default(),
            fail: true,
        }
    }

    pub fn len(&self) -> usize {
        self.users.lock().unwrap().len()
    }

    fn check(&self) -> Result<(), sqlx::Error> {
        if self.fail {
            return Err(sqlx::Error::PoolTimedOut);
        }
        Ok(())
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_clerk_id(&self, clerk_user_id: &str) -> Result<Option<UserRecord>, sqlx::Error> {
        self.check()?;
        let users = self.users.lock().unwrap();
        Ok(users.iter().find(|u| u.clerk_user_id == clerk_user_id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, sqlx::Error> {
        self.check()?;
        let users = self.users.lock().unwrap();
        Ok(users.iter().find(|u| u.email == email).cloned())
    }

    async fn relink_clerk_id(&self, id: Uuid, clerk_user_id: &str) -> Result<UserRecord, sqlx::Error> {
        self.check()?;
        let mut users = self.users.lock().unwrap();
        let user = users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or(sqlx::Error::RowNotFound)?;
        user.clerk_user_id = clerk_user_id.to_string();
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn create(&self, new: NewUser) -> Result<UserRecord, sqlx::Error> {
        self.check()?;
        let mut users = self.users.lock().unwrap();
        if users
            .iter()
            .any(|u| u.clerk_user_id == new.clerk_user_id || u.email == new.email)
        {
            return Err(sqlx::Error::Protocol("duplicate key value".into()));
        }
        let now = Utc::now();
        let user = UserRecord {
            id: Uuid::new_v4(),
            clerk_user_id: new.clerk_user_id,
            email: new.email,
            name: Some(new.name),
            image_url: new.image_url,
            industry: None,
            bio: None,
            experience: None,
            skills: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        users.push(user.clone());
        Ok(user)
    }
}

#[derive(Default)]
pub struct MemoryResumeStore {
    resumes: Mutex<HashMap<Uuid, ResumeRecord>>,
}

impl MemoryResumeStore {
    pub fn len(&self) -> usize {
        self.resumes.lock().unwrap().len()
    }
}

#[async_trait]
impl ResumeStore for MemoryResumeStore {
    async fn find_for_user(&self, user_id: Uuid) -> Result<Option<ResumeRecord>, sqlx::Error> {
        Ok(self.resumes.lock().unwrap().get(&user_id).cloned())
    }

    async fn upsert(&self, user_id: Uuid, content: &str) -> Result<ResumeRecord, sqlx::Error> {
        let now = Utc::now();
        let mut resumes = self.resumes.lock().unwrap();
        let record = resumes.entry(user_id).or_insert_with(|| ResumeRecord {
            id: Uuid::new_v4(),
            user_id,
            content: String::new(),
            ats_score: None,
            feedback: None,
            created_at: now,
            updated_at: now,
        });
        record.content = content.to_string();
        record.updated_at = now;
        Ok(record.clone())
    }
}

/// Resolves the identity header value against a fixed set of identities.
#[derive(Default)]
pub struct StaticIdentityProvider {
    identities: HashMap<String, ExternalIdentity>,
}

impl StaticIdentityProvider {
    pub fn with(mut self, identity: ExternalIdentity) -> Self {
        self.identities.insert(identity.id.clone(), identity);
        self
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentityProvider {
    async fn current_identity(
        &self,
        headers: &HeaderMap,
    ) -> Result<Option<ExternalIdentity>, IdentityError> {
        Ok(headers
            .get(TEST_USER_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|id| self.identities.get(id).cloned()))
    }
}

pub fn ada() -> ExternalIdentity {
    ExternalIdentity {
        id: "user_ada".into(),
        first_name: Some("Ada".into()),
        last_name: Some("Lovelace".into()),
        image_url: None,
        email_addresses: vec!["ada@example.com".into()],
    }
}

pub fn test_config() -> Config {
    Config {
        database_url: "postgres://localhost/mirai_test".into(),
        clerk_secret_key: "sk_test".into(),
        clerk_api_url: DEFAULT_CLERK_API_URL.into(),
        identity_header: DEFAULT_IDENTITY_HEADER.into(),
        port: 0,
        rust_log: "debug".into(),
        bootstrap_schema: false,
    }
}

/// State with in-memory stores; `ada()` is the only known identity.
pub fn test_state() -> (AppState, Arc<MemoryUserStore>, Arc<MemoryResumeStore>) {
    test_state_with_users(MemoryUserStore::default())
}

pub fn test_state_with_users(
    users: MemoryUserStore,
) -> (AppState, Arc<MemoryUserStore>, Arc<MemoryResumeStore>) {
    let users = Arc::new(users);
    let resumes = Arc::new(MemoryResumeStore::default());
    let state = AppState {
        config: test_config(),
        identity: Arc::new(StaticIdentityProvider::default().with(ada())),
        users: users.clone(),
        resumes: resumes.clone(),
        converter: Arc::new(MarkdownPdfConverter),
        export_gate: ExportGate::new(),
    };
    (state, users, resumes)
}
