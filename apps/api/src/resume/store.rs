use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::resume::RESUME_COLUMNS;
use crate::models::ResumeRecord;

#[async_trait]
pub trait ResumeStore: Send + Sync {
    async fn find_for_user(&self, user_id: Uuid) -> Result<Option<ResumeRecord>, sqlx::Error>;

    /// Inserts the user's resume or replaces its content. Never creates a second row.
    async fn upsert(&self, user_id: Uuid, content: &str) -> Result<ResumeRecord, sqlx::Error>;
}

#[derive(Clone)]
pub struct PgResumeStore {
    pool: PgPool,
}

impl PgResumeStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ResumeStore for PgResumeStore {
    async fn find_for_user(&self, user_id: Uuid) -> Result<Option<ResumeRecord>, sqlx::Error> {
        let sql = format!(r#"SELECT {RESUME_COLUMNS} FROM "Resume" WHERE "userId" = $1"#);
        sqlx::query_as::<_, ResumeRecord>(&sql)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn upsert(&self, user_id: Uuid, content: &str) -> Result<ResumeRecord, sqlx::Error> {
        let sql = format!(
            r#"
            INSERT INTO "Resume" ("userId", content)
            VALUES ($1, $2)
            ON CONFLICT ("userId") DO UPDATE
                SET content = EXCLUDED.content, "updatedAt" = NOW()
            RETURNING {RESUME_COLUMNS}
            "#
        );
        sqlx::query_as::<_, ResumeRecord>(&sql)
            .bind(user_id)
            .bind(content)
            .fetch_one(&self.pool)
            .await
    }
}
