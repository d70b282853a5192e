use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

pub const RESUME_COLUMNS: &str = r#"id, "userId" AS user_id, content, "atsScore" AS ats_score,
    feedback, "createdAt" AS created_at, "updatedAt" AS updated_at"#;

/// The single saved resume of a user. `content` is the markdown as saved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ResumeRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub content: String,
    /// Stored and returned; nothing in this service computes it.
    pub ats_score: Option<f64>,
    pub feedback: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
