use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Column list for `"User"` with camelCase columns aliased to field names.
pub const USER_COLUMNS: &str = r#"id, "clerkUserId" AS clerk_user_id, email, name,
    "imageUrl" AS image_url, industry, bio, experience, skills,
    "createdAt" AS created_at, "updatedAt" AS updated_at"#;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub id: Uuid,
    pub clerk_user_id: String,
    pub email: String,
    pub name: Option<String>,
    pub image_url: Option<String>,
    pub industry: Option<String>,
    pub bio: Option<String>,
    /// Years of experience.
    pub experience: Option<i32>,
    pub skills: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields taken from the external identity when a user is first provisioned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub clerk_user_id: String,
    pub name: String,
    pub image_url: Option<String>,
    pub email: String,
}
