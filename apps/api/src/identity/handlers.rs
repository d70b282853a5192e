use axum::Json;

use crate::identity::Session;
use crate::models::UserRecord;

/// GET /api/v1/me
/// The caller's user row, provisioning it on first sight. `null` when signed out.
pub async fn handle_me(session: Session) -> Json<Option<UserRecord>> {
    Json(session.user)
}
