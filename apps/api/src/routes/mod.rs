pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::builder::handlers as builder;
use crate::export::handlers as export;
use crate::identity::handlers as identity;
use crate::resume::handlers as resume;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/me", get(identity::handle_me))
        .route(
            "/api/v1/resume",
            get(resume::handle_get_resume).post(resume::handle_save_resume),
        )
        .route("/api/v1/resume/preview", post(builder::handle_preview))
        .route("/api/v1/resume/export", post(export::handle_export))
        .with_state(state)
}
