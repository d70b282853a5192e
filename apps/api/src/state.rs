use std::sync::Arc;

use crate::config::Config;
use crate::export::{ExportGate, PdfConverter};
use crate::identity::{IdentityProvider, UserStore};
use crate::resume::ResumeStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Resolves the caller. Default: Clerk, keyed by the identity header.
    pub identity: Arc<dyn IdentityProvider>,
    pub users: Arc<dyn UserStore>,
    pub resumes: Arc<dyn ResumeStore>,
    /// Markdown-to-PDF backend used by the export endpoint.
    pub converter: Arc<dyn PdfConverter>,
    /// One export at a time per user.
    pub export_gate: ExportGate,
}
