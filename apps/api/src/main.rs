use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use mirai::config::Config;
use mirai::db::{create_pool, schema};
use mirai::export::{ExportGate, MarkdownPdfConverter};
use mirai::identity::{ClerkIdentityProvider, PgUserStore};
use mirai::resume::PgResumeStore;
use mirai::routes::build_router;
use mirai::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "mirai={level},api={level},tower_http={level}",
                level = config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Mirai API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url).await?;
    if config.bootstrap_schema {
        schema::bootstrap(&db).await?;
    }

    // Initialize Clerk identity lookups
    let identity = ClerkIdentityProvider::from_config(&config)?;
    info!(
        "Identity provider initialized (header: {})",
        config.identity_header
    );

    let state = AppState {
        config: config.clone(),
        identity: Arc::new(identity),
        users: Arc::new(PgUserStore::new(db.clone())),
        resumes: Arc::new(PgResumeStore::new(db)),
        converter: Arc::new(MarkdownPdfConverter),
        export_gate: ExportGate::new(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
