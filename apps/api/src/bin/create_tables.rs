//! One-shot schema bootstrap. Exits non-zero when the database is unreachable.

use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use mirai::config::require_env;
use mirai::db::{create_pool, schema};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let database_url = require_env("DATABASE_URL")?;
    let pool = create_pool(&database_url).await?;

    schema::bootstrap(&pool).await?;

    pool.close().await;
    Ok(())
}
