//! Idempotent schema bootstrap for the `"User"` and `"Resume"` tables.

use anyhow::{Context, Result};
use sqlx::PgPool;
use tracing::{debug, info};

/// DDL statements, executed in order. Each is safe to re-run.
pub const SCHEMA_STATEMENTS: &[&str] = &[
    // gen_random_uuid() is core from PostgreSQL 13; the extension covers older servers.
    r#"CREATE EXTENSION IF NOT EXISTS pgcrypto"#,
    r#"
    CREATE TABLE IF NOT EXISTS "User" (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        "clerkUserId" TEXT UNIQUE NOT NULL,
        email TEXT UNIQUE NOT NULL,
        name TEXT,
        "imageUrl" TEXT,
        industry TEXT,
        bio TEXT,
        experience INT,
        skills TEXT[] NOT NULL DEFAULT '{}',
        "createdAt" TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        "updatedAt" TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS "Resume" (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        "userId" UUID UNIQUE NOT NULL REFERENCES "User"(id),
        content TEXT NOT NULL,
        "atsScore" DOUBLE PRECISION,
        feedback TEXT,
        "createdAt" TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        "updatedAt" TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
];

/// Creates the tables if absent. Runs in one transaction so a failure leaves
/// the database as it was.
pub async fn bootstrap(pool: &PgPool) -> Result<()> {
    let mut tx = pool.begin().await.context("Failed to open bootstrap transaction")?;

    for (i, statement) in SCHEMA_STATEMENTS.iter().enumerate() {
        debug!("Executing schema statement {}/{}", i + 1, SCHEMA_STATEMENTS.len());
        sqlx::query(statement)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("Schema statement {} failed", i + 1))?;
    }

    tx.commit().await.context("Failed to commit schema bootstrap")?;
    info!("All tables created successfully");
    Ok(())
}
