use anyhow::{Context, Result};

pub const DEFAULT_CLERK_API_URL: &str = "https://api.clerk.com/v1";
pub const DEFAULT_IDENTITY_HEADER: &str = "x-clerk-user-id";

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub clerk_secret_key: String,
    pub clerk_api_url: String,
    /// Header carrying the authenticated Clerk user id, set by the auth edge.
    pub identity_header: String,
    pub port: u16,
    pub rust_log: String,
    /// Run the idempotent schema bootstrap before serving.
    pub bootstrap_schema: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            clerk_secret_key: require_env("CLERK_SECRET_KEY")?,
            clerk_api_url: std::env::var("CLERK_API_URL")
                .unwrap_or_else(|_| DEFAULT_CLERK_API_URL.to_string()),
            identity_header: std::env::var("IDENTITY_HEADER")
                .unwrap_or_else(|_| DEFAULT_IDENTITY_HEADER.to_string())
                .to_ascii_lowercase(),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            bootstrap_schema: parse_flag(std::env::var("BOOTSTRAP_SCHEMA").ok().as_deref()),
        })
    }
}

pub fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn parse_flag(value: Option<&str>) -> bool {
    matches!(
        value.map(|v| v.trim().to_ascii_lowercase()).as_deref(),
        Some("1" | "true" | "yes" | "on")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flag_truthy() {
        assert!(parse_flag(Some("true")));
        assert!(parse_flag(Some(" YES ")));
        assert!(parse_flag(Some("1")));
    }

    #[test]
    fn test_parse_flag_falsy() {
        assert!(!parse_flag(None));
        assert!(!parse_flag(Some("false")));
        assert!(!parse_flag(Some("")));
    }
}
