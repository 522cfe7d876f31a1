// =============================================================================
// SkillSwap Backend - Configuration
// =============================================================================

use std::env;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address (e.g., "127.0.0.1:7100")
    pub bind_address: String,

    /// Database URL (SQLite path)
    pub database_url: String,

    /// JWT secret for signing tokens
    pub jwt_secret: String,

    /// JWT token expiry in hours
    pub jwt_expiry_hours: i64,

    /// Bootstrap admin email (account is created at startup when set
    /// together with `admin_password` and no admin exists yet)
    pub admin_email: Option<String>,

    /// Bootstrap admin password
    pub admin_password: Option<String>,

    /// Bootstrap admin username
    pub admin_username: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            bind_address: env::var("BIND_ADDRESS").unwrap_or_else(|_| "127.0.0.1:7100".into()),
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:skillswap.db".into()),
            jwt_secret: env::var("JWT_SECRET").map_err(|_| ConfigError::Missing("JWT_SECRET"))?,
            jwt_expiry_hours: env::var("JWT_EXPIRY_HOURS")
                .unwrap_or_else(|_| "24".into())
                .parse()
                .unwrap_or(24),
            admin_email: env::var("ADMIN_EMAIL").ok(),
            admin_password: env::var("ADMIN_PASSWORD").ok(),
            admin_username: env::var("ADMIN_USERNAME").unwrap_or_else(|_| "admin".into()),
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
}
