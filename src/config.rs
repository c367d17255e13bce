//! Application configuration, read once from the environment at startup.

use std::time::Duration;

/// Fallback signing secret for local development only.
pub const DEFAULT_JWT_SECRET: &str = "default-jwt-secret-change-in-production";

#[derive(Debug, Clone)]
pub struct Config {
    pub environment: String,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    /// Allowed cross-origin callers (`CORS_ORIGIN`, comma separated).
    pub cors_origins: Vec<String>,
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
    pub bcrypt_cost: u32,
    pub rate_limit_max: u32,
    pub rate_limit_window: Duration,
    /// Set when a single reverse proxy fronts the server (`TRUST_PROXY`); the
    /// rate limiter then keys on the hop that proxy appends.
    pub trust_proxy: bool,
}

impl Config {
    pub fn from_env() -> Self {
        let environment =
            std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        Self {
            environment,
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env_parse("PORT", 5000),
            jwt_secret: std::env::var("JWT_SECRET")
                .ok()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| DEFAULT_JWT_SECRET.to_string()),
            cors_origins: std::env::var("CORS_ORIGIN")
                .map(|s| parse_origins(&s))
                .unwrap_or_default(),
            admin_email: non_empty_var("ADMIN_EMAIL"),
            admin_password: non_empty_var("ADMIN_PASSWORD"),
            bcrypt_cost: env_parse("BCRYPT_COST", bcrypt::DEFAULT_COST),
            rate_limit_max: env_parse("RATE_LIMIT_MAX", 500),
            rate_limit_window: Duration::from_secs(env_parse("RATE_LIMIT_WINDOW_SECS", 15 * 60)),
            trust_proxy: env_parse("TRUST_PROXY", false),
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Refuse to run in production with a guessable signing secret.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.is_production() && self.jwt_secret == DEFAULT_JWT_SECRET {
            anyhow::bail!(
                "JWT_SECRET must be set to a secure, unique value in production. \
                 Refusing to start with the default secret."
            );
        }
        Ok(())
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
impl Config {
    /// Cheap hashing and a fixed secret for handler tests.
    pub fn for_tests() -> Self {
        Self {
            environment: "test".to_string(),
            host: "127.0.0.1".to_string(),
            port: 0,
            jwt_secret: "test-secret".to_string(),
            cors_origins: vec![],
            admin_email: None,
            admin_password: None,
            bcrypt_cost: 4,
            rate_limit_max: 500,
            rate_limit_window: Duration::from_secs(900),
            trust_proxy: false,
        }
    }
}
