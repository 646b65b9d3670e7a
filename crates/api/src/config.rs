//! Environment-driven configuration, in the shape of the teacher's
//! `PodAIConfig::from_env`/`validate`: every field has an explicit
//! default via `unwrap_or_else`, and `validate` is the single place that
//! rejects a bad configuration before the server ever binds a socket.

use auction_auth::MIN_SIGNING_KEY_LEN;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub auth_signing_key: String,
    pub auth_token_issuer: String,
    pub auth_token_audience: String,
    pub lock_backend_enabled: bool,
    pub lock_redis_url: String,
    pub http_bind_addr: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgres://localhost/bidup".to_string()),
            auth_signing_key: std::env::var("AUTH_SIGNING_KEY").unwrap_or_else(|_| String::new()),
            auth_token_issuer: std::env::var("AUTH_TOKEN_ISSUER").unwrap_or_else(|_| "bidup".to_string()),
            auth_token_audience: std::env::var("AUTH_TOKEN_AUDIENCE")
                .unwrap_or_else(|_| "bidup-clients".to_string()),
            lock_backend_enabled: std::env::var("LOCK_BACKEND_ENABLED")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
            lock_redis_url: std::env::var("LOCK_REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string()),
            http_bind_addr: std::env::var("HTTP_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string()),
        }
    }

    /// Reject a configuration the server should refuse to start with,
    /// rather than fail confusingly on the first request that needs it.
    pub fn validate(&self) -> Result<(), String> {
        if self.auth_signing_key.len() < MIN_SIGNING_KEY_LEN {
            return Err(format!(
                "AUTH_SIGNING_KEY must be at least {MIN_SIGNING_KEY_LEN} characters"
            ));
        }
        if self.lock_backend_enabled && self.lock_redis_url.is_empty() {
            return Err("LOCK_REDIS_URL must be set when LOCK_BACKEND_ENABLED=true".to_string());
        }
        if self.http_bind_addr.parse::<std::net::SocketAddr>().is_err() {
            return Err(format!("HTTP_BIND_ADDR is not a valid socket address: {}", self.http_bind_addr));
        }
        Ok(())
    }

    #[cfg(test)]
    pub fn for_tests() -> Self {
        Self {
            database_url: "postgres://localhost/bidup_test".to_string(),
            auth_signing_key: "a-signing-key-at-least-32-bytes!".to_string(),
            auth_token_issuer: "bidup".to_string(),
            auth_token_audience: "bidup-clients".to_string(),
            lock_backend_enabled: false,
            lock_redis_url: String::new(),
            http_bind_addr: "0.0.0.0:8080".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_signing_key_is_rejected() {
        let mut config = AppConfig::for_tests();
        config.auth_signing_key = "too-short".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn redis_backend_requires_a_url() {
        let mut config = AppConfig::for_tests();
        config.lock_backend_enabled = true;
        config.lock_redis_url = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn default_test_config_is_valid() {
        assert!(AppConfig::for_tests().validate().is_ok());
    }
}
