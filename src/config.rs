use std::time::Duration;

use rand_core::{OsRng, RngCore};

use crate::service::TextServiceConfig;

/// Runtime settings for the server
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub token_ttl_secs: u64,
    /// Allowed CORS origin. `None` allows any origin.
    pub client_url: Option<String>,
    pub cache_ttl_secs: u64,
    pub list_cache_ttl_secs: u64,
    pub cache_check_period_secs: u64,
    pub rate_limit_max: usize,
    pub rate_limit_window_secs: u64,
    /// Key rate limiting on `X-Forwarded-For` instead of the socket peer
    pub trust_proxy: bool,
    pub require_title: bool,
    pub owner_only_statistics: bool,
    pub secure_cookies: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            jwt_secret: generate_secret(),
            token_ttl_secs: 3600,
            client_url: None,
            cache_ttl_secs: 300,
            list_cache_ttl_secs: 60,
            cache_check_period_secs: 120,
            rate_limit_max: 100,
            rate_limit_window_secs: 15 * 60,
            trust_proxy: false,
            require_title: false,
            owner_only_statistics: false,
            secure_cookies: false,
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn text_service_config(&self) -> TextServiceConfig {
        TextServiceConfig {
            cache_ttl: Duration::from_secs(self.cache_ttl_secs),
            list_cache_ttl: Duration::from_secs(self.list_cache_ttl_secs),
            require_title: self.require_title,
            owner_only_statistics: self.owner_only_statistics,
        }
    }

    pub fn token_ttl(&self) -> Duration {
        Duration::from_secs(self.token_ttl_secs)
    }

    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_secs(self.rate_limit_window_secs)
    }
}

/// Use the configured JWT secret or fall back to a random one.
pub fn resolve_jwt_secret(configured: Option<String>) -> String {
    match configured.filter(|s| !s.is_empty()) {
        Some(secret) => {
            if secret.len() < 32 {
                tracing::warn!("JWT_SECRET is less than 32 characters - consider using a longer secret");
            }
            secret
        }
        None => {
            tracing::warn!("JWT_SECRET is not set; generated a random secret for this process.");
            tracing::warn!("All issued tokens become invalid when the server restarts.");
            generate_secret()
        }
    }
}

fn generate_secret() -> String {
    let mut key_bytes = [0u8; 32];
    OsRng.fill_bytes(&mut key_bytes);
    hex::encode(key_bytes)
}
