use std::sync::Arc;

use axum::response::Json;
use serde_json::Value;

use crate::cache::{CacheStore, MemoryCache};
use crate::config::ServerConfig;
use crate::error::AppError;
use crate::server::rate_limit::RateLimiter;
use crate::service::{AuthService, TextService};
use crate::storage::{MemoryStore, TextRepository, UserRepository};

#[derive(Clone)]
pub struct AppState {
    pub texts: Arc<TextService>,
    pub auth: Arc<AuthService>,
    pub rate_limiter: Arc<RateLimiter>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    /// Wire the services over explicit repositories and cache
    pub fn new(
        config: ServerConfig,
        texts: Arc<dyn TextRepository>,
        users: Arc<dyn UserRepository>,
        cache: Arc<dyn CacheStore>,
    ) -> Self {
        let text_service = TextService::new(texts, cache, config.text_service_config());
        let auth = AuthService::new(users, &config.jwt_secret, config.token_ttl());
        let rate_limiter = RateLimiter::new(config.rate_limit_max, config.rate_limit_window());

        Self {
            texts: Arc::new(text_service),
            auth: Arc::new(auth),
            rate_limiter: Arc::new(rate_limiter),
            config: Arc::new(config),
        }
    }

    /// State backed by a fresh `MemoryStore` and the given cache
    pub fn in_memory(config: ServerConfig, cache: MemoryCache) -> Self {
        let store = MemoryStore::new();
        Self::new(
            config,
            Arc::new(store.clone()),
            Arc::new(store),
            Arc::new(cache),
        )
    }
}

pub async fn root() -> &'static str {
    "Welcome to the Text Analysis API!"
}

pub async fn health() -> Json<Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

pub async fn route_not_found() -> AppError {
    AppError::NotFound("Route".to_string())
}
