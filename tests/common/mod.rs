//! Shared helpers for the integration tests
//!
//! Builds an in-memory application and hands out tokens for users
//! created straight through the repository, skipping password hashing.

#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::Value;
use text_analyzer::{
    storage::NewUser, AppState, CacheStore, MemoryCache, MemoryStore, ServerConfig, User,
    UserRepository,
};
use tower::ServiceExt;

pub const TEST_SECRET: &str = "integration-test-secret-0123456789abcdef";

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub store: MemoryStore,
    pub cache: MemoryCache,
}

pub fn test_config() -> ServerConfig {
    ServerConfig {
        jwt_secret: TEST_SECRET.to_string(),
        rate_limit_max: 0,
        ..ServerConfig::default()
    }
}

pub fn create_test_app() -> TestApp {
    create_test_app_with(test_config())
}

pub fn create_test_app_with(config: ServerConfig) -> TestApp {
    let store = MemoryStore::new();
    let cache = MemoryCache::new();
    let state = AppState::new(
        config,
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        Arc::new(cache.clone()) as Arc<dyn CacheStore>,
    );
    let router = text_analyzer::create_router(state.clone());

    TestApp {
        router,
        state,
        store,
        cache,
    }
}

impl TestApp {
    /// Create a user directly in the store and issue a token for them
    pub async fn user(&self, email: &str) -> (User, String) {
        let user = UserRepository::create(
            &self.store,
            NewUser {
                email: email.to_string(),
                password_hash: None,
                google_id: None,
            },
        )
        .await
        .expect("Failed to create user");
        let token = self
            .state
            .auth
            .issue_token(&user)
            .expect("Failed to issue token");
        (user, token)
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Request failed");
        let status = response.status();
        (status, response_json(response).await)
    }
}

pub fn json_request(method: &str, uri: &str, token: Option<&str>, body: &Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("Content-Type", "application/json");
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn empty_request(method: &str, uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

// Helper to parse JSON response
pub async fn response_json(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    if body.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(&body).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&body).into_owned()))
}
