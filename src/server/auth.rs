//! Request authentication.
//!
//! Tokens are read from `Authorization: Bearer <token>` first and from the
//! `token` cookie second. A valid token attaches a [`Viewer`] to the request.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use cookie::{Cookie, SameSite};

use super::handlers::AppState;
use crate::error::AppError;

pub const TOKEN_COOKIE: &str = "token";

/// The authenticated caller
#[derive(Debug, Clone, PartialEq)]
pub struct Viewer {
    pub id: i64,
    pub email: String,
}

impl<S: Send + Sync> FromRequestParts<S> for Viewer {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Viewer>()
            .cloned()
            .ok_or_else(|| AppError::Unauthenticated("Unauthorized".to_string()))
    }
}

/// Axum middleware rejecting requests without a valid token
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(req.headers())
        .or_else(|| cookie_token(req.headers()))
        .ok_or_else(|| AppError::Unauthenticated("Unauthorized".to_string()))?;

    let claims = state.auth.validate_token(&token)?;
    req.extensions_mut().insert(Viewer {
        id: claims.id,
        email: claims.email,
    });

    Ok(next.run(req).await)
}

pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

pub fn cookie_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|h| h.to_str().ok())
        .flat_map(|h| Cookie::split_parse(h).flatten())
        .find(|c| c.name() == TOKEN_COOKIE && !c.value().is_empty())
        .map(|c| c.value().to_string())
}

/// `Set-Cookie` value carrying a freshly issued token
pub fn session_cookie(token: &str, max_age_secs: u64, secure: bool) -> String {
    let mut cookie = Cookie::new(TOKEN_COOKIE, token.to_string());
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Strict);
    cookie.set_secure(secure);
    cookie.set_path("/");
    cookie.set_max_age(time::Duration::seconds(max_age_secs as i64));
    cookie.to_string()
}

/// `Set-Cookie` value that removes the token cookie
pub fn clear_session_cookie(secure: bool) -> String {
    let mut cookie = Cookie::new(TOKEN_COOKIE, "");
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Strict);
    cookie.set_secure(secure);
    cookie.set_path("/");
    cookie.set_max_age(time::Duration::ZERO);
    cookie.to_string()
}
