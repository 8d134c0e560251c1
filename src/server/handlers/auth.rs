use axum::{
    extract::{rejection::JsonRejection, State},
    http::header,
    response::{AppendHeaders, IntoResponse, Json},
};
use serde::{Deserialize, Serialize};

use super::system::AppState;
use crate::error::{AppError, AppResult};
use crate::server::auth::{clear_session_cookie, session_cookie};
use crate::server::response::ApiResponse;
use crate::storage::User;

#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
}

fn credentials(body: Result<Json<CredentialsRequest>, JsonRejection>) -> AppResult<CredentialsRequest> {
    body.map(|Json(req)| req)
        .map_err(|rejection| AppError::BadRequest(rejection.body_text()))
}

pub async fn register_handler(
    State(state): State<AppState>,
    body: Result<Json<CredentialsRequest>, JsonRejection>,
) -> AppResult<ApiResponse<User>> {
    let req = credentials(body)?;
    let user = state.auth.register(req.email, req.password).await?;
    Ok(ApiResponse::created("User registered successfully", user))
}

/// Returns the token in the body and as an HttpOnly session cookie
pub async fn login_handler(
    State(state): State<AppState>,
    body: Result<Json<CredentialsRequest>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let req = credentials(body)?;
    let token = state.auth.login(req.email, req.password).await?;

    let cookie = session_cookie(
        &token,
        state.auth.token_ttl().as_secs(),
        state.config.secure_cookies,
    );
    Ok((
        AppendHeaders([(header::SET_COOKIE, cookie)]),
        ApiResponse::ok("Login successful", LoginResponse { token }),
    ))
}

pub async fn logout_handler(State(state): State<AppState>) -> impl IntoResponse {
    (
        AppendHeaders([(
            header::SET_COOKIE,
            clear_session_cookie(state.config.secure_cookies),
        )]),
        ApiResponse::message("Logged out successfully"),
    )
}
