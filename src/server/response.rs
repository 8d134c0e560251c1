use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;

use crate::service::Cached;

/// Appended to the message of any response served from the cache
pub const CACHED_SUFFIX: &str = " (cached)";

/// Body shape shared by every JSON response
#[derive(Debug, Serialize)]
pub struct Envelope<T: Serialize> {
    pub success: bool,
    pub message: String,
    pub data: Option<T>,
}

/// Successful response: status plus `{success, message, data}` body
pub struct ApiResponse<T: Serialize> {
    pub status: StatusCode,
    pub message: String,
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            status: StatusCode::OK,
            message: message.into(),
            data: Some(data),
        }
    }

    pub fn created(message: impl Into<String>, data: T) -> Self {
        Self {
            status: StatusCode::CREATED,
            message: message.into(),
            data: Some(data),
        }
    }

    /// 200 response whose message carries the cache marker on a hit
    pub fn cached(message: impl Into<String>, cached: Cached<T>) -> Self {
        let mut message = message.into();
        if cached.from_cache {
            message.push_str(CACHED_SUFFIX);
        }
        Self::ok(message, cached.value)
    }
}

impl ApiResponse<()> {
    /// 200 response with `data: null`
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::OK,
            message: message.into(),
            data: None,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let body = Envelope {
            success: true,
            message: self.message,
            data: self.data,
        };
        (self.status, Json(body)).into_response()
    }
}
