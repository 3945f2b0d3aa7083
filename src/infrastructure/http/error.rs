//! HTTP Error Handling

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::application::error::PlayerError;
use crate::infrastructure::memory::RegistryError;

/// 统一错误响应格式
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub errno: i32,
    pub error: String,
    pub data: Option<()>,
}

impl ErrorResponse {
    pub fn new(errno: i32, error: impl Into<String>) -> Self {
        Self {
            errno,
            error: error.into(),
            data: None,
        }
    }
}

/// 错误码定义
pub mod errno {
    pub const BAD_REQUEST: i32 = 400;
    pub const NOT_FOUND: i32 = 404;
    pub const GONE: i32 = 410;
    pub const INTERNAL_ERROR: i32 = 500;
    pub const SERVICE_UNAVAILABLE: i32 = 503;
}

/// API 错误
#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    Gone(String),
    Internal(String),
    ServiceUnavailable(String),
}

impl ApiError {
    fn errno(&self) -> i32 {
        match self {
            Self::NotFound(_) => errno::NOT_FOUND,
            Self::BadRequest(_) => errno::BAD_REQUEST,
            Self::Gone(_) => errno::GONE,
            Self::Internal(_) => errno::INTERNAL_ERROR,
            Self::ServiceUnavailable(_) => errno::SERVICE_UNAVAILABLE,
        }
    }

    fn message(&self) -> &str {
        match self {
            Self::NotFound(msg)
            | Self::BadRequest(msg)
            | Self::Gone(msg)
            | Self::Internal(msg)
            | Self::ServiceUnavailable(msg) => msg,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let errno = self.errno();
        let msg = self.message();

        // 业务错误统一返回 200，错误码放在 errno 中
        match &self {
            Self::Internal(_) | Self::ServiceUnavailable(_) => {
                tracing::error!(errno = errno, error = %msg, "Request failed")
            }
            _ => tracing::warn!(errno = errno, error = %msg, "Request rejected"),
        }

        (StatusCode::OK, Json(ErrorResponse::new(errno, msg))).into_response()
    }
}

impl From<RegistryError> for ApiError {
    fn from(e: RegistryError) -> Self {
        match e {
            RegistryError::NotFound(_) => ApiError::NotFound(e.to_string()),
            RegistryError::LimitReached(_) => ApiError::ServiceUnavailable(e.to_string()),
        }
    }
}

impl From<PlayerError> for ApiError {
    fn from(e: PlayerError) -> Self {
        match e {
            PlayerError::Closed => ApiError::Gone(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_mapping() {
        let err: ApiError = RegistryError::NotFound("p1".to_string()).into();
        assert_eq!(err.errno(), errno::NOT_FOUND);
        assert_eq!(err.message(), "Player not found: p1");

        let err: ApiError = RegistryError::LimitReached(8).into();
        assert_eq!(err.errno(), errno::SERVICE_UNAVAILABLE);

        let err: ApiError = PlayerError::Closed.into();
        assert_eq!(err.errno(), errno::GONE);
    }

    #[tokio::test]
    async fn test_error_response_envelope() {
        let response = ApiError::BadRequest("bad content id".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["errno"], 400);
        assert_eq!(json["error"], "bad content id");
        assert!(json["data"].is_null());
    }
}
