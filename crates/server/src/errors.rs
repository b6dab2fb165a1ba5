use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use service::errors::ServiceError;
use thiserror::Error;
use tracing::warn;

/// Fixed body for unknown ids.
pub const USER_NOT_FOUND: &str = "User not found";

#[derive(Debug, Serialize)]
struct ErrorBody {
    detail: String,
}

/// Error returned by handlers, rendered as `{"detail": ...}`.
#[derive(Debug)]
pub struct JsonApiError {
    pub status: StatusCode,
    pub detail: String,
}

impl JsonApiError {
    pub fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self { status, detail: detail.into() }
    }

    pub fn unprocessable(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, detail)
    }
}

impl From<ServiceError> for JsonApiError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::NotFound(_) => Self::new(StatusCode::NOT_FOUND, USER_NOT_FOUND),
        }
    }
}

// 请求体/路径参数解析失败统一按 422 返回
impl From<JsonRejection> for JsonApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::unprocessable(rejection.body_text())
    }
}

impl From<PathRejection> for JsonApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::unprocessable(rejection.body_text())
    }
}

impl IntoResponse for JsonApiError {
    fn into_response(self) -> Response {
        if self.status == StatusCode::UNPROCESSABLE_ENTITY {
            warn!(detail = %self.detail, "rejected request");
        }
        (self.status, Json(ErrorBody { detail: self.detail })).into_response()
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("admin listener: {0}")]
    Admin(#[from] anyhow::Error),
    #[error("cannot bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),
}
