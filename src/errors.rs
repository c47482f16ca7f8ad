use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    InvalidPath(String),
    #[error("not found")]
    NotFound,
    #[error("invalid json")]
    InvalidJson,
    #[error("file is not valid utf-8")]
    InvalidEncoding,
    #[error("request too large")]
    RequestTooLarge,
    #[error("invalid query")]
    InvalidQuery,
    /// The OS message is logged, never sent to the client.
    #[error("internal error")]
    Io(std::io::Error),
}

impl AppError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        AppError::InvalidPath(msg.into())
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::InvalidPath(_) => "InvalidPath",
            AppError::NotFound => "NotFound",
            AppError::InvalidJson => "InvalidJson",
            AppError::InvalidEncoding => "InvalidEncoding",
            AppError::RequestTooLarge => "RequestTooLarge",
            AppError::InvalidQuery => "InvalidQuery",
            AppError::Io(_) => "Internal",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidPath(_)
            | AppError::InvalidJson
            | AppError::InvalidEncoding
            | AppError::InvalidQuery => StatusCode::BAD_REQUEST,
            AppError::RequestTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Missing files become `NotFound`, as do paths that run through a regular
/// file (`a.md/x.md`). Everything else stays an I/O failure.
impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        match e.kind() {
            std::io::ErrorKind::NotFound | std::io::ErrorKind::NotADirectory => AppError::NotFound,
            _ => AppError::Io(e),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
