use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::{error, warn};

use crate::response::ApiResponse;

/// Failure kinds surfaced by services and mapped to HTTP at the boundary.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("Email already registered.")]
    DuplicateIdentity,

    #[error("User not found.")]
    UserNotFound,

    #[error("Invalid email or password.")]
    InvalidCredentials,

    #[error("Invalid token.")]
    InvalidToken,

    #[error("Token has expired.")]
    ExpiredToken,

    #[error("Unauthorized")]
    AccessDenied,

    #[error("{0}")]
    NotFound(String),

    #[error("An unexpected error occurred.")]
    Unexpected(anyhow::Error),
}

/// Errors raised by the persistence layer.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl StoreError {
    /// Postgres reports unique violations as SQLSTATE 23505.
    pub fn from_sqlx(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &e {
            if db.code().as_deref() == Some("23505") {
                return StoreError::UniqueViolation(db.constraint().unwrap_or("unknown").to_string());
            }
        }
        StoreError::Database(e)
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::UniqueViolation(_) => AppError::DuplicateIdentity,
            other => AppError::Unexpected(other.into()),
        }
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::InvalidToken | AppError::ExpiredToken => {
                StatusCode::BAD_REQUEST
            }
            AppError::DuplicateIdentity => StatusCode::CONFLICT,
            AppError::UserNotFound | AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AppError::AccessDenied => StatusCode::FORBIDDEN,
            AppError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            AppError::Unexpected(cause) => error!(error = ?cause, "unexpected error"),
            other => warn!(%status, error = %other, "request rejected"),
        }
        let body = ApiResponse::<()>::message(status, self.to_string());
        (status, body).into_response()
    }
}
