//! Application error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::content::UnknownContentType;
use crate::criteria::CriteriaError;

/// Errors raised by content handlers and stores.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// Malformed criteria, passed through unchanged.
    #[error(transparent)]
    Criteria(#[from] CriteriaError),

    #[error(transparent)]
    UnknownContentType(#[from] UnknownContentType),

    #[error("database error")]
    Database(#[from] sqlx::Error),

    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl HandlerError {
    /// The criteria error behind this failure, if any.
    pub fn as_criteria(&self) -> Option<&CriteriaError> {
        match self {
            HandlerError::Criteria(e) => Some(e),
            _ => None,
        }
    }
}

/// Result type alias using HandlerError.
pub type HandlerResult<T> = Result<T, HandlerError>;

/// Application errors.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("internal server error")]
    Internal(#[from] anyhow::Error),

    #[error("not found")]
    NotFound,

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("database error")]
    Database(#[from] sqlx::Error),
}

impl From<HandlerError> for AppError {
    fn from(err: HandlerError) -> Self {
        match err {
            HandlerError::Criteria(e) => AppError::BadRequest(e.to_string()),
            // A stored row with a bad type is a server-side fault.
            HandlerError::UnknownContentType(e) => AppError::Internal(e.into()),
            HandlerError::Database(e) => AppError::Database(e),
            HandlerError::Internal(e) => AppError::Internal(e),
        }
    }
}

impl From<CriteriaError> for AppError {
    fn from(err: CriteriaError) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        // Internal details go to the log, not the client.
        let body = match &self {
            AppError::Internal(e) => {
                tracing::error!(error = %e, "internal server error");
                "internal server error".to_string()
            }
            AppError::Database(e) => {
                tracing::error!(error = %e, "database error");
                "internal server error".to_string()
            }
            _ => self.to_string(),
        };

        (status, body).into_response()
    }
}

/// Result type alias using AppError.
pub type AppResult<T> = Result<T, AppError>;
