//! Closed error taxonomy for the HTTP surface
//!
//! Every handler boundary maps provider failures into one of these
//! variants before responding. The response body is always a structured
//! `{ "success": false, "message": ... }` with no internal state leaked.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::jwt::TokenError;

/// API error taxonomy
#[derive(Error, Debug)]
pub enum ApiError {
    /// Missing or malformed input
    #[error("{0}")]
    Validation(String),

    /// Missing/invalid/expired token or wrong password
    #[error("{0}")]
    Auth(String),

    /// Authenticated but the role is not permitted
    #[error("{0}")]
    Forbidden(String),

    /// Resource or session absent
    #[error("{0}")]
    NotFound(String),

    /// Duplicate email or similar uniqueness clash
    #[error("{0}")]
    Conflict(String),

    /// Unexpected store or provider failure
    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Auth(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Internal(ref e) = self {
            error!("Internal error: {:#}", e);
        }

        let status = self.status();
        let message = self.to_string();

        let body = Json(json!({
            "success": false,
            "message": message,
        }));

        (status, body).into_response()
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                ApiError::Conflict("Duplicate value entered".to_string())
            }
            sqlx::Error::RowNotFound => ApiError::NotFound("Resource not found".to_string()),
            other => ApiError::Internal(other.into()),
        }
    }
}

impl From<common::error::CacheError> for ApiError {
    fn from(e: common::error::CacheError) -> Self {
        ApiError::Internal(e.into())
    }
}

impl From<common::error::DatabaseError> for ApiError {
    fn from(e: common::error::DatabaseError) -> Self {
        ApiError::Internal(e.into())
    }
}

impl From<TokenError> for ApiError {
    fn from(e: TokenError) -> Self {
        match e {
            TokenError::InvalidOrExpiredTicket | TokenError::CodeMismatch => {
                ApiError::Validation(e.to_string())
            }
            TokenError::Invalid | TokenError::Expired => ApiError::Auth(e.to_string()),
        }
    }
}

/// Type alias for API results
pub type ApiResult<T> = Result<T, ApiError>;
