//! Error types for the auth core

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// A customer-path account attempted the staff login.
    #[error("Staff sign-in only")]
    StaffOnly,

    /// A staff record exists but carries no local password hash.
    #[error("Password not configured")]
    PasswordNotConfigured,

    #[error("Not authenticated")]
    Unauthenticated,

    /// Identity present but role insufficient.
    #[error("Not allowed")]
    Forbidden,

    #[error("Invalid or expired reset token")]
    InvalidOrExpiredToken,

    #[error("Password too short (minimum 8 characters)")]
    PasswordTooShort,

    #[error("Password too long (maximum 80 characters)")]
    PasswordTooLong,

    #[error("Email already exists")]
    EmailAlreadyExists,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            // InvalidCredentials and PasswordNotConfigured deliberately share
            // one body so callers cannot distinguish which case occurred.
            AuthError::InvalidCredentials | AuthError::PasswordNotConfigured => {
                (StatusCode::UNAUTHORIZED, "Invalid email or password")
            }
            // Intentionally distinguishable: customer-path users get told to
            // use the customer sign-in instead of a dead-end generic error.
            AuthError::StaffOnly => (
                StatusCode::UNAUTHORIZED,
                "This sign-in is for staff accounts only",
            ),
            AuthError::Unauthenticated => (StatusCode::UNAUTHORIZED, "Not authenticated"),
            AuthError::Forbidden => (StatusCode::FORBIDDEN, "Not allowed"),
            AuthError::InvalidOrExpiredToken => {
                (StatusCode::BAD_REQUEST, "Invalid or expired reset token")
            }
            AuthError::PasswordTooShort => {
                (StatusCode::BAD_REQUEST, "Password too short (minimum 8 characters)")
            }
            AuthError::PasswordTooLong => {
                (StatusCode::BAD_REQUEST, "Password too long (maximum 80 characters)")
            }
            AuthError::EmailAlreadyExists => (StatusCode::CONFLICT, "Email already exists"),
            AuthError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg.as_str()),
            AuthError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        let body = json!({ "success": false, "reason": message });
        (status, axum::Json(body)).into_response()
    }
}
