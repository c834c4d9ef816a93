//! Password reset endpoints
//!
//! Reset tokens are single-use and short-lived: the store keeps only a
//! digest, a second forgot-password request supersedes the first (last write
//! wins), and a consumed token clears atomically with the password swap.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::crypto::{generate_secret, hash_password, hash_reset_token};
use crate::email::EmailSender;
use crate::error::AuthError;
use crate::external::ExternalIdentity;
use crate::state::AppState;
use crate::store::UserStore;

/// Reset tokens expire this long after issuance
pub const RESET_TOKEN_TTL_HOURS: i64 = 1;

/// The enumeration-resistant body returned for every forgot-password call
const FORGOT_MESSAGE: &str = "If an account exists for that address, a reset link has been sent.";

#[derive(Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Serialize)]
pub struct ForgotPasswordResponse {
    pub success: bool,
    pub message: &'static str,
}

/// POST /api/staff/forgot-password
///
/// Always answers with the identical generic body, whether or not the
/// address matches a staff account. Side effects only happen for staff-path
/// records, and even their failures are swallowed into logs so the response
/// cannot leak account existence.
pub async fn forgot_password<U, E, X>(
    State(state): State<Arc<AppState<U, E, X>>>,
    Json(req): Json<ForgotPasswordRequest>,
) -> Json<ForgotPasswordResponse>
where
    U: UserStore,
    E: EmailSender,
    X: ExternalIdentity,
{
    let email = req.email.trim().to_lowercase();

    match state.user_store.get_by_email(&email) {
        Ok(Some(user)) if user.is_staff() => {
            let raw_token = generate_secret();
            let token_hash = hash_reset_token(&raw_token);
            let expires_at = Utc::now() + Duration::hours(RESET_TOKEN_TTL_HOURS);

            if let Err(e) = state
                .user_store
                .stage_password_reset(user.id, &token_hash, expires_at)
            {
                tracing::error!(user = %user.id, "failed to stage password reset: {}", e);
            } else {
                let reset_url = format!(
                    "{}/staff/reset-password?token={}",
                    state.base_url, raw_token
                );
                if let Err(e) = state.email_sender.send_password_reset(&email, &reset_url) {
                    tracing::error!(user = %user.id, "failed to send reset email: {}", e);
                } else {
                    tracing::info!(user = %user.id, "password reset staged");
                }
            }
        }
        Ok(_) => {
            tracing::debug!("forgot-password for unknown or customer-path address");
        }
        Err(e) => {
            tracing::error!("forgot-password lookup failed: {}", e);
        }
    }

    Json(ForgotPasswordResponse {
        success: true,
        message: FORGOT_MESSAGE,
    })
}

#[derive(Deserialize)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub new_password: String,
}

#[derive(Serialize)]
pub struct ResetPasswordResponse {
    pub success: bool,
}

/// POST /api/staff/reset-password
///
/// The presented token is re-hashed and matched against the stored digest;
/// the stored expiry must be strictly in the future (a token is already
/// invalid at its exact expiry instant). Completion is a single atomic store
/// update: new password in, both token fields cleared, audit stamp set.
pub async fn reset_password<U, E, X>(
    State(state): State<Arc<AppState<U, E, X>>>,
    Json(req): Json<ResetPasswordRequest>,
) -> Result<Json<ResetPasswordResponse>, AuthError>
where
    U: UserStore,
    E: EmailSender,
    X: ExternalIdentity,
{
    super::validate_password(&req.new_password)?;

    let token_hash = hash_reset_token(&req.token);
    let user = state
        .user_store
        .find_by_reset_hash(&token_hash)?
        .ok_or(AuthError::InvalidOrExpiredToken)?;

    let expires_at = user
        .password_reset_expires_at
        .ok_or(AuthError::InvalidOrExpiredToken)?;
    if expires_at <= Utc::now() {
        return Err(AuthError::InvalidOrExpiredToken);
    }

    let new_hash =
        hash_password(&req.new_password).map_err(|e| AuthError::Internal(e.to_string()))?;
    state
        .user_store
        .complete_password_reset(user.id, &new_hash, Utc::now())?;

    tracing::info!(user = %user.id, "password reset completed");

    Ok(Json(ResetPasswordResponse { success: true }))
}
