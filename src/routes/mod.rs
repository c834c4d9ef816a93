//! HTTP routes for the auth core

pub mod auth;
pub mod reset;
pub mod webhook;

use std::sync::Arc;

use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tower_cookies::CookieManagerLayer;

use crate::email::EmailSender;
use crate::error::AuthError;
use crate::external::ExternalIdentity;
use crate::gate;
use crate::state::AppState;
use crate::store::UserStore;

/// Minimum password length
pub(crate) const MIN_PASSWORD_LENGTH: usize = 8;
/// Maximum password length
pub(crate) const MAX_PASSWORD_LENGTH: usize = 80;

pub(crate) fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::PasswordTooShort);
    }
    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(AuthError::PasswordTooLong);
    }
    Ok(())
}

/// Create the router with all routes, the authorization gate, and cookie
/// support.
pub fn create_router<U, E, X>(state: Arc<AppState<U, E, X>>) -> Router
where
    U: UserStore + 'static,
    E: EmailSender + 'static,
    X: ExternalIdentity + 'static,
{
    Router::new()
        .route("/api/staff/login", post(auth::login))
        .route("/api/staff/logout", post(auth::logout))
        .route("/api/staff/session", get(auth::current_session))
        .route("/api/staff/password", post(auth::change_password))
        .route("/api/staff/forgot-password", post(reset::forgot_password))
        .route("/api/staff/reset-password", post(reset::reset_password))
        .route("/api/webhooks/identity", post(webhook::identity_event))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            gate::authorization_gate::<U, E, X>,
        ))
        .layer(CookieManagerLayer::new())
        .with_state(state)
}
