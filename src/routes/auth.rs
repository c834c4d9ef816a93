//! Staff session endpoints: login, logout, who-am-I, change password

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use tower_cookies::cookie::SameSite;
use tower_cookies::{Cookie, Cookies};

use crate::crypto::{hash_password, verify_password};
use crate::email::EmailSender;
use crate::error::AuthError;
use crate::external::ExternalIdentity;
use crate::gate::SESSION_COOKIE;
use crate::roles::{Identity, Role};
use crate::state::AppState;
use crate::store::{UserId, UserStore};

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub success: bool,
    pub id: UserId,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    /// Landing page for the role, for post-login navigation
    pub home: String,
}

/// Staff credential check, shared by login and tested directly.
///
/// The error kinds are precise here; the response layer is what collapses
/// `PasswordNotConfigured` into the generic credentials message.
pub(crate) fn authenticate(
    store: &impl UserStore,
    email: &str,
    password: &str,
) -> Result<Identity, AuthError> {
    let normalized = email.trim().to_lowercase();
    let user = store
        .get_by_email(&normalized)?
        .ok_or(AuthError::InvalidCredentials)?;

    if !user.is_staff() {
        return Err(AuthError::StaffOnly);
    }

    let hash = user
        .password_hash
        .as_deref()
        .ok_or(AuthError::PasswordNotConfigured)?;

    let valid =
        verify_password(password, hash).map_err(|e| AuthError::Internal(e.to_string()))?;
    if !valid {
        return Err(AuthError::InvalidCredentials);
    }

    Ok(user.identity())
}

/// POST /api/staff/login
pub async fn login<U, E, X>(
    State(state): State<Arc<AppState<U, E, X>>>,
    cookies: Cookies,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AuthError>
where
    U: UserStore,
    E: EmailSender,
    X: ExternalIdentity,
{
    let identity = authenticate(&state.user_store, &req.email, &req.password)?;

    let token = state.tokens.issue(&identity)?;
    set_session_cookie(&cookies, &token, state.cookie_secure);

    tracing::info!(user = %identity.id, role = %identity.role, "staff login");

    Ok(Json(LoginResponse {
        success: true,
        id: identity.id,
        email: identity.email,
        first_name: identity.first_name,
        last_name: identity.last_name,
        role: identity.role,
        home: identity.role.home_path().to_string(),
    }))
}

#[derive(Serialize)]
pub struct LogoutResponse {
    pub success: bool,
}

/// POST /api/staff/logout
///
/// Clears the session cookie unconditionally; succeeds even when no session
/// existed. The token itself stays valid until its expiry elapses (stateless
/// sessions have no server-side revocation).
pub async fn logout(cookies: Cookies) -> Json<LogoutResponse> {
    clear_session_cookie(&cookies);
    Json(LogoutResponse { success: true })
}

#[derive(Serialize)]
pub struct SessionResponse {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity: Option<Identity>,
}

/// GET /api/staff/session
///
/// Missing, invalid, and expired tokens all answer `authenticated: false`;
/// the common unauthenticated case is never an error.
pub async fn current_session<U, E, X>(
    State(state): State<Arc<AppState<U, E, X>>>,
    cookies: Cookies,
) -> Json<SessionResponse>
where
    U: UserStore,
    E: EmailSender,
    X: ExternalIdentity,
{
    let identity = cookies
        .get(SESSION_COOKIE)
        .and_then(|c| state.tokens.verify(c.value()));

    Json(SessionResponse {
        authenticated: identity.is_some(),
        identity,
    })
}

#[derive(Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Serialize)]
pub struct ChangePasswordResponse {
    pub success: bool,
}

/// POST /api/staff/password
///
/// Settings-path password change for an authenticated staff session. Uses
/// the hierarchy guard (any staff role), not the gate's exact-match policy.
pub async fn change_password<U, E, X>(
    State(state): State<Arc<AppState<U, E, X>>>,
    cookies: Cookies,
    Json(req): Json<ChangePasswordRequest>,
) -> Result<Json<ChangePasswordResponse>, AuthError>
where
    U: UserStore,
    E: EmailSender,
    X: ExternalIdentity,
{
    let identity = cookies
        .get(SESSION_COOKIE)
        .and_then(|c| state.tokens.verify(c.value()))
        .ok_or(AuthError::Unauthenticated)?;
    identity.require_at_least(Role::Agent)?;

    super::validate_password(&req.new_password)?;

    let user = state
        .user_store
        .get(identity.id)?
        .ok_or(AuthError::Unauthenticated)?;
    let hash = user
        .password_hash
        .as_deref()
        .ok_or(AuthError::PasswordNotConfigured)?;

    let valid = verify_password(&req.current_password, hash)
        .map_err(|e| AuthError::Internal(e.to_string()))?;
    if !valid {
        return Err(AuthError::InvalidCredentials);
    }

    let new_hash =
        hash_password(&req.new_password).map_err(|e| AuthError::Internal(e.to_string()))?;
    state.user_store.set_password(user.id, &new_hash)?;

    tracing::info!(user = %user.id, "staff password changed");

    Ok(Json(ChangePasswordResponse { success: true }))
}

/// Set the staff session cookie
pub fn set_session_cookie(cookies: &Cookies, token: &str, secure: bool) {
    let cookie = Cookie::build((SESSION_COOKIE, token.to_string()))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .build();
    cookies.add(cookie);
}

/// Clear the staff session cookie
pub fn clear_session_cookie(cookies: &Cookies) {
    let cookie = Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .http_only(true)
        .max_age(tower_cookies::cookie::time::Duration::ZERO)
        .build();
    cookies.add(cookie);
}
