//! Authorization gate
//!
//! The single enforcement point executed before any route handler. Each
//! request is classified by URL prefix into one of three route classes, the
//! matching identity source is consulted, and the request is allowed,
//! redirected, or rejected. Every outgoing response, redirects included,
//! receives the security header set.
//!
//! Staff prefixes require the prefix's role exactly. This is deliberately
//! stricter than the procedure-level hierarchy in [`crate::roles`]: an admin
//! requesting an agent page is redirected to the staff login just like an
//! agent requesting an admin page. Do not collapse the two policies.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use serde_json::json;

use crate::email::EmailSender;
use crate::external::{ExternalIdentity, ExternalSubject};
use crate::roles::{Role, CUSTOMER_PREFIX, STAFF_PREFIXES};
use crate::state::AppState;
use crate::store::UserStore;
use crate::token::TokenCodec;

/// Name of the staff session cookie
pub const SESSION_COOKIE: &str = "covergate_session";

/// Staff login page; unauthenticated staff requests redirect here
pub const STAFF_LOGIN_PATH: &str = "/staff/login";

/// Hosted-provider sign-in page for the customer path
pub const CUSTOMER_SIGNIN_PATH: &str = "/sign-in";

/// Route classes enforced by the gate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    /// Requires a staff session with exactly this role
    Staff(Role),
    /// Requires an external-provider identity
    Customer,
    /// No identity required
    Open,
}

/// Read a cookie value straight off a request's headers.
///
/// The gate parses the Cookie header itself rather than relying on a
/// request-lifecycle extractor, so session resolution also works for
/// callers holding a bare header map.
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    let raw = headers.get(header::COOKIE)?.to_str().ok()?;
    raw.split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
}

/// Resolve the staff session carried by a request's headers, if any.
pub fn session_from_headers(
    headers: &HeaderMap,
    tokens: &TokenCodec,
) -> Option<crate::roles::Identity> {
    let token = cookie_value(headers, SESSION_COOKIE)?;
    tokens.verify(&token)
}

fn prefix_matches(path: &str, prefix: &str) -> bool {
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

/// Strip a leading `/api` segment so `/api/admin/...` classifies like
/// `/admin/...`.
fn page_path(path: &str) -> &str {
    match path.strip_prefix("/api") {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => rest,
        _ => path,
    }
}

/// Whether the path belongs to the API surface (JSON errors, narrower
/// security headers) rather than the page surface (redirects).
pub fn is_api_path(path: &str) -> bool {
    prefix_matches(path, "/api")
}

/// Classify a request path into its route class.
pub fn classify(path: &str) -> RouteClass {
    let page = page_path(path);

    for (prefix, role) in STAFF_PREFIXES {
        if prefix_matches(page, prefix) {
            return RouteClass::Staff(role);
        }
    }

    if prefix_matches(page, CUSTOMER_PREFIX) {
        return RouteClass::Customer;
    }

    RouteClass::Open
}

/// Gate middleware. Runs before every handler; see module docs.
pub async fn authorization_gate<U, E, X>(
    State(state): State<Arc<AppState<U, E, X>>>,
    mut request: Request,
    next: Next,
) -> Response
where
    U: UserStore,
    E: EmailSender,
    X: ExternalIdentity,
{
    let path = request.uri().path().to_string();
    let is_api = is_api_path(&path);

    let response = match classify(&path) {
        RouteClass::Open => next.run(request).await,

        RouteClass::Staff(required) => {
            match session_from_headers(request.headers(), &state.tokens) {
                None => staff_denied(&request, is_api, StatusCode::UNAUTHORIZED),
                Some(identity) if identity.role != required => {
                    tracing::debug!(
                        role = %identity.role,
                        required = %required,
                        path = %path,
                        "staff role mismatch at gate"
                    );
                    staff_denied(&request, is_api, StatusCode::FORBIDDEN)
                }
                Some(identity) => {
                    request.extensions_mut().insert(identity);
                    next.run(request).await
                }
            }
        }

        RouteClass::Customer => match state.external.subject_from_headers(request.headers()) {
            None => customer_denied(is_api),
            Some(subject) => {
                request.extensions_mut().insert(ExternalSubject(subject));
                next.run(request).await
            }
        },
    };

    apply_security_headers(response, is_api)
}

/// Deny a staff-protected request. Pages redirect to the staff login with
/// the original URL preserved; role mismatches get the same redirect rather
/// than a dead-end 403 page. API paths get structured JSON.
fn staff_denied(request: &Request, is_api: bool, status: StatusCode) -> Response {
    if is_api {
        let reason = match status {
            StatusCode::FORBIDDEN => "Not allowed",
            _ => "Not authenticated",
        };
        return (status, axum::Json(json!({ "success": false, "reason": reason })))
            .into_response();
    }

    let original = request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    let target = format!(
        "{}?redirect_to={}",
        STAFF_LOGIN_PATH,
        urlencoding::encode(original)
    );
    Redirect::to(&target).into_response()
}

fn customer_denied(is_api: bool) -> Response {
    if is_api {
        return (
            StatusCode::UNAUTHORIZED,
            axum::Json(json!({ "success": false, "reason": "Not authenticated" })),
        )
            .into_response();
    }
    Redirect::to(CUSTOMER_SIGNIN_PATH).into_response()
}

/// Attach the security header set to an outgoing response.
///
/// Pages get the full browser-facing set; API sub-paths get the narrower
/// set since there is no document to police.
fn apply_security_headers(mut response: Response, is_api: bool) -> Response {
    let headers = response.headers_mut();

    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );

    if is_api {
        headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    } else {
        headers.insert(
            header::CONTENT_SECURITY_POLICY,
            HeaderValue::from_static("default-src 'self'; frame-ancestors 'none'"),
        );
        headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
        headers.insert(
            header::REFERRER_POLICY,
            HeaderValue::from_static("strict-origin-when-cross-origin"),
        );
    }

    response
}
