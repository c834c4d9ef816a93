//! Provisioning webhook for the external identity provider
//!
//! The provider pushes user lifecycle events here so customer-path records
//! exist locally before their first request. Calls are authenticated with a
//! shared secret header; deployments without a configured secret reject all
//! deliveries (fail closed).

use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::email::EmailSender;
use crate::error::AuthError;
use crate::external::ExternalIdentity;
use crate::state::AppState;
use crate::store::{ExternalProfile, UserStore};

/// Header carrying the shared webhook secret
pub const WEBHOOK_SECRET_HEADER: &str = "x-webhook-secret";

#[derive(Deserialize)]
pub struct IdentityEvent {
    #[serde(rename = "type")]
    pub kind: String,
    pub data: IdentityEventData,
}

#[derive(Deserialize)]
pub struct IdentityEventData {
    /// Provider subject id
    pub id: String,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

#[derive(Serialize)]
pub struct WebhookResponse {
    pub success: bool,
}

/// POST /api/webhooks/identity
pub async fn identity_event<U, E, X>(
    State(state): State<Arc<AppState<U, E, X>>>,
    headers: HeaderMap,
    Json(event): Json<IdentityEvent>,
) -> Result<Json<WebhookResponse>, AuthError>
where
    U: UserStore,
    E: EmailSender,
    X: ExternalIdentity,
{
    let expected = state
        .webhook_secret
        .as_deref()
        .ok_or(AuthError::Unauthenticated)?;
    let presented = headers
        .get(WEBHOOK_SECRET_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::Unauthenticated)?;
    if presented != expected {
        return Err(AuthError::Unauthenticated);
    }

    match event.kind.as_str() {
        "user.created" | "user.updated" => {
            let email = event
                .data
                .email
                .ok_or_else(|| AuthError::ValidationError("missing email".to_string()))?;
            let profile = ExternalProfile {
                external_id: event.data.id,
                email,
                first_name: event.data.first_name.unwrap_or_default(),
                last_name: event.data.last_name.unwrap_or_default(),
            };
            let user = state.user_store.upsert_external(profile)?;
            tracing::info!(user = %user.id, external = ?user.external_id, "customer record provisioned");
        }
        "user.deleted" => {
            state.user_store.remove_external(&event.data.id)?;
            tracing::info!(external = %event.data.id, "customer record removed");
        }
        other => {
            // Providers deliver many event types; unhandled ones are
            // acknowledged so they are not retried forever.
            tracing::debug!(kind = %other, "ignoring identity event");
        }
    }

    Ok(Json(WebhookResponse { success: true }))
}
