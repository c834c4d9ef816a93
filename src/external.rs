//! External identity adapter
//!
//! Customers authenticate with a hosted identity provider; this core never
//! re-implements that protocol. All it needs from the provider at request
//! time is "who is the current external subject, if any", resolved from the
//! provider's own session cookie. User provisioning arrives separately over
//! the webhook in [`crate::routes`].

use axum::http::HeaderMap;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;

use crate::gate::cookie_value;

/// Name of the provider's session cookie
pub const IDP_SESSION_COOKIE: &str = "idp_session";

/// Resolved provider subject id, attached to customer-path requests
#[derive(Debug, Clone)]
pub struct ExternalSubject(pub String);

/// Capability: resolve the current external subject from a request.
pub trait ExternalIdentity: Send + Sync {
    fn subject_from_headers(&self, headers: &HeaderMap) -> Option<String>;
}

/// Allow using Box<dyn ExternalIdentity> as an ExternalIdentity
impl ExternalIdentity for Box<dyn ExternalIdentity> {
    fn subject_from_headers(&self, headers: &HeaderMap) -> Option<String> {
        (**self).subject_from_headers(headers)
    }
}

/// Adapter for deployments without a configured provider: every request is
/// unauthenticated on the customer path.
pub struct DisabledExternalIdentity;

impl ExternalIdentity for DisabledExternalIdentity {
    fn subject_from_headers(&self, _headers: &HeaderMap) -> Option<String> {
        None
    }
}

#[derive(Deserialize)]
struct ProviderClaims {
    sub: String,
    #[allow(dead_code)]
    exp: i64,
}

/// Verifies the provider's HMAC-signed session cookie and extracts the
/// subject id. Signature and expiry checks only; profile data comes from the
/// provisioning webhook, not from the token.
pub struct ProviderSessionVerifier {
    decoding_key: DecodingKey,
}

impl ProviderSessionVerifier {
    pub fn new(secret: &str) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        }
    }
}

impl ExternalIdentity for ProviderSessionVerifier {
    fn subject_from_headers(&self, headers: &HeaderMap) -> Option<String> {
        let token = cookie_value(headers, IDP_SESSION_COOKIE)?;
        let validation = Validation::new(Algorithm::HS256);

        decode::<ProviderClaims>(&token, &self.decoding_key, &validation)
            .ok()
            .map(|data| data.claims.sub)
    }
}
