//! Session token codec
//!
//! Staff sessions are stateless: a signed, time-limited token carries the
//! identity and role, and validity is determined solely by signature and
//! expiry at verification time. Nothing is stored server-side, which means a
//! token cannot be revoked before its absolute expiry elapses; logout only
//! removes the client's cookie. The session TTL bounds that exposure window.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AuthError;
use crate::roles::{Identity, Role};
use crate::store::UserId;

/// Claims embedded in a staff session token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// User id
    pub sub: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    /// Issued-at timestamp
    pub iat: i64,
    /// Absolute expiry timestamp
    pub exp: i64,
    /// Issuer
    pub iss: String,
}

/// Issues and verifies signed staff session tokens
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    ttl: Duration,
}

impl TokenCodec {
    pub fn new(secret: &str, issuer: impl Into<String>, ttl_hours: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            issuer: issuer.into(),
            ttl: Duration::hours(ttl_hours),
        }
    }

    /// Issue a token for an identity, expiring after the configured TTL.
    pub fn issue(&self, identity: &Identity) -> Result<String, AuthError> {
        self.issue_expiring_at(identity, Utc::now() + self.ttl)
    }

    /// Issue a token with an explicit absolute expiry instant.
    pub fn issue_expiring_at(
        &self,
        identity: &Identity,
        expires_at: DateTime<Utc>,
    ) -> Result<String, AuthError> {
        let claims = SessionClaims {
            sub: identity.id.0,
            email: identity.email.clone(),
            first_name: identity.first_name.clone(),
            last_name: identity.last_name.clone(),
            role: identity.role,
            iat: Utc::now().timestamp(),
            exp: expires_at.timestamp(),
            iss: self.issuer.clone(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Internal(e.to_string()))
    }

    /// Verify a token against the current instant.
    ///
    /// Missing, malformed, tampered, and expired tokens all come back as
    /// `None`: callers treat that as "unauthenticated", never as an error.
    pub fn verify(&self, token: &str) -> Option<Identity> {
        self.verify_at(token, Utc::now())
    }

    /// Verify a token at an explicit instant.
    ///
    /// Expiry is inclusive: a check performed at exactly the expiry instant
    /// treats the token as expired. The library's own exp check is disabled
    /// because its leeway would blur that boundary.
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Option<Identity> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.set_issuer(&[&self.issuer]);

        let claims = decode::<SessionClaims>(token, &self.decoding_key, &validation)
            .ok()?
            .claims;

        if claims.exp <= now.timestamp() {
            return None;
        }

        Some(Identity {
            id: UserId(claims.sub),
            email: claims.email,
            first_name: claims.first_name,
            last_name: claims.last_name,
            role: claims.role,
        })
    }
}
