//! Data models for the user store

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::roles::{Identity, Role};

/// Stable internal user identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub Uuid);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A user identity record.
///
/// Exactly one identity path applies per record: customer-path users carry a
/// real provider `external_id` and no password hash; staff-path users carry a
/// local password hash and a synthetic `external_id` placeholder. The
/// placeholder exists only because the store requires `external_id` to be
/// unique when present; it is a storage workaround, not a business rule.
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: UserId,
    /// Unique, stored lower-cased. Normalized before every lookup and write.
    pub email: String,
    pub external_id: Option<String>,
    pub first_name: String,
    pub last_name: String,
    /// Present only for staff-path users.
    pub password_hash: Option<String>,
    pub role: Role,
    /// Set and cleared together with `password_reset_expires_at`.
    pub password_reset_token_hash: Option<String>,
    pub password_reset_expires_at: Option<DateTime<Utc>>,
    /// Audit stamp of the last successful reset.
    pub password_reset_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl UserRecord {
    pub fn is_staff(&self) -> bool {
        self.role.is_staff()
    }

    pub fn identity(&self) -> Identity {
        Identity {
            id: self.id,
            email: self.email.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            role: self.role,
        }
    }
}

/// Fields for creating a staff-path user
#[derive(Debug, Clone)]
pub struct NewStaffUser {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub password_hash: Option<String>,
}

/// Profile pushed by the external identity provider for customer-path users
#[derive(Debug, Clone)]
pub struct ExternalProfile {
    pub external_id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

/// Synthetic unique `external_id` placeholder for staff records
pub fn synthetic_external_id() -> String {
    format!("staff:{}", Uuid::new_v4())
}
