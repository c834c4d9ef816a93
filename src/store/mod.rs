//! User-record storage abstractions

pub mod memory;
pub mod models;
pub mod sqlite;

pub use memory::InMemoryUserStore;
pub use models::*;
pub use sqlite::SqliteStore;

use chrono::{DateTime, Utc};

use crate::error::AuthError;

/// Result type for store operations
pub type StoreResult<T> = Result<T, AuthError>;

/// Persistent user-record store.
///
/// The auth core reads and writes only the fields it owns: credentials,
/// role, and reset-token state. Everything else about a user belongs to the
/// data layer.
pub trait UserStore: Send + Sync {
    /// Create a staff-path user. Assigns a synthetic unique `external_id`.
    fn create_staff(&self, new: NewStaffUser) -> StoreResult<UserRecord>;

    /// Create or update a customer-path user keyed by `external_id`.
    /// Rejects with [`AuthError::EmailAlreadyExists`] if the email belongs
    /// to a different record, on both the create and update paths.
    fn upsert_external(&self, profile: ExternalProfile) -> StoreResult<UserRecord>;

    /// Remove a customer-path user by `external_id`. Idempotent.
    fn remove_external(&self, external_id: &str) -> StoreResult<()>;

    /// Get a user by id
    fn get(&self, id: UserId) -> StoreResult<Option<UserRecord>>;

    /// Get a user by email (caller passes a normalized, lower-cased email)
    fn get_by_email(&self, email: &str) -> StoreResult<Option<UserRecord>>;

    /// Get a user by provider subject id
    fn get_by_external_id(&self, external_id: &str) -> StoreResult<Option<UserRecord>>;

    /// Replace a user's password hash
    fn set_password(&self, id: UserId, password_hash: &str) -> StoreResult<()>;

    /// Stage a password reset: store the token digest and its expiry.
    /// Overwrites any previous pending reset (last write wins).
    fn stage_password_reset(
        &self,
        id: UserId,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> StoreResult<()>;

    /// Find the user whose pending reset-token digest matches
    fn find_by_reset_hash(&self, token_hash: &str) -> StoreResult<Option<UserRecord>>;

    /// Consume a pending reset in one atomic update: store the new password
    /// hash, clear both reset-token fields, and record the reset timestamp.
    fn complete_password_reset(
        &self,
        id: UserId,
        password_hash: &str,
        reset_at: DateTime<Utc>,
    ) -> StoreResult<()>;
}

impl<T: UserStore + ?Sized> UserStore for Box<T> {
    fn create_staff(&self, new: NewStaffUser) -> StoreResult<UserRecord> {
        (**self).create_staff(new)
    }

    fn upsert_external(&self, profile: ExternalProfile) -> StoreResult<UserRecord> {
        (**self).upsert_external(profile)
    }

    fn remove_external(&self, external_id: &str) -> StoreResult<()> {
        (**self).remove_external(external_id)
    }

    fn get(&self, id: UserId) -> StoreResult<Option<UserRecord>> {
        (**self).get(id)
    }

    fn get_by_email(&self, email: &str) -> StoreResult<Option<UserRecord>> {
        (**self).get_by_email(email)
    }

    fn get_by_external_id(&self, external_id: &str) -> StoreResult<Option<UserRecord>> {
        (**self).get_by_external_id(external_id)
    }

    fn set_password(&self, id: UserId, password_hash: &str) -> StoreResult<()> {
        (**self).set_password(id, password_hash)
    }

    fn stage_password_reset(
        &self,
        id: UserId,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> StoreResult<()> {
        (**self).stage_password_reset(id, token_hash, expires_at)
    }

    fn find_by_reset_hash(&self, token_hash: &str) -> StoreResult<Option<UserRecord>> {
        (**self).find_by_reset_hash(token_hash)
    }

    fn complete_password_reset(
        &self,
        id: UserId,
        password_hash: &str,
        reset_at: DateTime<Utc>,
    ) -> StoreResult<()> {
        (**self).complete_password_reset(id, password_hash, reset_at)
    }
}

impl<T: UserStore + ?Sized> UserStore for std::sync::Arc<T> {
    fn create_staff(&self, new: NewStaffUser) -> StoreResult<UserRecord> {
        (**self).create_staff(new)
    }

    fn upsert_external(&self, profile: ExternalProfile) -> StoreResult<UserRecord> {
        (**self).upsert_external(profile)
    }

    fn remove_external(&self, external_id: &str) -> StoreResult<()> {
        (**self).remove_external(external_id)
    }

    fn get(&self, id: UserId) -> StoreResult<Option<UserRecord>> {
        (**self).get(id)
    }

    fn get_by_email(&self, email: &str) -> StoreResult<Option<UserRecord>> {
        (**self).get_by_email(email)
    }

    fn get_by_external_id(&self, external_id: &str) -> StoreResult<Option<UserRecord>> {
        (**self).get_by_external_id(external_id)
    }

    fn set_password(&self, id: UserId, password_hash: &str) -> StoreResult<()> {
        (**self).set_password(id, password_hash)
    }

    fn stage_password_reset(
        &self,
        id: UserId,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> StoreResult<()> {
        (**self).stage_password_reset(id, token_hash, expires_at)
    }

    fn find_by_reset_hash(&self, token_hash: &str) -> StoreResult<Option<UserRecord>> {
        (**self).find_by_reset_hash(token_hash)
    }

    fn complete_password_reset(
        &self,
        id: UserId,
        password_hash: &str,
        reset_at: DateTime<Utc>,
    ) -> StoreResult<()> {
        (**self).complete_password_reset(id, password_hash, reset_at)
    }
}
