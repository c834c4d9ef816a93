//! In-memory user store

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{
    synthetic_external_id, ExternalProfile, NewStaffUser, StoreResult, UserId, UserRecord,
    UserStore,
};
use crate::error::AuthError;

/// In-memory user store, for development and tests
pub struct InMemoryUserStore {
    users: RwLock<HashMap<UserId, UserRecord>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryUserStore {
    fn default() -> Self {
        Self::new()
    }
}

impl UserStore for InMemoryUserStore {
    fn create_staff(&self, new: NewStaffUser) -> StoreResult<UserRecord> {
        let email = new.email.to_lowercase();
        let mut users = self.users.write().unwrap();
        if users.values().any(|u| u.email == email) {
            return Err(AuthError::EmailAlreadyExists);
        }

        let record = UserRecord {
            id: UserId(Uuid::new_v4()),
            email,
            external_id: Some(synthetic_external_id()),
            first_name: new.first_name,
            last_name: new.last_name,
            password_hash: new.password_hash,
            role: new.role,
            password_reset_token_hash: None,
            password_reset_expires_at: None,
            password_reset_at: None,
            created_at: Utc::now(),
        };
        users.insert(record.id, record.clone());
        Ok(record)
    }

    fn upsert_external(&self, profile: ExternalProfile) -> StoreResult<UserRecord> {
        let email = profile.email.to_lowercase();
        let mut users = self.users.write().unwrap();

        let existing_id = users
            .values()
            .find(|u| u.external_id.as_deref() == Some(profile.external_id.as_str()))
            .map(|u| u.id);

        // The email must stay unique on the update path too, not just on
        // create.
        if users
            .values()
            .any(|u| u.email == email && Some(u.id) != existing_id)
        {
            return Err(AuthError::EmailAlreadyExists);
        }

        if let Some(id) = existing_id {
            let existing = users.get_mut(&id).ok_or_else(|| {
                AuthError::Internal("record vanished during upsert".to_string())
            })?;
            existing.email = email;
            existing.first_name = profile.first_name;
            existing.last_name = profile.last_name;
            return Ok(existing.clone());
        }

        let record = UserRecord {
            id: UserId(Uuid::new_v4()),
            email,
            external_id: Some(profile.external_id),
            first_name: profile.first_name,
            last_name: profile.last_name,
            password_hash: None,
            role: crate::roles::Role::Customer,
            password_reset_token_hash: None,
            password_reset_expires_at: None,
            password_reset_at: None,
            created_at: Utc::now(),
        };
        users.insert(record.id, record.clone());
        Ok(record)
    }

    fn remove_external(&self, external_id: &str) -> StoreResult<()> {
        self.users
            .write()
            .unwrap()
            .retain(|_, u| u.external_id.as_deref() != Some(external_id));
        Ok(())
    }

    fn get(&self, id: UserId) -> StoreResult<Option<UserRecord>> {
        Ok(self.users.read().unwrap().get(&id).cloned())
    }

    fn get_by_email(&self, email: &str) -> StoreResult<Option<UserRecord>> {
        let normalized = email.to_lowercase();
        Ok(self
            .users
            .read()
            .unwrap()
            .values()
            .find(|u| u.email == normalized)
            .cloned())
    }

    fn get_by_external_id(&self, external_id: &str) -> StoreResult<Option<UserRecord>> {
        Ok(self
            .users
            .read()
            .unwrap()
            .values()
            .find(|u| u.external_id.as_deref() == Some(external_id))
            .cloned())
    }

    fn set_password(&self, id: UserId, password_hash: &str) -> StoreResult<()> {
        let mut users = self.users.write().unwrap();
        let user = users.get_mut(&id).ok_or(AuthError::InvalidCredentials)?;
        user.password_hash = Some(password_hash.to_string());
        Ok(())
    }

    fn stage_password_reset(
        &self,
        id: UserId,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> StoreResult<()> {
        let mut users = self.users.write().unwrap();
        let user = users.get_mut(&id).ok_or(AuthError::InvalidOrExpiredToken)?;
        user.password_reset_token_hash = Some(token_hash.to_string());
        user.password_reset_expires_at = Some(expires_at);
        Ok(())
    }

    fn find_by_reset_hash(&self, token_hash: &str) -> StoreResult<Option<UserRecord>> {
        Ok(self
            .users
            .read()
            .unwrap()
            .values()
            .find(|u| u.password_reset_token_hash.as_deref() == Some(token_hash))
            .cloned())
    }

    fn complete_password_reset(
        &self,
        id: UserId,
        password_hash: &str,
        reset_at: DateTime<Utc>,
    ) -> StoreResult<()> {
        // Single write-lock scope keeps the password swap and token clearing
        // atomic with respect to concurrent lookups.
        let mut users = self.users.write().unwrap();
        let user = users.get_mut(&id).ok_or(AuthError::InvalidOrExpiredToken)?;
        user.password_hash = Some(password_hash.to_string());
        user.password_reset_token_hash = None;
        user.password_reset_expires_at = None;
        user.password_reset_at = Some(reset_at);
        Ok(())
    }
}
