//! SQLite-backed user store

use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::{
    synthetic_external_id, ExternalProfile, NewStaffUser, StoreResult, UserId, UserRecord,
    UserStore,
};
use crate::error::AuthError;
use crate::roles::Role;

/// Current schema version
const SCHEMA_VERSION: i32 = 1;

/// SQLite-based user store
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create a SQLite database at the given path
    pub fn open(path: &str) -> Result<Self, AuthError> {
        Self::from_connection(Connection::open(path).map_err(internal)?)
    }

    /// Open an in-memory database, for tests
    pub fn open_in_memory() -> Result<Self, AuthError> {
        Self::from_connection(Connection::open_in_memory().map_err(internal)?)
    }

    fn from_connection(conn: Connection) -> Result<Self, AuthError> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .map_err(internal)?;
        Self::migrate(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn migrate(conn: &Connection) -> Result<(), AuthError> {
        let current_version = Self::get_schema_version(conn)?;

        if current_version < SCHEMA_VERSION {
            tracing::info!(
                current = current_version,
                target = SCHEMA_VERSION,
                "Running database migrations"
            );

            if current_version < 1 {
                Self::migrate_v1(conn)?;
            }

            conn.execute(
                "INSERT OR REPLACE INTO schema_version (version) VALUES (?1)",
                params![SCHEMA_VERSION],
            )
            .map_err(internal)?;

            tracing::info!("Database migrations complete");
        }

        Ok(())
    }

    fn get_schema_version(conn: &Connection) -> Result<i32, AuthError> {
        let table_exists: bool = conn
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
                [],
                |row| row.get(0),
            )
            .map_err(internal)?;

        if !table_exists {
            return Ok(0);
        }

        conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| {
            row.get::<_, Option<i32>>(0).map(|v| v.unwrap_or(0))
        })
        .map_err(internal)
    }

    /// Migration to version 1: initial schema
    fn migrate_v1(conn: &Connection) -> Result<(), AuthError> {
        conn.execute_batch(
            r#"
            -- Schema version tracking
            CREATE TABLE IF NOT EXISTS schema_version (
                version INTEGER PRIMARY KEY
            );

            -- User identity records
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                email TEXT NOT NULL UNIQUE,
                external_id TEXT UNIQUE,
                first_name TEXT NOT NULL,
                last_name TEXT NOT NULL,
                password_hash TEXT,
                role TEXT NOT NULL,
                reset_token_hash TEXT,
                reset_expires_at TEXT,
                password_reset_at TEXT,
                created_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_users_reset_hash ON users(reset_token_hash);
            "#,
        )
        .map_err(internal)?;

        Ok(())
    }

    fn get_where(&self, clause: &str, value: &str) -> StoreResult<Option<UserRecord>> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            &format!("SELECT {COLUMNS} FROM users WHERE {clause} = ?1"),
            params![value],
            row_to_user,
        )
        .optional()
        .map_err(internal)
    }
}

const COLUMNS: &str = "id, email, external_id, first_name, last_name, password_hash, role, \
                       reset_token_hash, reset_expires_at, password_reset_at, created_at";

fn internal<E: std::fmt::Display>(e: E) -> AuthError {
    AuthError::Internal(e.to_string())
}

fn parse_ts(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|s| {
        DateTime::parse_from_rfc3339(&s)
            .map(|d| d.with_timezone(&Utc))
            .map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    idx,
                    rusqlite::types::Type::Text,
                    Box::new(e),
                )
            })
    })
    .transpose()
}

fn row_to_user(row: &Row<'_>) -> rusqlite::Result<UserRecord> {
    let id: String = row.get(0)?;
    let id = Uuid::parse_str(&id).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })?;

    let role: String = row.get(6)?;
    let role = Role::from_str(&role).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            6,
            rusqlite::types::Type::Text,
            format!("unknown role: {role}").into(),
        )
    })?;

    Ok(UserRecord {
        id: UserId(id),
        email: row.get(1)?,
        external_id: row.get(2)?,
        first_name: row.get(3)?,
        last_name: row.get(4)?,
        password_hash: row.get(5)?,
        role,
        password_reset_token_hash: row.get(7)?,
        password_reset_expires_at: parse_ts(row, 8)?,
        password_reset_at: parse_ts(row, 9)?,
        created_at: parse_ts(row, 10)?.ok_or(rusqlite::Error::InvalidQuery)?,
    })
}

impl UserStore for SqliteStore {
    fn create_staff(&self, new: NewStaffUser) -> StoreResult<UserRecord> {
        let email = new.email.to_lowercase();
        let conn = self.conn.lock().unwrap();

        let exists: bool = conn
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM users WHERE email = ?1)",
                params![email],
                |row| row.get(0),
            )
            .map_err(internal)?;
        if exists {
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

        conn.execute(
            "INSERT INTO users (id, email, external_id, first_name, last_name, password_hash, role, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                record.id.to_string(),
                record.email,
                record.external_id,
                record.first_name,
                record.last_name,
                record.password_hash,
                record.role.as_str(),
                record.created_at.to_rfc3339(),
            ],
        )
        .map_err(internal)?;

        Ok(record)
    }

    fn upsert_external(&self, profile: ExternalProfile) -> StoreResult<UserRecord> {
        let email = profile.email.to_lowercase();

        let existing = self.get_by_external_id(&profile.external_id)?;

        // The email must stay unique on the update path too, not just on
        // create.
        if let Some(owner) = self.get_by_email(&email)? {
            if existing.as_ref().map(|u| u.id) != Some(owner.id) {
                return Err(AuthError::EmailAlreadyExists);
            }
        }

        if let Some(existing) = existing {
            let conn = self.conn.lock().unwrap();
            conn.execute(
                "UPDATE users SET email = ?1, first_name = ?2, last_name = ?3 WHERE id = ?4",
                params![
                    email,
                    profile.first_name,
                    profile.last_name,
                    existing.id.to_string()
                ],
            )
            .map_err(internal)?;
            drop(conn);
            return Ok(self.get(existing.id)?.ok_or_else(|| {
                AuthError::Internal("record vanished during upsert".to_string())
            })?);
        }

        let record = UserRecord {
            id: UserId(Uuid::new_v4()),
            email,
            external_id: Some(profile.external_id),
            first_name: profile.first_name,
            last_name: profile.last_name,
            password_hash: None,
            role: Role::Customer,
            password_reset_token_hash: None,
            password_reset_expires_at: None,
            password_reset_at: None,
            created_at: Utc::now(),
        };

        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO users (id, email, external_id, first_name, last_name, password_hash, role, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                record.id.to_string(),
                record.email,
                record.external_id,
                record.first_name,
                record.last_name,
                record.password_hash,
                record.role.as_str(),
                record.created_at.to_rfc3339(),
            ],
        )
        .map_err(internal)?;

        Ok(record)
    }

    fn remove_external(&self, external_id: &str) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "DELETE FROM users WHERE external_id = ?1",
            params![external_id],
        )
        .map_err(internal)?;
        Ok(())
    }

    fn get(&self, id: UserId) -> StoreResult<Option<UserRecord>> {
        self.get_where("id", &id.to_string())
    }

    fn get_by_email(&self, email: &str) -> StoreResult<Option<UserRecord>> {
        self.get_where("email", &email.to_lowercase())
    }

    fn get_by_external_id(&self, external_id: &str) -> StoreResult<Option<UserRecord>> {
        self.get_where("external_id", external_id)
    }

    fn set_password(&self, id: UserId, password_hash: &str) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();
        let updated = conn
            .execute(
                "UPDATE users SET password_hash = ?1 WHERE id = ?2",
                params![password_hash, id.to_string()],
            )
            .map_err(internal)?;
        if updated == 0 {
            return Err(AuthError::InvalidCredentials);
        }
        Ok(())
    }

    fn stage_password_reset(
        &self,
        id: UserId,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();
        let updated = conn
            .execute(
                "UPDATE users SET reset_token_hash = ?1, reset_expires_at = ?2 WHERE id = ?3",
                params![token_hash, expires_at.to_rfc3339(), id.to_string()],
            )
            .map_err(internal)?;
        if updated == 0 {
            return Err(AuthError::InvalidOrExpiredToken);
        }
        Ok(())
    }

    fn find_by_reset_hash(&self, token_hash: &str) -> StoreResult<Option<UserRecord>> {
        self.get_where("reset_token_hash", token_hash)
    }

    fn complete_password_reset(
        &self,
        id: UserId,
        password_hash: &str,
        reset_at: DateTime<Utc>,
    ) -> StoreResult<()> {
        // Single UPDATE: the password swap, token clearing, and audit stamp
        // land atomically.
        let conn = self.conn.lock().unwrap();
        let updated = conn
            .execute(
                "UPDATE users SET password_hash = ?1, reset_token_hash = NULL,
                 reset_expires_at = NULL, password_reset_at = ?2 WHERE id = ?3",
                params![password_hash, reset_at.to_rfc3339(), id.to_string()],
            )
            .map_err(internal)?;
        if updated == 0 {
            return Err(AuthError::InvalidOrExpiredToken);
        }
        Ok(())
    }
}
