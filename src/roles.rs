//! Role model, hierarchy policy, and resolved identities
//!
//! Two authorization strengths coexist on purpose. The route gate
//! ([`crate::gate`]) matches the role for a staff prefix exactly, so an admin
//! is bounced off agent-only pages just like an agent is bounced off admin
//! pages. Backend procedures use the weaker [`Role::at_least`] hierarchy
//! check. Collapsing the two would change behavior in one direction or the
//! other, so they stay separate policies.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::AuthError;
use crate::store::UserId;

/// Portal roles, ordered from least to most privileged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Customer,
    Agent,
    Underwriter,
    Admin,
}

/// Staff route prefixes and the role each one requires, exactly.
pub const STAFF_PREFIXES: [(&str, Role); 3] = [
    ("/admin", Role::Admin),
    ("/underwriter", Role::Underwriter),
    ("/agent", Role::Agent),
];

/// The single customer-protected prefix.
pub const CUSTOMER_PREFIX: &str = "/portal";

impl Role {
    /// Position in the total order CUSTOMER < AGENT < UNDERWRITER < ADMIN.
    pub fn rank(self) -> u8 {
        match self {
            Role::Customer => 1,
            Role::Agent => 2,
            Role::Underwriter => 3,
            Role::Admin => 4,
        }
    }

    /// Hierarchy check used by procedure-level guards: a procedure requiring
    /// AGENT accepts AGENT, UNDERWRITER, and ADMIN.
    pub fn at_least(self, required: Role) -> bool {
        self.rank() >= required.rank()
    }

    /// Whether this role authenticates through the staff path.
    pub fn is_staff(self) -> bool {
        self != Role::Customer
    }

    /// Landing page for this role, used for post-login navigation.
    pub fn home_path(self) -> &'static str {
        match self {
            Role::Customer => "/portal",
            Role::Agent => "/agent",
            Role::Underwriter => "/underwriter",
            Role::Admin => "/admin",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Customer => "CUSTOMER",
            Role::Agent => "AGENT",
            Role::Underwriter => "UNDERWRITER",
            Role::Admin => "ADMIN",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "CUSTOMER" => Some(Role::Customer),
            "AGENT" => Some(Role::Agent),
            "UNDERWRITER" => Some(Role::Underwriter),
            "ADMIN" => Some(Role::Admin),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An authenticated staff identity resolved from a session token.
#[derive(Debug, Clone, Serialize)]
pub struct Identity {
    pub id: UserId,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
}

impl Identity {
    /// Procedure-level minimum-role guard.
    ///
    /// Returns [`AuthError::Forbidden`], which callers must keep distinct
    /// from [`AuthError::Unauthenticated`] so "log in" and "not allowed" can
    /// be rendered differently.
    pub fn require_at_least(&self, required: Role) -> Result<(), AuthError> {
        if self.role.at_least(required) {
            Ok(())
        } else {
            Err(AuthError::Forbidden)
        }
    }
}
