//! Covergate
//!
//! Authentication, session, and role-authorization core for the Covergate
//! insurance portal. Staff (agents, underwriters, admins) authenticate
//! locally with email and password; customers authenticate through a hosted
//! identity provider. A single authorization gate protects route trees by
//! role.

pub mod config;
pub mod crypto;
pub mod email;
pub mod error;
pub mod external;
pub mod gate;
pub mod roles;
pub mod routes;
pub mod state;
pub mod store;
pub mod token;

pub use config::Config;
pub use email::{ConsoleEmailSender, EmailSender, SmtpConfig, SmtpEmailSender};
pub use error::AuthError;
pub use external::{DisabledExternalIdentity, ExternalIdentity, ProviderSessionVerifier};
pub use gate::{authorization_gate, classify, RouteClass};
pub use roles::{Identity, Role};
pub use state::AppState;
pub use store::{InMemoryUserStore, SqliteStore, UserStore};
pub use token::TokenCodec;
