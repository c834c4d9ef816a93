//! Application state

use crate::email::EmailSender;
use crate::external::ExternalIdentity;
use crate::store::UserStore;
use crate::token::TokenCodec;

/// Shared application state, generic over the store, email, and external
/// identity implementations.
pub struct AppState<U, E, X> {
    pub user_store: U,
    pub email_sender: E,
    pub external: X,
    pub tokens: TokenCodec,
    /// Public base URL, used to build reset links
    pub base_url: String,
    /// Whether the session cookie carries the Secure attribute
    pub cookie_secure: bool,
    /// Shared secret expected on provisioning webhook calls
    pub webhook_secret: Option<String>,
}

impl<U, E, X> AppState<U, E, X>
where
    U: UserStore,
    E: EmailSender,
    X: ExternalIdentity,
{
    pub fn new(
        tokens: TokenCodec,
        base_url: String,
        user_store: U,
        email_sender: E,
        external: X,
    ) -> Self {
        Self {
            user_store,
            email_sender,
            external,
            tokens,
            base_url,
            cookie_secure: false,
            webhook_secret: None,
        }
    }

    pub fn with_cookie_secure(mut self, secure: bool) -> Self {
        self.cookie_secure = secure;
        self
    }

    pub fn with_webhook_secret(mut self, secret: Option<String>) -> Self {
        self.webhook_secret = secret;
        self
    }
}
