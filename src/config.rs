//! Service configuration

use crate::crypto::generate_secret;
use crate::email::SmtpConfig;

#[derive(Debug, Clone)]
pub struct Config {
    /// Port to listen on
    pub port: u16,

    /// Public base URL, used when building reset links
    pub base_url: String,

    /// HMAC secret for staff session tokens
    pub session_secret: String,

    /// Staff session lifetime in hours
    pub session_ttl_hours: i64,

    /// Whether the session cookie carries the Secure attribute
    pub cookie_secure: bool,

    /// SQLite database path; in-memory store when unset
    pub database_path: Option<String>,

    /// HMAC secret for verifying the identity provider's session cookie
    pub idp_session_secret: Option<String>,

    /// Shared secret for the identity provider's provisioning webhook
    pub idp_webhook_secret: Option<String>,

    /// SMTP configuration for reset emails; console sender when unset
    pub smtp: Option<SmtpConfig>,

    /// Optional first-admin bootstrap credentials
    pub bootstrap_admin_email: Option<String>,
    pub bootstrap_admin_password: Option<String>,
}

impl Config {
    /// Load configuration from environment variables, with development
    /// defaults for everything except production secrets.
    pub fn from_env() -> Self {
        fn get(key: &str) -> Option<String> {
            std::env::var(key).ok().filter(|s| !s.is_empty())
        }

        let port = get("PORT")
            .and_then(|s| s.parse().ok())
            .unwrap_or(3000);

        let base_url = get("BASE_URL").unwrap_or_else(|| format!("http://localhost:{port}"));

        let session_secret = get("SESSION_SECRET").unwrap_or_else(|| {
            tracing::warn!(
                "SESSION_SECRET not set; using a random secret (sessions will not survive restart)"
            );
            generate_secret()
        });

        let session_ttl_hours = get("SESSION_TTL_HOURS")
            .and_then(|s| s.parse().ok())
            .unwrap_or(8);

        let cookie_secure = get("COOKIE_SECURE")
            .map(|s| s == "1" || s.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        Self {
            port,
            base_url,
            session_secret,
            session_ttl_hours,
            cookie_secure,
            database_path: get("DATABASE_PATH"),
            idp_session_secret: get("IDP_SESSION_SECRET"),
            idp_webhook_secret: get("IDP_WEBHOOK_SECRET"),
            smtp: SmtpConfig::from_env(),
            bootstrap_admin_email: get("BOOTSTRAP_ADMIN_EMAIL"),
            bootstrap_admin_password: get("BOOTSTRAP_ADMIN_PASSWORD"),
        }
    }
}
