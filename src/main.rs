//! Covergate auth service
//!
//! Authentication, session, and role-authorization core for the Covergate
//! insurance portal.

use std::sync::Arc;

use anyhow::Result;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use covergate::crypto::hash_password;
use covergate::store::NewStaffUser;
use covergate::{
    routes, AppState, Config, ConsoleEmailSender, DisabledExternalIdentity, EmailSender,
    ExternalIdentity, InMemoryUserStore, ProviderSessionVerifier, Role, SmtpEmailSender,
    SqliteStore, TokenCodec, UserStore,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "covergate=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env();
    tracing::info!(port = config.port, base_url = %config.base_url, "Loaded configuration");

    // Select the user store
    let user_store: Box<dyn UserStore> = match &config.database_path {
        Some(path) => {
            tracing::info!(path = %path, "Using SQLite user store");
            Box::new(SqliteStore::open(path)?)
        }
        None => {
            tracing::warn!("DATABASE_PATH not set; using in-memory user store");
            Box::new(InMemoryUserStore::new())
        }
    };

    // Optional first-admin bootstrap for fresh deployments
    if let (Some(email), Some(password)) = (
        &config.bootstrap_admin_email,
        &config.bootstrap_admin_password,
    ) {
        if user_store.get_by_email(&email.to_lowercase())?.is_none() {
            let admin = user_store.create_staff(NewStaffUser {
                email: email.clone(),
                first_name: "Admin".to_string(),
                last_name: "Account".to_string(),
                role: Role::Admin,
                password_hash: Some(hash_password(password)?),
            })?;
            tracing::info!(user = %admin.id, "Bootstrapped admin account");
        }
    }

    // Select the email sender
    let email_sender: Box<dyn EmailSender> = match config.smtp.clone() {
        Some(smtp) => Box::new(SmtpEmailSender::new(smtp).map_err(anyhow::Error::msg)?),
        None => {
            tracing::warn!("SMTP not configured; reset links go to the console");
            Box::new(ConsoleEmailSender::new())
        }
    };

    // Select the external identity adapter
    let external: Box<dyn ExternalIdentity> = match &config.idp_session_secret {
        Some(secret) => Box::new(ProviderSessionVerifier::new(secret)),
        None => {
            tracing::warn!("IDP_SESSION_SECRET not set; customer path is disabled");
            Box::new(DisabledExternalIdentity)
        }
    };

    // Create app state
    let tokens = TokenCodec::new(&config.session_secret, "covergate", config.session_ttl_hours);
    let state = Arc::new(
        AppState::new(
            tokens,
            config.base_url.clone(),
            user_store,
            email_sender,
            external,
        )
        .with_cookie_secure(config.cookie_secure)
        .with_webhook_secret(config.idp_webhook_secret.clone()),
    );

    // Create router
    let app = routes::create_router(state).layer(TraceLayer::new_for_http());

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Covergate auth service listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
