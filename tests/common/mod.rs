//! Common test utilities for integration tests

#![allow(dead_code)]

use std::sync::{Arc, RwLock};

use axum_test::TestServer;
use covergate::crypto::hash_password;
use covergate::store::{NewStaffUser, UserRecord, UserStore};
use covergate::{
    routes, AppState, EmailSender, InMemoryUserStore, ProviderSessionVerifier, Role, TokenCodec,
};

pub const SESSION_SECRET: &str = "test-session-secret";
pub const IDP_SECRET: &str = "idp-test-secret";
pub const WEBHOOK_SECRET: &str = "hook-test-secret";

pub type TestState =
    Arc<AppState<Arc<InMemoryUserStore>, MockEmailSender, ProviderSessionVerifier>>;

/// Mock email sender that captures reset links
#[derive(Default, Clone)]
pub struct MockEmailSender {
    /// Captured (email, reset_url) pairs
    pub sent: Arc<RwLock<Vec<(String, String)>>>,
}

impl MockEmailSender {
    pub fn new() -> Self {
        Self {
            sent: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Get the last reset URL sent to an email
    pub fn last_reset_url(&self, email: &str) -> Option<String> {
        self.sent
            .read()
            .unwrap()
            .iter()
            .rev()
            .find(|(e, _)| e == email)
            .map(|(_, url)| url.clone())
    }

    /// Get the raw reset token from the last URL sent to an email
    pub fn last_reset_token(&self, email: &str) -> Option<String> {
        let url = self.last_reset_url(email)?;
        url.split_once("token=").map(|(_, t)| t.to_string())
    }

    pub fn sent_count(&self) -> usize {
        self.sent.read().unwrap().len()
    }
}

impl EmailSender for MockEmailSender {
    fn send_password_reset(&self, email: &str, reset_url: &str) -> Result<(), String> {
        self.sent
            .write()
            .unwrap()
            .push((email.to_string(), reset_url.to_string()));
        Ok(())
    }
}

/// A full test backend: server plus handles for seeding and inspection
pub struct TestBackend {
    pub server: TestServer,
    pub state: TestState,
    pub store: Arc<InMemoryUserStore>,
    pub emails: MockEmailSender,
}

pub fn test_state() -> (TestState, Arc<InMemoryUserStore>, MockEmailSender) {
    let store = Arc::new(InMemoryUserStore::new());
    let emails = MockEmailSender::new();

    let state = Arc::new(
        AppState::new(
            TokenCodec::new(SESSION_SECRET, "covergate", 8),
            "http://localhost:3000".to_string(),
            store.clone(),
            emails.clone(),
            ProviderSessionVerifier::new(IDP_SECRET),
        )
        .with_webhook_secret(Some(WEBHOOK_SECRET.to_string())),
    );

    (state, store, emails)
}

/// Create a test server with the full router, mock email sender, and
/// in-memory store
pub fn test_backend() -> TestBackend {
    let (state, store, emails) = test_state();
    let server =
        TestServer::new(routes::create_router(state.clone())).expect("Failed to create test server");

    TestBackend {
        server,
        state,
        store,
        emails,
    }
}

/// Seed a staff account with a bcrypt-hashed password
pub fn seed_staff(
    store: &InMemoryUserStore,
    email: &str,
    password: &str,
    role: Role,
) -> UserRecord {
    store
        .create_staff(NewStaffUser {
            email: email.to_string(),
            first_name: "Test".to_string(),
            last_name: "Staff".to_string(),
            role,
            password_hash: Some(hash_password(password).expect("bcrypt")),
        })
        .expect("seed staff")
}

/// Log in over HTTP and return the session cookie value
pub async fn login(server: &TestServer, email: &str, password: &str) -> String {
    let response = server
        .post("/api/staff/login")
        .json(&serde_json::json!({ "email": email, "password": password }))
        .await;
    assert_eq!(response.status_code().as_u16(), 200, "login should succeed");

    response
        .maybe_cookie(covergate::gate::SESSION_COOKIE)
        .expect("No session cookie")
        .value()
        .to_string()
}

/// Build a session cookie for requests
pub fn session_cookie(token: &str) -> cookie::Cookie<'static> {
    cookie::Cookie::new(covergate::gate::SESSION_COOKIE, token.to_string())
}
