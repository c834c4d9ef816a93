//! Tests for the authorization gate middleware
//!
//! These run the gate over a small stand-in router so assertions can target
//! the gate's own behavior rather than any particular endpoint.

mod common;

use std::sync::Arc;

use axum::{middleware, routing::get, Extension, Router};
use axum_test::TestServer;
use common::{seed_staff, session_cookie, test_state, MockEmailSender, IDP_SECRET};
use covergate::external::{ExternalSubject, IDP_SESSION_COOKIE, ProviderSessionVerifier};
use covergate::roles::Identity;
use covergate::store::InMemoryUserStore;
use covergate::{gate, Role};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde::Serialize;

async fn staff_page(Extension(identity): Extension<Identity>) -> String {
    format!("staff:{}", identity.email)
}

async fn portal_page(Extension(subject): Extension<ExternalSubject>) -> String {
    format!("customer:{}", subject.0)
}

async fn open_page() -> &'static str {
    "open"
}

struct GateHarness {
    server: TestServer,
    state: common::TestState,
    store: Arc<InMemoryUserStore>,
}

fn gate_harness() -> GateHarness {
    let (state, store, _emails) = test_state();

    let app = Router::new()
        .route("/admin/reports", get(staff_page))
        .route("/agent/leads", get(staff_page))
        .route("/underwriter/queue", get(staff_page))
        .route("/api/agent/leads", get(staff_page))
        .route("/portal/claims", get(portal_page))
        .route("/health", get(open_page))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            gate::authorization_gate::<
                Arc<InMemoryUserStore>,
                MockEmailSender,
                ProviderSessionVerifier,
            >,
        ));

    let server = TestServer::new(app).expect("Failed to create test server");
    GateHarness {
        server,
        state,
        store,
    }
}

fn staff_token(harness: &GateHarness, email: &str, role: Role) -> String {
    let user = seed_staff(&harness.store, email, "correct-password", role);
    harness
        .state
        .tokens
        .issue(&user.identity())
        .expect("issue session token")
}

#[derive(Serialize)]
struct ProviderClaims {
    sub: String,
    exp: i64,
}

fn provider_cookie(sub: &str) -> cookie::Cookie<'static> {
    let token = encode(
        &Header::default(),
        &ProviderClaims {
            sub: sub.to_string(),
            exp: chrono::Utc::now().timestamp() + 3600,
        },
        &EncodingKey::from_secret(IDP_SECRET.as_bytes()),
    )
    .unwrap();
    cookie::Cookie::new(IDP_SESSION_COOKIE, token)
}

#[tokio::test]
async fn open_paths_pass_without_any_identity() {
    let harness = gate_harness();

    let response = harness.server.get("/health").await;
    assert_eq!(response.status_code().as_u16(), 200);
    assert_eq!(response.text(), "open");
}

#[tokio::test]
async fn unauthenticated_staff_page_redirects_to_login_with_return_url() {
    let harness = gate_harness();

    let response = harness.server.get("/admin/reports").await;
    assert_eq!(response.status_code().as_u16(), 303);
    let location = response.header("location");
    assert_eq!(
        location.to_str().unwrap(),
        "/staff/login?redirect_to=%2Fadmin%2Freports"
    );
}

#[tokio::test]
async fn redirect_preserves_the_query_string() {
    let harness = gate_harness();

    let response = harness.server.get("/agent/leads?page=2&sort=name").await;
    assert_eq!(response.status_code().as_u16(), 303);
    let location = response.header("location");
    assert_eq!(
        location.to_str().unwrap(),
        "/staff/login?redirect_to=%2Fagent%2Fleads%3Fpage%3D2%26sort%3Dname"
    );
}

#[tokio::test]
async fn matching_role_passes_and_receives_the_identity() {
    let harness = gate_harness();
    let token = staff_token(&harness, "admin@x.com", Role::Admin);

    let response = harness
        .server
        .get("/admin/reports")
        .add_cookie(session_cookie(&token))
        .await;
    assert_eq!(response.status_code().as_u16(), 200);
    assert_eq!(response.text(), "staff:admin@x.com");
}

#[tokio::test]
async fn agent_is_bounced_off_admin_pages() {
    let harness = gate_harness();
    let token = staff_token(&harness, "agent@x.com", Role::Agent);

    let response = harness
        .server
        .get("/admin/reports")
        .add_cookie(session_cookie(&token))
        .await;
    assert_eq!(response.status_code().as_u16(), 303);
}

#[tokio::test]
async fn admin_is_bounced_off_agent_pages_too() {
    // Prefix matching is exact, not hierarchical: ADMIN does not imply
    // access to AGENT pages at the gate.
    let harness = gate_harness();
    let token = staff_token(&harness, "admin@x.com", Role::Admin);

    let response = harness
        .server
        .get("/agent/leads")
        .add_cookie(session_cookie(&token))
        .await;
    assert_eq!(response.status_code().as_u16(), 303);
}

#[tokio::test]
async fn api_staff_paths_get_json_errors_not_redirects() {
    let harness = gate_harness();

    let anonymous = harness.server.get("/api/agent/leads").await;
    assert_eq!(anonymous.status_code().as_u16(), 401);
    let body: serde_json::Value = anonymous.json();
    assert_eq!(body["success"], false);

    let admin = staff_token(&harness, "admin@x.com", Role::Admin);
    let wrong_role = harness
        .server
        .get("/api/agent/leads")
        .add_cookie(session_cookie(&admin))
        .await;
    assert_eq!(wrong_role.status_code().as_u16(), 403);
}

#[tokio::test]
async fn api_agent_path_passes_for_an_agent_session() {
    let harness = gate_harness();
    let token = staff_token(&harness, "agent@x.com", Role::Agent);

    let response = harness
        .server
        .get("/api/agent/leads")
        .add_cookie(session_cookie(&token))
        .await;
    assert_eq!(response.status_code().as_u16(), 200);
    assert_eq!(response.text(), "staff:agent@x.com");
}

#[tokio::test]
async fn customer_path_requires_the_provider_cookie() {
    let harness = gate_harness();

    let anonymous = harness.server.get("/portal/claims").await;
    assert_eq!(anonymous.status_code().as_u16(), 303);
    let location = anonymous.header("location");
    assert_eq!(location.to_str().unwrap(), "/sign-in");

    let response = harness
        .server
        .get("/portal/claims")
        .add_cookie(provider_cookie("idp_user_42"))
        .await;
    assert_eq!(response.status_code().as_u16(), 200);
    assert_eq!(response.text(), "customer:idp_user_42");
}

#[tokio::test]
async fn staff_session_does_not_open_the_customer_path() {
    let harness = gate_harness();
    let token = staff_token(&harness, "admin@x.com", Role::Admin);

    let response = harness
        .server
        .get("/portal/claims")
        .add_cookie(session_cookie(&token))
        .await;
    assert_eq!(response.status_code().as_u16(), 303);
}

#[tokio::test]
async fn page_responses_carry_the_full_security_header_set() {
    let harness = gate_harness();

    // Even the denial redirect gets the headers
    let response = harness.server.get("/admin/reports").await;
    assert_eq!(
        response.header("x-content-type-options").to_str().unwrap(),
        "nosniff"
    );
    assert_eq!(response.header("x-frame-options").to_str().unwrap(), "DENY");
    assert_eq!(
        response.header("content-security-policy").to_str().unwrap(),
        "default-src 'self'; frame-ancestors 'none'"
    );
    assert_eq!(
        response.header("referrer-policy").to_str().unwrap(),
        "strict-origin-when-cross-origin"
    );

    // Open pages get them too
    let open = harness.server.get("/health").await;
    assert_eq!(
        open.header("x-content-type-options").to_str().unwrap(),
        "nosniff"
    );
}

#[tokio::test]
async fn api_responses_get_the_narrow_header_set() {
    let harness = gate_harness();
    let token = staff_token(&harness, "agent@x.com", Role::Agent);

    let response = harness
        .server
        .get("/api/agent/leads")
        .add_cookie(session_cookie(&token))
        .await;
    assert_eq!(
        response.header("x-content-type-options").to_str().unwrap(),
        "nosniff"
    );
    assert_eq!(
        response.header("cache-control").to_str().unwrap(),
        "no-store"
    );
    assert!(response.headers().get("content-security-policy").is_none());
    assert!(response.headers().get("x-frame-options").is_none());
}
