//! Tests for the identity provider provisioning webhook

mod common;

use common::{seed_staff, test_backend, WEBHOOK_SECRET};
use covergate::routes::webhook::WEBHOOK_SECRET_HEADER;
use covergate::store::UserStore;
use covergate::Role;
use serde_json::{json, Value};

#[tokio::test]
async fn webhook_rejects_calls_without_the_secret() {
    let backend = test_backend();

    let response = backend
        .server
        .post("/api/webhooks/identity")
        .json(&json!({ "type": "user.created", "data": { "id": "idp_1", "email": "c@x.com" } }))
        .await;
    assert_eq!(response.status_code().as_u16(), 401);
    assert!(backend.store.get_by_external_id("idp_1").unwrap().is_none());
}

#[tokio::test]
async fn webhook_rejects_a_wrong_secret() {
    let backend = test_backend();

    let response = backend
        .server
        .post("/api/webhooks/identity")
        .add_header(WEBHOOK_SECRET_HEADER, "wrong-secret")
        .json(&json!({ "type": "user.created", "data": { "id": "idp_1", "email": "c@x.com" } }))
        .await;
    assert_eq!(response.status_code().as_u16(), 401);
}

#[tokio::test]
async fn user_created_provisions_a_customer_record() {
    let backend = test_backend();

    let response = backend
        .server
        .post("/api/webhooks/identity")
        .add_header(WEBHOOK_SECRET_HEADER, WEBHOOK_SECRET)
        .json(&json!({
            "type": "user.created",
            "data": {
                "id": "idp_cust_1",
                "email": "Customer@X.com",
                "first_name": "Cas",
                "last_name": "Customer"
            }
        }))
        .await;
    assert_eq!(response.status_code().as_u16(), 200);

    let user = backend
        .store
        .get_by_external_id("idp_cust_1")
        .unwrap()
        .expect("record provisioned");
    assert_eq!(user.email, "customer@x.com");
    assert_eq!(user.role, Role::Customer);
    assert!(user.password_hash.is_none());
}

#[tokio::test]
async fn user_updated_rewrites_the_existing_record() {
    let backend = test_backend();

    backend
        .server
        .post("/api/webhooks/identity")
        .add_header(WEBHOOK_SECRET_HEADER, WEBHOOK_SECRET)
        .json(&json!({
            "type": "user.created",
            "data": { "id": "idp_cust_1", "email": "old@x.com", "first_name": "Old" }
        }))
        .await;

    let response = backend
        .server
        .post("/api/webhooks/identity")
        .add_header(WEBHOOK_SECRET_HEADER, WEBHOOK_SECRET)
        .json(&json!({
            "type": "user.updated",
            "data": { "id": "idp_cust_1", "email": "new@x.com", "first_name": "New" }
        }))
        .await;
    assert_eq!(response.status_code().as_u16(), 200);

    let user = backend
        .store
        .get_by_external_id("idp_cust_1")
        .unwrap()
        .expect("record present");
    assert_eq!(user.email, "new@x.com");
    assert_eq!(user.first_name, "New");
    assert!(backend.store.get_by_email("old@x.com").unwrap().is_none());
}

#[tokio::test]
async fn user_updated_cannot_take_another_users_email() {
    let backend = test_backend();

    for (id, email) in [("idp_a", "taken@x.com"), ("idp_b", "other@x.com")] {
        backend
            .server
            .post("/api/webhooks/identity")
            .add_header(WEBHOOK_SECRET_HEADER, WEBHOOK_SECRET)
            .json(&json!({ "type": "user.created", "data": { "id": id, "email": email } }))
            .await;
    }

    let response = backend
        .server
        .post("/api/webhooks/identity")
        .add_header(WEBHOOK_SECRET_HEADER, WEBHOOK_SECRET)
        .json(&json!({
            "type": "user.updated",
            "data": { "id": "idp_b", "email": "taken@x.com" }
        }))
        .await;
    assert_eq!(response.status_code().as_u16(), 409);

    // Both records keep their addresses
    let a = backend.store.get_by_external_id("idp_a").unwrap().unwrap();
    let b = backend.store.get_by_external_id("idp_b").unwrap().unwrap();
    assert_eq!(a.email, "taken@x.com");
    assert_eq!(b.email, "other@x.com");
}

#[tokio::test]
async fn user_deleted_removes_the_record() {
    let backend = test_backend();

    backend
        .server
        .post("/api/webhooks/identity")
        .add_header(WEBHOOK_SECRET_HEADER, WEBHOOK_SECRET)
        .json(&json!({
            "type": "user.created",
            "data": { "id": "idp_cust_1", "email": "c@x.com" }
        }))
        .await;

    let response = backend
        .server
        .post("/api/webhooks/identity")
        .add_header(WEBHOOK_SECRET_HEADER, WEBHOOK_SECRET)
        .json(&json!({ "type": "user.deleted", "data": { "id": "idp_cust_1" } }))
        .await;
    assert_eq!(response.status_code().as_u16(), 200);
    assert!(backend
        .store
        .get_by_external_id("idp_cust_1")
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn unknown_event_kinds_are_acknowledged() {
    let backend = test_backend();

    let response = backend
        .server
        .post("/api/webhooks/identity")
        .add_header(WEBHOOK_SECRET_HEADER, WEBHOOK_SECRET)
        .json(&json!({ "type": "session.created", "data": { "id": "idp_sess_1" } }))
        .await;
    assert_eq!(response.status_code().as_u16(), 200);
    let body: Value = response.json();
    assert_eq!(body["success"], true);
}

#[tokio::test]
async fn created_event_without_an_email_is_a_validation_error() {
    let backend = test_backend();

    let response = backend
        .server
        .post("/api/webhooks/identity")
        .add_header(WEBHOOK_SECRET_HEADER, WEBHOOK_SECRET)
        .json(&json!({ "type": "user.created", "data": { "id": "idp_cust_1" } }))
        .await;
    assert_eq!(response.status_code().as_u16(), 400);
}

#[tokio::test]
async fn provisioned_customers_cannot_use_the_staff_login() {
    let backend = test_backend();
    seed_staff(&backend.store, "agent@x.com", "correct-password", Role::Agent);

    backend
        .server
        .post("/api/webhooks/identity")
        .add_header(WEBHOOK_SECRET_HEADER, WEBHOOK_SECRET)
        .json(&json!({
            "type": "user.created",
            "data": { "id": "idp_cust_1", "email": "customer@x.com" }
        }))
        .await;

    let response = backend
        .server
        .post("/api/staff/login")
        .json(&json!({ "email": "customer@x.com", "password": "anything" }))
        .await;
    assert_eq!(response.status_code().as_u16(), 401);
    let body: Value = response.json();
    assert_eq!(body["reason"], "This sign-in is for staff accounts only");
}
