//! Router-level tests for the admin API.

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use std::sync::Arc;
use tower::ServiceExt;

use lethe::api::AppState;
use lethe::config::{Config, SecurityConfig};
use lethe::db::User;

/// Default API key seeded by migration (must match m20240101_initial.rs)
const DEFAULT_API_KEY: &str = "lethe_default_api_key_please_regenerate";

async fn spawn_app() -> (Arc<AppState>, Router) {
    let mut config = Config::default();
    config.general.database_path = "sqlite::memory:".to_string();
    config.general.max_db_connections = 1;
    config.general.min_db_connections = 1;

    let state = lethe::api::create_app_state_from_config(config, None)
        .await
        .expect("Failed to create app state");
    let router = lethe::api::router(state.clone()).await;
    (state, router)
}

async fn seed_member(state: &Arc<AppState>, email: &str) -> User {
    state
        .store()
        .create_user(
            &email.replace(['@', '.'], "_"),
            email,
            "Max Muster",
            "correct horse battery",
            false,
            &SecurityConfig::default(),
        )
        .await
        .expect("failed to create member")
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

fn get(uri: &str, api_key: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(key) = api_key {
        builder = builder.header("X-Api-Key", key);
    }
    builder.body(Body::empty()).unwrap()
}

fn post_form(uri: &str, api_key: &str, form: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("X-Api-Key", api_key)
        .header("Content-Type", "application/x-www-form-urlencoded")
        .body(Body::from(form.to_string()))
        .unwrap()
}

async fn fetch_csrf_token(app: &Router, api_key: &str) -> String {
    let response = app
        .clone()
        .oneshot(get("/api/privacy/data-deletion", Some(api_key)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    body["data"]["csrf_token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_auth_endpoints() {
    let (_, app) = spawn_app().await;

    let response = app
        .clone()
        .oneshot(get("/api/system/status", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .clone()
        .oneshot(get("/api/system/status", Some("wrong-key")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .clone()
        .oneshot(get("/api/system/status", Some(DEFAULT_API_KEY)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_login_rejects_bad_credentials() {
    let (_, app) = spawn_app().await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/login")
                .header("Content-Type", "application/json")
                .body(Body::from(
                    serde_json::json!({
                        "username": "admin",
                        "password": "invalid-password"
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_privacy_routes_require_admin() {
    let (state, app) = spawn_app().await;
    let member = seed_member(&state, "user@example.com").await;

    // A valid non-admin API key authenticates but is refused.
    let response = app
        .clone()
        .oneshot(get("/api/privacy/data-deletion", Some(&member.api_key)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // The member can still read their own profile.
    let response = app
        .clone()
        .oneshot(get("/api/auth/me", Some(&member.api_key)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_deletion_form_issues_token() {
    let (_, app) = spawn_app().await;

    let token = fetch_csrf_token(&app, DEFAULT_API_KEY).await;
    assert_eq!(token.len(), 64);
}

#[tokio::test]
async fn test_search_not_found() {
    let (_, app) = spawn_app().await;

    let response = app
        .clone()
        .oneshot(post_form(
            "/api/privacy/data-deletion",
            DEFAULT_API_KEY,
            "email=nobody%40example.com",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert!(body["data"]["user"].is_null());
    assert!(body["data"]["notice"].as_str().unwrap().contains("No user"));
}

#[tokio::test]
async fn test_search_finds_member() {
    let (state, app) = spawn_app().await;
    let member = seed_member(&state, "user@example.com").await;

    let response = app
        .clone()
        .oneshot(post_form(
            "/api/privacy/data-deletion",
            DEFAULT_API_KEY,
            "email=user%40example.com",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["data"]["user"]["id"], member.id);
    assert_eq!(body["data"]["user"]["email"], "user@example.com");
}

#[tokio::test]
async fn test_anonymize_flow() {
    let (state, app) = spawn_app().await;
    let member = seed_member(&state, "user@example.com").await;
    state
        .store()
        .add_user_meta(member.id, "newsletter", "1")
        .await
        .unwrap();

    let token = fetch_csrf_token(&app, DEFAULT_API_KEY).await;

    let form = format!(
        "action=anonymize_user&user_id={}&csrf_token={}",
        member.id, token
    );
    let response = app
        .clone()
        .oneshot(post_form("/api/privacy/data-deletion", DEFAULT_API_KEY, &form))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    let email = body["data"]["anonymized"]["email"].as_str().unwrap();
    assert!(email.starts_with(&format!("deleted_{}_", member.id)));
    assert!(email.ends_with("@anonymized.local"));
    assert_eq!(
        body["data"]["anonymized"]["display_name"],
        format!("Deleted User {}", member.id)
    );

    // The old address no longer resolves.
    let response = app
        .clone()
        .oneshot(post_form(
            "/api/privacy/data-deletion",
            DEFAULT_API_KEY,
            "email=user%40example.com",
        ))
        .await
        .unwrap();
    let body = json_body(response).await;
    assert!(body["data"]["user"].is_null());

    // Exactly the sentinel row remains.
    assert_eq!(state.store().count_user_meta(member.id).await.unwrap(), 1);
}

#[tokio::test]
async fn test_anonymize_rejects_bad_token() {
    let (state, app) = spawn_app().await;
    let member = seed_member(&state, "user@example.com").await;

    // A token was issued, but the request carries a different one.
    let _ = fetch_csrf_token(&app, DEFAULT_API_KEY).await;

    let form = format!(
        "action=anonymize_user&user_id={}&csrf_token=deadbeef",
        member.id
    );
    let response = app
        .clone()
        .oneshot(post_form("/api/privacy/data-deletion", DEFAULT_API_KEY, &form))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let unchanged = state
        .store()
        .get_user_by_id(member.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(unchanged.email, "user@example.com");
    assert!(!unchanged.is_anonymized);
}

#[tokio::test]
async fn test_anonymize_missing_token_is_rejected() {
    let (state, app) = spawn_app().await;
    let member = seed_member(&state, "user@example.com").await;

    let form = format!("action=anonymize_user&user_id={}", member.id);
    let response = app
        .clone()
        .oneshot(post_form("/api/privacy/data-deletion", DEFAULT_API_KEY, &form))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let unchanged = state
        .store()
        .get_user_by_id(member.id)
        .await
        .unwrap()
        .unwrap();
    assert!(!unchanged.is_anonymized);
}

#[tokio::test]
async fn test_anonymize_bootstrap_admin_is_blocked() {
    let (state, app) = spawn_app().await;

    let token = fetch_csrf_token(&app, DEFAULT_API_KEY).await;

    let form = format!("action=anonymize_user&user_id=1&csrf_token={token}");
    let response = app
        .clone()
        .oneshot(post_form("/api/privacy/data-deletion", DEFAULT_API_KEY, &form))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = json_body(response).await;
    assert!(body["error"].as_str().unwrap().contains("protected"));

    let admin = state.store().get_user_by_id(1).await.unwrap().unwrap();
    assert!(!admin.is_anonymized);
    assert_eq!(admin.username, "admin");
}

#[tokio::test]
async fn test_mutation_suppresses_search() {
    let (state, app) = spawn_app().await;
    let member = seed_member(&state, "user@example.com").await;

    let token = fetch_csrf_token(&app, DEFAULT_API_KEY).await;

    // The email parameter rides along with the mutation; the response must
    // reflect the action only.
    let form = format!(
        "action=anonymize_user&user_id={}&csrf_token={}&email=user%40example.com",
        member.id, token
    );
    let response = app
        .clone()
        .oneshot(post_form("/api/privacy/data-deletion", DEFAULT_API_KEY, &form))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert!(body["data"]["user"].is_null());
    assert!(body["data"]["anonymized"].is_object());
}

#[tokio::test]
async fn test_unknown_action_is_rejected() {
    let (_, app) = spawn_app().await;

    let response = app
        .clone()
        .oneshot(post_form(
            "/api/privacy/data-deletion",
            DEFAULT_API_KEY,
            "action=delete_everything",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_audit_trail_records_anonymization() {
    let (state, app) = spawn_app().await;
    let member = seed_member(&state, "user@example.com").await;

    let token = fetch_csrf_token(&app, DEFAULT_API_KEY).await;
    let form = format!(
        "action=anonymize_user&user_id={}&csrf_token={}",
        member.id, token
    );
    app.clone()
        .oneshot(post_form("/api/privacy/data-deletion", DEFAULT_API_KEY, &form))
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(get(
            "/api/system/audit?event_type=user_anonymized",
            Some(DEFAULT_API_KEY),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    let events = body["data"].as_array().unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0]["event_type"], "user_anonymized");
}

#[tokio::test]
async fn test_fallback_serves_admin_page() {
    let (_, app) = spawn_app().await;

    let response = app
        .clone()
        .oneshot(get("/", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let html = String::from_utf8_lossy(&body);
    assert!(html.contains("Data Deletion"));
}
