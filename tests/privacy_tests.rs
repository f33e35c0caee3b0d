//! Service-level tests for the anonymization workflow.

use std::sync::Arc;
use std::time::Duration;

use sea_orm::EntityTrait;

use lethe::config::SecurityConfig;
use lethe::db::{ANONYMIZED_META_KEY, DISABLED_CREDENTIAL, Store, User};
use lethe::entities::users;
use lethe::services::{
    ANONYMIZE_ACTION, BOOTSTRAP_ADMIN_ID, InMemoryTokenService, PrivacyError, PrivacyService,
    SeaOrmPrivacyService, TokenService,
};

const ADMIN_ID: i32 = BOOTSTRAP_ADMIN_ID;

async fn spawn_store() -> Store {
    Store::with_pool_options("sqlite::memory:", 1, 1)
        .await
        .expect("failed to create store")
}

fn spawn_service(store: &Store) -> (SeaOrmPrivacyService, Arc<dyn TokenService>) {
    let tokens: Arc<dyn TokenService> =
        Arc::new(InMemoryTokenService::new(Duration::from_secs(3600)));
    let service = SeaOrmPrivacyService::new(store.clone(), tokens.clone());
    (service, tokens)
}

async fn seed_member(store: &Store, email: &str) -> User {
    let user = store
        .create_user(
            &email.replace(['@', '.'], "_"),
            email,
            "Max Muster",
            "correct horse battery",
            false,
            &SecurityConfig::default(),
        )
        .await
        .expect("failed to create member");

    store
        .add_user_meta(user.id, "newsletter", "1")
        .await
        .unwrap();
    store
        .add_user_meta(user.id, "phone", "+49 30 1234567")
        .await
        .unwrap();

    user
}

async fn raw_user(store: &Store, id: i32) -> users::Model {
    users::Entity::find_by_id(id)
        .one(&store.conn)
        .await
        .unwrap()
        .expect("user row missing")
}

#[tokio::test]
async fn anonymize_scrubs_identifying_fields() {
    let store = spawn_store().await;
    let (service, tokens) = spawn_service(&store);
    let member = seed_member(&store, "user@example.com").await;

    let token = tokens.issue(ADMIN_ID, ANONYMIZE_ACTION).await;
    let scrubbed = service
        .anonymize(ADMIN_ID, member.id, &token)
        .await
        .expect("anonymization failed");

    assert_eq!(scrubbed.id, member.id);
    assert!(scrubbed.email.starts_with(&format!("deleted_{}_", member.id)));
    assert!(scrubbed.email.ends_with("@anonymized.local"));
    assert_eq!(scrubbed.display_name, format!("Deleted User {}", member.id));

    let row = raw_user(&store, member.id).await;
    assert_eq!(row.email, scrubbed.email);
    assert_eq!(row.display_name, scrubbed.display_name);
    assert_eq!(row.password_hash, DISABLED_CREDENTIAL);
    assert!(row.is_anonymized);

    // Metadata collapses to exactly the sentinel row.
    let meta = store.get_user_meta(member.id).await.unwrap();
    assert_eq!(meta.len(), 1);
    assert_eq!(meta[0].meta_key, ANONYMIZED_META_KEY);
    assert_eq!(meta[0].meta_value, "1");
}

#[tokio::test]
async fn anonymize_writes_one_audit_event() {
    let store = spawn_store().await;
    let (service, tokens) = spawn_service(&store);
    let member = seed_member(&store, "user@example.com").await;

    let token = tokens.issue(ADMIN_ID, ANONYMIZE_ACTION).await;
    service.anonymize(ADMIN_ID, member.id, &token).await.unwrap();

    let events = store
        .recent_audit_events(10, Some("user_anonymized".to_string()))
        .await
        .unwrap();
    assert_eq!(events.len(), 1);
    assert!(events[0].message.contains(&member.id.to_string()));
}

#[tokio::test]
async fn bootstrap_admin_is_protected() {
    let store = spawn_store().await;
    let (service, tokens) = spawn_service(&store);
    let admin_before = raw_user(&store, ADMIN_ID).await;

    let token = tokens.issue(ADMIN_ID, ANONYMIZE_ACTION).await;
    let result = service.anonymize(ADMIN_ID, ADMIN_ID, &token).await;

    assert!(matches!(result, Err(PrivacyError::ProtectedAccount)));

    let admin_after = raw_user(&store, ADMIN_ID).await;
    assert_eq!(admin_after, admin_before);
}

#[tokio::test]
async fn actor_cannot_anonymize_themselves() {
    let store = spawn_store().await;
    let (service, tokens) = spawn_service(&store);
    let member = seed_member(&store, "second-admin@example.com").await;

    let token = tokens.issue(member.id, ANONYMIZE_ACTION).await;
    let result = service.anonymize(member.id, member.id, &token).await;

    assert!(matches!(result, Err(PrivacyError::ProtectedAccount)));

    let row = raw_user(&store, member.id).await;
    assert_eq!(row.email, member.email);
    assert!(!row.is_anonymized);
    assert_eq!(store.count_user_meta(member.id).await.unwrap(), 2);
}

#[tokio::test]
async fn invalid_token_never_mutates() {
    let store = spawn_store().await;
    let (service, tokens) = spawn_service(&store);
    let member = seed_member(&store, "user@example.com").await;

    // Issued for the right actor and action, but a different string is sent.
    let _ = tokens.issue(ADMIN_ID, ANONYMIZE_ACTION).await;

    for bad_token in ["", "deadbeef", "not-a-token"] {
        let result = service.anonymize(ADMIN_ID, member.id, bad_token).await;
        assert!(matches!(result, Err(PrivacyError::CsrfRejected)));
    }

    let row = raw_user(&store, member.id).await;
    assert_eq!(row.email, member.email);
    assert!(!row.is_anonymized);
    assert_eq!(store.count_user_meta(member.id).await.unwrap(), 2);
}

#[tokio::test]
async fn token_for_another_actor_is_rejected() {
    let store = spawn_store().await;
    let (service, tokens) = spawn_service(&store);
    let member = seed_member(&store, "user@example.com").await;

    let other_actors_token = tokens.issue(99, ANONYMIZE_ACTION).await;
    let result = service
        .anonymize(ADMIN_ID, member.id, &other_actors_token)
        .await;

    assert!(matches!(result, Err(PrivacyError::CsrfRejected)));
}

#[tokio::test]
async fn anonymize_unknown_id_is_not_found() {
    let store = spawn_store().await;
    let (service, tokens) = spawn_service(&store);

    let token = tokens.issue(ADMIN_ID, ANONYMIZE_ACTION).await;
    let result = service.anonymize(ADMIN_ID, 4242, &token).await;

    assert!(matches!(result, Err(PrivacyError::UserNotFound)));
}

#[tokio::test]
async fn search_finds_exact_email_only() {
    let store = spawn_store().await;
    let (service, _) = spawn_service(&store);
    let member = seed_member(&store, "user@example.com").await;

    let found = service.search("user@example.com").await.unwrap();
    assert_eq!(found.map(|u| u.id), Some(member.id));

    let missed = service.search("other@example.com").await.unwrap();
    assert!(missed.is_none());
}

#[tokio::test]
async fn search_trims_and_validates_input() {
    let store = spawn_store().await;
    let (service, _) = spawn_service(&store);
    let member = seed_member(&store, "user@example.com").await;

    let found = service.search("  user@example.com  ").await.unwrap();
    assert_eq!(found.map(|u| u.id), Some(member.id));

    assert!(matches!(
        service.search("   ").await,
        Err(PrivacyError::Validation(_))
    ));
    assert!(matches!(
        service.search("not-an-email").await,
        Err(PrivacyError::Validation(_))
    ));
}

#[tokio::test]
async fn anonymized_account_cannot_log_in() {
    let store = spawn_store().await;
    let (service, tokens) = spawn_service(&store);
    let member = seed_member(&store, "user@example.com").await;

    let token = tokens.issue(ADMIN_ID, ANONYMIZE_ACTION).await;
    let scrubbed = service.anonymize(ADMIN_ID, member.id, &token).await.unwrap();

    // The scrubbed credential sentinel never verifies.
    let ok = store
        .verify_user_password(&scrubbed.username, "correct horse battery")
        .await
        .unwrap();
    assert!(!ok);
}

#[tokio::test]
async fn search_after_anonymize_misses_old_email() {
    let store = spawn_store().await;
    let (service, tokens) = spawn_service(&store);
    let member = seed_member(&store, "user@example.com").await;

    let token = tokens.issue(ADMIN_ID, ANONYMIZE_ACTION).await;
    service.anonymize(ADMIN_ID, member.id, &token).await.unwrap();

    let missed = service.search("user@example.com").await.unwrap();
    assert!(missed.is_none());
}
