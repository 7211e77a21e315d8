//! Integration tests for the authentication gateway.
//!
//! These run the gateway against the in-memory identity provider and both
//! session store implementations.

#![allow(clippy::unwrap_used)]

use univent_auth::mocks::{MockIdentityProvider, MockSessionStore};
use univent_auth::{AuthGateway, FileSessionStore, SessionStore};
use univent_core::ErrorKind;
use univent_testing::fixtures;

fn provider() -> MockIdentityProvider {
    MockIdentityProvider::new().with_account(fixtures::student("alex@university.edu"), "secret1")
}

fn temp_dir() -> std::path::PathBuf {
    std::env::temp_dir().join(format!("univent-auth-it-{}", uuid::Uuid::new_v4()))
}

#[tokio::test]
async fn email_without_at_never_reaches_the_identity_service() {
    let provider = provider();
    let gateway = AuthGateway::new(MockSessionStore::new(), provider.clone());

    let err = gateway.login("alex.university.edu", "secret1").await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(provider.call_count(), 0);
}

#[tokio::test]
async fn short_password_fails_signup_validation() {
    let provider = provider();
    let gateway = AuthGateway::new(MockSessionStore::new(), provider.clone());

    let err = gateway
        .signup("Jamie", "Chen", "jamie@university.edu", "12345")
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(provider.call_count(), 0);
    assert!(!gateway.is_authenticated().await);
}

#[tokio::test]
async fn logout_clears_local_session_when_remote_sign_out_fails() {
    let provider = provider();
    let store = MockSessionStore::new();
    let gateway = AuthGateway::new(store.clone(), provider.clone());

    gateway.login("alex@university.edu", "secret1").await.unwrap();
    assert!(store.stored().is_some());

    provider.fail_sign_out(true);
    gateway.logout().await;

    assert!(!gateway.is_authenticated().await);
    assert!(store.stored().is_none());
    assert!(store.load().await.is_none());
}

#[tokio::test]
async fn logout_clears_context_when_identity_service_is_offline() {
    let provider = provider();
    let gateway = AuthGateway::new(MockSessionStore::new(), provider.clone());
    gateway.login("alex@university.edu", "secret1").await.unwrap();

    provider.set_offline(true);
    gateway.logout().await;

    assert!(gateway.current_session().await.is_none());
}

#[tokio::test]
async fn session_survives_restart_with_file_store() {
    let dir = temp_dir();

    let first_run = AuthGateway::new(FileSessionStore::new(&dir), provider());
    let session = first_run.login("alex@university.edu", "secret1").await.unwrap();

    let second_run = AuthGateway::new(FileSessionStore::new(&dir), provider());
    assert_eq!(second_run.restore().await, Some(session));

    second_run.logout().await;

    let third_run = AuthGateway::new(FileSessionStore::new(&dir), provider());
    assert!(third_run.restore().await.is_none());

    let _ = std::fs::remove_dir_all(&dir);
}
