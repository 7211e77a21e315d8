//! Mock identity provider for testing.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use base64::Engine;
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use rand::RngCore;
use sha2::{Digest, Sha256};
use univent_core::types::{Session, SessionToken, User, UserId, UserRole};
use univent_core::{ConflictReason, Result, UniventError};

use crate::providers::{IdentityProvider, SignUpRequest};

#[derive(Debug, Clone)]
struct Account {
    user: User,
    password_digest: String,
}

/// Mock identity provider.
///
/// Keeps accounts in memory keyed by lowercase email, with passwords stored
/// as SHA-256 digests. Every remote call is counted so tests can assert that
/// validation failures never reach the provider.
#[derive(Debug, Clone, Default)]
pub struct MockIdentityProvider {
    accounts: Arc<Mutex<HashMap<String, Account>>>,
    calls: Arc<AtomicUsize>,
    offline: Arc<AtomicBool>,
    fail_sign_out: Arc<AtomicBool>,
    verification_requests: Arc<Mutex<Vec<String>>>,
    password_resets: Arc<Mutex<Vec<String>>>,
}

fn digest(password: &str) -> String {
    STANDARD.encode(Sha256::digest(password.as_bytes()))
}

fn issue_token() -> SessionToken {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    SessionToken::new(URL_SAFE_NO_PAD.encode(bytes))
}

fn lock_failed() -> UniventError {
    UniventError::Network("Mutex lock failed".to_string())
}

impl MockIdentityProvider {
    /// Create a provider with no accounts.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an existing account with the given password.
    #[must_use]
    pub fn with_account(self, user: User, password: &str) -> Self {
        if let Ok(mut accounts) = self.accounts.lock() {
            accounts.insert(
                user.email.to_lowercase(),
                Account {
                    user,
                    password_digest: digest(password),
                },
            );
        }
        self
    }

    /// Simulate an unreachable identity service.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Make remote sign-out fail while everything else keeps working.
    pub fn fail_sign_out(&self, fail: bool) {
        self.fail_sign_out.store(fail, Ordering::SeqCst);
    }

    /// Number of remote calls made so far.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Emails a verification mail was requested for.
    #[must_use]
    pub fn verification_requests(&self) -> Vec<String> {
        self.verification_requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }

    /// Emails a password reset was requested for.
    #[must_use]
    pub fn password_resets(&self) -> Vec<String> {
        self.password_resets
            .lock()
            .map(|resets| resets.clone())
            .unwrap_or_default()
    }

    fn begin_call(&self) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.offline.load(Ordering::SeqCst) {
            return Err(UniventError::Network("identity service unreachable".to_string()));
        }
        Ok(())
    }

    fn record(log: &Mutex<Vec<String>>, email: &str) -> Result<()> {
        log.lock().map_err(|_| lock_failed())?.push(email.to_string());
        Ok(())
    }
}

impl IdentityProvider for MockIdentityProvider {
    fn sign_in(&self, email: &str, password: &str) -> impl Future<Output = Result<Session>> + Send {
        let started = self.begin_call();
        let accounts = Arc::clone(&self.accounts);
        let email = email.to_lowercase();
        let password_digest = digest(password);

        async move {
            started?;

            let account = accounts
                .lock()
                .map_err(|_| lock_failed())?
                .get(&email)
                .cloned()
                .ok_or(UniventError::InvalidCredentials)?;

            if account.password_digest != password_digest {
                return Err(UniventError::InvalidCredentials);
            }

            Ok(Session {
                user: account.user,
                token: issue_token(),
            })
        }
    }

    fn sign_up(&self, request: &SignUpRequest) -> impl Future<Output = Result<Session>> + Send {
        let started = self.begin_call();
        let accounts = Arc::clone(&self.accounts);
        let request = request.clone();

        async move {
            started?;

            let key = request.email.to_lowercase();
            let mut accounts = accounts.lock().map_err(|_| lock_failed())?;

            if accounts.contains_key(&key) {
                return Err(UniventError::Conflict(ConflictReason::EmailTaken));
            }

            let user = User {
                id: UserId::new(),
                email: request.email,
                first_name: request.first_name,
                last_name: request.last_name,
                university: String::new(),
                major: String::new(),
                is_verified: false,
                role: UserRole::Student,
                avatar_url: None,
            };

            accounts.insert(
                key,
                Account {
                    user: user.clone(),
                    password_digest: digest(&request.password),
                },
            );

            Ok(Session {
                user,
                token: issue_token(),
            })
        }
    }

    fn sign_out(&self, _token: &SessionToken) -> impl Future<Output = Result<()>> + Send {
        let started = self.begin_call();
        let fail = self.fail_sign_out.load(Ordering::SeqCst);

        async move {
            started?;
            if fail {
                return Err(UniventError::Network("sign-out request failed".to_string()));
            }
            Ok(())
        }
    }

    fn resend_verification(&self, email: &str) -> impl Future<Output = Result<()>> + Send {
        let started = self.begin_call();
        let recorded = started.and_then(|()| Self::record(&self.verification_requests, email));
        async move { recorded }
    }

    fn reset_password(&self, email: &str) -> impl Future<Output = Result<()>> + Send {
        let started = self.begin_call();
        let recorded = started.and_then(|()| Self::record(&self.password_resets, email));
        async move { recorded }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use univent_testing::fixtures;

    #[tokio::test]
    async fn sign_in_checks_password_digest() {
        let user = fixtures::student("alex@university.edu");
        let provider = MockIdentityProvider::new().with_account(user.clone(), "secret1");

        let session = provider.sign_in("ALEX@university.edu", "secret1").await.unwrap();
        assert_eq!(session.user, user);
        assert!(!session.token.as_str().is_empty());

        let err = provider.sign_in("alex@university.edu", "wrong!!").await.unwrap_err();
        assert_eq!(err, UniventError::InvalidCredentials);
        assert_eq!(provider.call_count(), 2);
    }

    #[tokio::test]
    async fn tokens_are_unique() {
        let provider = MockIdentityProvider::new()
            .with_account(fixtures::student("alex@university.edu"), "secret1");

        let first = provider.sign_in("alex@university.edu", "secret1").await.unwrap();
        let second = provider.sign_in("alex@university.edu", "secret1").await.unwrap();
        assert_ne!(first.token, second.token);
    }

    #[tokio::test]
    async fn sign_up_rejects_taken_email() {
        let provider = MockIdentityProvider::new()
            .with_account(fixtures::student("alex@university.edu"), "secret1");

        let request = SignUpRequest {
            first_name: "Alex".to_string(),
            last_name: "Again".to_string(),
            email: "Alex@University.edu".to_string(),
            password: "secret2".to_string(),
        };

        assert_eq!(
            provider.sign_up(&request).await.unwrap_err(),
            UniventError::Conflict(ConflictReason::EmailTaken)
        );
    }

    #[tokio::test]
    async fn offline_provider_reports_network_errors() {
        let provider = MockIdentityProvider::new();
        provider.set_offline(true);

        let err = provider.reset_password("alex@university.edu").await.unwrap_err();
        assert!(err.is_retryable());
        assert!(provider.password_resets().is_empty());
    }
}
