//! Identity provider trait.

use std::future::Future;

use serde::{Deserialize, Serialize};
use univent_core::Result;
use univent_core::types::{Session, SessionToken};

/// Account details collected by the signup form.
#[derive(Clone, Serialize, Deserialize)]
pub struct SignUpRequest {
    /// Given name
    pub first_name: String,
    /// Family name
    pub last_name: String,
    /// Email address (unique per account)
    pub email: String,
    /// Plain-text password, only ever handed to the identity service
    pub password: String,
}

impl std::fmt::Debug for SignUpRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignUpRequest")
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("email", &self.email)
            .field("password", &"***")
            .finish()
    }
}

/// Identity provider.
///
/// This trait abstracts over the remote identity service (accounts,
/// credentials, verification mail).
///
/// Callers validate input before reaching the provider; implementations only
/// report what the remote side decided.
pub trait IdentityProvider: Send + Sync {
    /// Exchange credentials for a session.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Credentials don't match → `UniventError::InvalidCredentials`
    /// - Network request fails → `UniventError::Network`
    fn sign_in(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = Result<Session>> + Send;

    /// Create an unverified student account and sign it in.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Email already registered → `UniventError::Conflict(EmailTaken)`
    /// - Network request fails → `UniventError::Network`
    fn sign_up(&self, request: &SignUpRequest) -> impl Future<Output = Result<Session>> + Send;

    /// Revoke a session token remotely.
    ///
    /// # Errors
    ///
    /// Returns error if network request fails.
    fn sign_out(&self, token: &SessionToken) -> impl Future<Output = Result<()>> + Send;

    /// Send the verification mail again.
    ///
    /// # Errors
    ///
    /// Returns error if network request fails.
    fn resend_verification(&self, email: &str) -> impl Future<Output = Result<()>> + Send;

    /// Send a password reset mail.
    ///
    /// # Errors
    ///
    /// Returns error if network request fails.
    fn reset_password(&self, email: &str) -> impl Future<Output = Result<()>> + Send;
}
