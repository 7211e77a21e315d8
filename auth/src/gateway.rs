//! Authentication gateway.
//!
//! [`AuthGateway`] is the single owner of "who is signed in" for the running
//! app. It is built once at startup from a [`SessionStore`] and an
//! [`IdentityProvider`]; other components receive the current [`Session`]
//! explicitly instead of reading ambient state.

use tokio::sync::RwLock;
use univent_core::Result;
use univent_core::types::Session;

use crate::providers::{IdentityProvider, SessionStore, SignUpRequest};
use crate::validation::{require, validate_email, validate_password};

/// Authentication gateway.
///
/// Validates credentials locally, delegates to the identity provider, keeps
/// the session store in sync, and holds the in-memory session context.
pub struct AuthGateway<S, P> {
    store: S,
    provider: P,
    session: RwLock<Option<Session>>,
}

impl<S, P> AuthGateway<S, P>
where
    S: SessionStore,
    P: IdentityProvider,
{
    /// Create a gateway with an empty session context.
    ///
    /// Call [`restore`](Self::restore) to pick up a persisted session.
    #[must_use]
    pub fn new(store: S, provider: P) -> Self {
        Self {
            store,
            provider,
            session: RwLock::new(None),
        }
    }

    /// Sign in with email and password.
    ///
    /// Input is validated before the identity service is contacted. A session
    /// that cannot be persisted still signs the user in for this process.
    ///
    /// # Errors
    ///
    /// - `UniventError::Validation`: missing or malformed email, short password
    /// - `UniventError::InvalidCredentials`: the identity service rejected the pair
    /// - `UniventError::Network`: the identity service is unreachable
    #[tracing::instrument(skip_all)]
    pub async fn login(&self, email: &str, password: &str) -> Result<Session> {
        validate_email(email)?;
        validate_password(password)?;

        let session = self.provider.sign_in(email.trim(), password).await?;
        self.establish(session.clone()).await;

        tracing::info!(user_id = %session.user.id, "User signed in");
        Ok(session)
    }

    /// Create an account and sign it in.
    ///
    /// # Errors
    ///
    /// - `UniventError::Validation`: a blank field, malformed email, or short password
    /// - `UniventError::Conflict(EmailTaken)`: the email already has an account
    /// - `UniventError::Network`: the identity service is unreachable
    #[tracing::instrument(skip_all)]
    pub async fn signup(
        &self,
        first_name: &str,
        last_name: &str,
        email: &str,
        password: &str,
    ) -> Result<Session> {
        require("first_name", first_name)?;
        require("last_name", last_name)?;
        validate_email(email)?;
        validate_password(password)?;

        let request = SignUpRequest {
            first_name: first_name.trim().to_string(),
            last_name: last_name.trim().to_string(),
            email: email.trim().to_string(),
            password: password.to_string(),
        };

        let session = self.provider.sign_up(&request).await?;
        self.establish(session.clone()).await;

        tracing::info!(user_id = %session.user.id, "Account created");
        Ok(session)
    }

    /// Sign out.
    ///
    /// Always succeeds locally: the session context and the session store
    /// are cleared even when the remote sign-out fails.
    #[tracing::instrument(skip_all)]
    pub async fn logout(&self) {
        let previous = self.session.write().await.take();

        if let Some(session) = previous {
            if let Err(error) = self.provider.sign_out(&session.token).await {
                tracing::warn!(%error, "Remote sign-out failed; signing out locally");
            }
            tracing::info!(user_id = %session.user.id, "User signed out");
        }

        if let Err(error) = self.store.clear().await {
            tracing::error!(%error, "Failed to clear persisted session");
        }
    }

    /// Ask the identity service to send the verification mail again.
    ///
    /// # Errors
    ///
    /// - `UniventError::Validation`: blank email
    /// - `UniventError::Network`: the identity service is unreachable
    #[tracing::instrument(skip_all)]
    pub async fn resend_verification(&self, email: &str) -> Result<()> {
        require("email", email)?;
        self.provider.resend_verification(email.trim()).await
    }

    /// Ask the identity service to send a password reset mail.
    ///
    /// # Errors
    ///
    /// - `UniventError::Validation`: missing or malformed email
    /// - `UniventError::Network`: the identity service is unreachable
    #[tracing::instrument(skip_all)]
    pub async fn reset_password(&self, email: &str) -> Result<()> {
        validate_email(email)?;
        self.provider.reset_password(email.trim()).await
    }

    /// Load the persisted session into the context.
    ///
    /// Returns the restored session, or `None` when nothing usable was stored.
    pub async fn restore(&self) -> Option<Session> {
        let restored = self.store.load().await;

        match &restored {
            Some(session) => tracing::info!(user_id = %session.user.id, "Session restored"),
            None => tracing::debug!("No persisted session"),
        }

        *self.session.write().await = restored.clone();
        restored
    }

    /// The signed-in session, if any.
    pub async fn current_session(&self) -> Option<Session> {
        self.session.read().await.clone()
    }

    /// Whether a user is signed in.
    pub async fn is_authenticated(&self) -> bool {
        self.session.read().await.is_some()
    }

    /// The backing session store.
    #[must_use]
    pub const fn session_store(&self) -> &S {
        &self.store
    }

    async fn establish(&self, session: Session) {
        if let Err(error) = self.store.save(&session.user, &session.token).await {
            tracing::warn!(%error, "Session not persisted; it will not survive a restart");
        }
        *self.session.write().await = Some(session);
    }
}
