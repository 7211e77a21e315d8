//! Session store trait.

use std::future::Future;

use univent_core::Result;
use univent_core::types::{Session, SessionToken, User};

/// Session store.
///
/// Durable local storage for the signed-in user, their access token, and
/// the onboarding flag.
///
/// # Implementation Notes
///
/// - The user and token are written as a pair: after a failed `save` a later
///   `load` sees either the previous pair or nothing, never a mix
/// - Reads never fail; storage or decode problems are logged and treated as
///   "no session"
pub trait SessionStore: Send + Sync {
    /// Load the persisted session.
    ///
    /// # Returns
    ///
    /// The session if both user and token are present and decodable.
    fn load(&self) -> impl Future<Output = Option<Session>> + Send;

    /// Persist user and token.
    ///
    /// # Errors
    ///
    /// Returns `UniventError::Storage` if either write fails.
    fn save(&self, user: &User, token: &SessionToken) -> impl Future<Output = Result<()>> + Send;

    /// Remove the persisted session.
    ///
    /// Clearing an empty store succeeds.
    ///
    /// # Errors
    ///
    /// Returns `UniventError::Storage` if an entry exists but cannot be
    /// removed.
    fn clear(&self) -> impl Future<Output = Result<()>> + Send;

    /// Whether onboarding was completed on this device.
    ///
    /// `false` on any failure.
    fn is_onboarding_completed(&self) -> impl Future<Output = bool> + Send;

    /// Record that onboarding was completed.
    ///
    /// Failures are logged, never returned.
    fn mark_onboarding_completed(&self) -> impl Future<Output = ()> + Send;
}
