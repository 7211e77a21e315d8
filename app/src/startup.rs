//! Startup routing.
//!
//! Decides which screen the app opens on from the persisted session and the
//! onboarding flag.

use serde::{Deserialize, Serialize};
use univent_auth::{AuthGateway, IdentityProvider, SessionStore};

/// First screen shown after launch
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    /// Event feed, for signed-in users
    Home,
    /// Sign-in screen, for returning users
    Login,
    /// Welcome slides, shown once per install
    Onboarding,
}

/// Restore the persisted session and pick the first screen.
///
/// A restored session opens `Home`. Otherwise users who finished onboarding
/// land on `Login` and everyone else on `Onboarding`.
pub async fn initial_route<S, P>(gateway: &AuthGateway<S, P>) -> Route
where
    S: SessionStore,
    P: IdentityProvider,
{
    let route = if gateway.restore().await.is_some() {
        Route::Home
    } else if gateway.session_store().is_onboarding_completed().await {
        Route::Login
    } else {
        Route::Onboarding
    };

    tracing::info!(?route, "Initial route selected");
    route
}

/// Remember that the welcome slides were shown.
pub async fn finish_onboarding<S, P>(gateway: &AuthGateway<S, P>)
where
    S: SessionStore,
    P: IdentityProvider,
{
    gateway.session_store().mark_onboarding_completed().await;
    tracing::debug!("Onboarding completed");
}
