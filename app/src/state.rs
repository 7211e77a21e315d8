//! Composition root.
//!
//! Builds every service once at startup and hands them out as one value.
//! Screens receive the session from [`AppState::auth`] and pass it to the
//! event services explicitly.

use std::sync::Arc;

use univent_auth::mocks::MockIdentityProvider;
use univent_auth::{AuthGateway, FileSessionStore};
use univent_core::environment::{Clock, SystemClock};
use univent_core::types::Currency;
use univent_events::{
    EventService, InMemoryEventRepository, MockPaymentGateway, ParticipationEnvironment,
    ParticipationService,
};

use crate::config::Config;

/// Gateway type used by the app
pub type AppAuthGateway = AuthGateway<FileSessionStore, MockIdentityProvider>;

/// Services shared by every screen.
///
/// Cloning is cheap; clones share all backends.
#[derive(Clone)]
pub struct AppState {
    /// Session owner
    pub auth: Arc<AppAuthGateway>,
    /// Browse, create and cancel events
    pub events: EventService,
    /// Join and purchase
    pub participation: ParticipationService,
    /// Identity backend, for seeding accounts
    pub identity: MockIdentityProvider,
    /// Payment backend, for inspecting charges and refunds
    pub payments: MockPaymentGateway,
    /// Currency for new paid events
    pub default_currency: Currency,
}

impl AppState {
    /// Wire the in-memory backends and the on-disk session store.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let identity = MockIdentityProvider::new();
        let payments = MockPaymentGateway::with_confirmation_delay(config.confirmation_delay());
        let repository = InMemoryEventRepository::with_clock(Arc::clone(&clock));

        let participation = ParticipationService::new(
            ParticipationEnvironment::new(
                Arc::clone(&clock),
                Arc::new(repository.clone()),
                Arc::new(payments.clone()),
            ),
            config.workflow_timeout(),
        );

        Self {
            auth: Arc::new(AuthGateway::new(
                FileSessionStore::new(config.data_dir.clone()),
                identity.clone(),
            )),
            events: EventService::new(Arc::new(repository), clock),
            participation,
            identity,
            payments,
            default_currency: Currency::new(&config.payments.default_currency),
        }
    }
}
