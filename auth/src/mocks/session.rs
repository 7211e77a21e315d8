//! Mock session store for testing.

use std::future::Future;
use std::sync::{Arc, Mutex};

use univent_core::types::{Session, SessionToken, User};
use univent_core::{Result, UniventError};

use crate::providers::SessionStore;

#[derive(Debug, Default)]
struct Inner {
    session: Option<Session>,
    onboarding_completed: bool,
    fail_saves: bool,
    fail_clears: bool,
}

/// Mock session store.
///
/// Uses in-memory storage for testing. Saves and clears can be made to fail
/// to exercise the error paths of callers.
#[derive(Debug, Clone, Default)]
pub struct MockSessionStore {
    inner: Arc<Mutex<Inner>>,
}

fn lock_failed() -> UniventError {
    UniventError::Storage("Mutex lock failed".to_string())
}

impl MockSessionStore {
    /// Create an empty mock session store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already holds `session`.
    #[must_use]
    pub fn with_session(session: Session) -> Self {
        let store = Self::new();
        if let Ok(mut inner) = store.inner.lock() {
            inner.session = Some(session);
        }
        store
    }

    /// Make subsequent `save` calls fail.
    pub fn fail_saves(&self, fail: bool) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.fail_saves = fail;
        }
    }

    /// Make subsequent `clear` calls fail.
    pub fn fail_clears(&self, fail: bool) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.fail_clears = fail;
        }
    }

    /// Set the onboarding flag directly.
    pub fn set_onboarding_completed(&self, completed: bool) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.onboarding_completed = completed;
        }
    }

    /// Currently stored session (for assertions).
    #[must_use]
    pub fn stored(&self) -> Option<Session> {
        self.inner.lock().ok().and_then(|inner| inner.session.clone())
    }
}

impl SessionStore for MockSessionStore {
    fn load(&self) -> impl Future<Output = Option<Session>> + Send {
        let stored = self.stored();
        async move { stored }
    }

    fn save(&self, user: &User, token: &SessionToken) -> impl Future<Output = Result<()>> + Send {
        let inner = Arc::clone(&self.inner);
        let session = Session {
            user: user.clone(),
            token: token.clone(),
        };

        async move {
            let mut guard = inner.lock().map_err(|_| lock_failed())?;

            if guard.fail_saves {
                return Err(UniventError::Storage("disk full".to_string()));
            }

            guard.session = Some(session);
            Ok(())
        }
    }

    fn clear(&self) -> impl Future<Output = Result<()>> + Send {
        let inner = Arc::clone(&self.inner);

        async move {
            let mut guard = inner.lock().map_err(|_| lock_failed())?;

            if guard.fail_clears {
                return Err(UniventError::Storage("permission denied".to_string()));
            }

            guard.session = None;
            Ok(())
        }
    }

    fn is_onboarding_completed(&self) -> impl Future<Output = bool> + Send {
        let completed = self
            .inner
            .lock()
            .map(|inner| inner.onboarding_completed)
            .unwrap_or(false);
        async move { completed }
    }

    fn mark_onboarding_completed(&self) -> impl Future<Output = ()> + Send {
        self.set_onboarding_completed(true);
        async {}
    }
}
