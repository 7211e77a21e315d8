//! # Univent Runtime
//!
//! The [`Store`] owns a piece of state, runs a reducer over every action sent
//! to it, and executes the effects the reducer returns. Actions produced by
//! effects are fed back into the reducer and broadcast to observers, which is
//! how request/response callers wait for the outcome of a workflow.
//!
//! ```ignore
//! let store = Store::new(ParticipationState::new(event_id, session), ParticipationReducer, env);
//!
//! let outcome = store
//!     .send_and_wait_for(ParticipationAction::JoinFreeEvent, |a| a.is_terminal(), timeout)
//!     .await?;
//! ```

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{RwLock, broadcast};
use univent_core::effect::Effect;
use univent_core::reducer::Reducer;

/// Default capacity of the action broadcast channel
const DEFAULT_BROADCAST_CAPACITY: usize = 16;

/// Errors returned by the [`Store`]
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Timeout waiting for terminal action
    ///
    /// Returned by `send_and_wait_for` when the timeout expires before
    /// a matching action is received.
    #[error("Timeout waiting for action")]
    Timeout,

    /// The action broadcast channel closed while waiting
    #[error("Action channel closed")]
    ChannelClosed,
}

/// The Store - runtime coordinator for a reducer
///
/// The Store manages:
/// 1. State (behind `RwLock` for concurrent access)
/// 2. Reducer (business logic)
/// 3. Environment (injected dependencies)
/// 4. Effect execution (with feedback loop)
///
/// Cloning a store is cheap; clones share state and the broadcast channel.
pub struct Store<S, A, E, R>
where
    R: Reducer<State = S, Action = A, Environment = E>,
{
    state: Arc<RwLock<S>>,
    reducer: Arc<R>,
    environment: Arc<E>,
    /// Every action produced by an effect is broadcast here after it has
    /// been reduced.
    action_broadcast: broadcast::Sender<A>,
}

impl<S, A, E, R> Clone for Store<S, A, E, R>
where
    R: Reducer<State = S, Action = A, Environment = E>,
{
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            reducer: Arc::clone(&self.reducer),
            environment: Arc::clone(&self.environment),
            action_broadcast: self.action_broadcast.clone(),
        }
    }
}

impl<S, A, E, R> Store<S, A, E, R>
where
    R: Reducer<State = S, Action = A, Environment = E> + Send + Sync + 'static,
    A: Send + Clone + std::fmt::Debug + 'static,
    S: Send + Sync + 'static,
    E: Send + Sync + 'static,
{
    /// Create a new store with initial state, reducer, and environment
    #[must_use]
    pub fn new(initial_state: S, reducer: R, environment: E) -> Self {
        Self::with_broadcast_capacity(initial_state, reducer, environment, DEFAULT_BROADCAST_CAPACITY)
    }

    /// Create a store whose action broadcast buffers `capacity` actions
    #[must_use]
    pub fn with_broadcast_capacity(
        initial_state: S,
        reducer: R,
        environment: E,
        capacity: usize,
    ) -> Self {
        let (action_broadcast, _) = broadcast::channel(capacity.max(1));

        Self {
            state: Arc::new(RwLock::new(initial_state)),
            reducer: Arc::new(reducer),
            environment: Arc::new(environment),
            action_broadcast,
        }
    }

    /// Send an action to the store
    ///
    /// The reducer runs while holding the state write lock; effects are then
    /// started on spawned tasks. `send()` returns once effects are started,
    /// not when they complete.
    #[tracing::instrument(skip(self, action), name = "store_send")]
    pub async fn send(&self, action: A) {
        tracing::trace!(?action, "Reducing action");

        let effects = {
            let mut state = self.state.write().await;
            self.reducer.reduce(&mut state, action, &self.environment)
        };

        for effect in effects {
            self.execute_effect(effect);
        }
    }

    /// Send an action and wait for a matching result action
    ///
    /// Subscribes to the action broadcast before sending, so a result produced
    /// immediately cannot be missed.
    ///
    /// # Errors
    ///
    /// - [`StoreError::Timeout`]: no matching action arrived within `timeout`
    /// - [`StoreError::ChannelClosed`]: the broadcast channel closed
    pub async fn send_and_wait_for<F>(
        &self,
        action: A,
        predicate: F,
        timeout: Duration,
    ) -> Result<A, StoreError>
    where
        F: Fn(&A) -> bool,
    {
        // Subscribe BEFORE sending to avoid race condition
        let mut rx = self.action_broadcast.subscribe();

        self.send(action).await;

        tokio::time::timeout(timeout, async {
            loop {
                match rx.recv().await {
                    Ok(action) if predicate(&action) => return Ok(action),
                    Ok(_) => {},
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Action observer lagged");
                    },
                    Err(broadcast::error::RecvError::Closed) => {
                        return Err(StoreError::ChannelClosed);
                    },
                }
            }
        })
        .await
        .map_err(|_| StoreError::Timeout)?
    }

    /// Subscribe to actions produced by effects
    #[must_use]
    pub fn subscribe_actions(&self) -> broadcast::Receiver<A> {
        self.action_broadcast.subscribe()
    }

    /// Read current state via a closure
    ///
    /// ```ignore
    /// let phase = store.state(|s| s.phase).await;
    /// ```
    pub async fn state<F, T>(&self, f: F) -> T
    where
        F: FnOnce(&S) -> T,
    {
        let state = self.state.read().await;
        f(&state)
    }

    fn execute_effect(&self, effect: Effect<A>) {
        match effect {
            Effect::None => {
                tracing::trace!("Executing Effect::None (no-op)");
                metrics::counter!("store.effects.executed", "type" => "none").increment(1);
            },
            Effect::Future(fut) => {
                tracing::trace!("Executing Effect::Future");
                metrics::counter!("store.effects.executed", "type" => "future").increment(1);

                let store = self.clone();
                tokio::spawn(async move {
                    if let Some(action) = fut.await {
                        store.send(action.clone()).await;
                        // Observers see the action only after it has been reduced
                        let _ = store.action_broadcast.send(action);
                    }
                });
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use univent_core::{SmallVec, smallvec};

    #[derive(Clone, Debug, Default)]
    struct CapacityState {
        taken: u32,
        log: Vec<&'static str>,
    }

    #[derive(Clone, Debug, PartialEq)]
    enum CapacityAction {
        Claim,
        Claimed,
        Ping,
    }

    struct CapacityReducer;

    impl Reducer for CapacityReducer {
        type State = CapacityState;
        type Action = CapacityAction;
        type Environment = ();

        fn reduce(
            &self,
            state: &mut CapacityState,
            action: CapacityAction,
            _env: &(),
        ) -> SmallVec<[Effect<CapacityAction>; 4]> {
            match action {
                CapacityAction::Claim => {
                    state.log.push("claim");
                    smallvec![Effect::future(async { Some(CapacityAction::Claimed) })]
                },
                CapacityAction::Claimed => {
                    state.taken += 1;
                    state.log.push("claimed");
                    SmallVec::new()
                },
                CapacityAction::Ping => smallvec![Effect::None],
            }
        }
    }

    #[tokio::test]
    async fn feedback_action_is_reduced_before_broadcast() {
        let store = Store::new(CapacityState::default(), CapacityReducer, ());

        let result = store
            .send_and_wait_for(
                CapacityAction::Claim,
                |a| *a == CapacityAction::Claimed,
                Duration::from_secs(1),
            )
            .await
            .unwrap();

        assert_eq!(result, CapacityAction::Claimed);
        assert_eq!(store.state(|s| s.taken).await, 1);
        assert_eq!(store.state(|s| s.log.clone()).await, vec!["claim", "claimed"]);
    }

    #[tokio::test]
    async fn waiting_for_an_action_that_never_comes_times_out() {
        let store = Store::new(CapacityState::default(), CapacityReducer, ());

        let result = store
            .send_and_wait_for(
                CapacityAction::Ping,
                |a| *a == CapacityAction::Claimed,
                Duration::from_millis(50),
            )
            .await;

        assert_eq!(result, Err(StoreError::Timeout));
    }

    #[tokio::test]
    async fn clones_share_state() {
        let store = Store::new(CapacityState::default(), CapacityReducer, ());
        let clone = store.clone();
        let mut rx = clone.subscribe_actions();

        store.send(CapacityAction::Claim).await;
        assert_eq!(rx.recv().await.unwrap(), CapacityAction::Claimed);
        assert_eq!(clone.state(|s| s.taken).await, 1);
    }
}
