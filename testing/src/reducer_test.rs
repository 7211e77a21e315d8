//! Given-When-Then harness for reducers

#![allow(clippy::module_name_repetitions)] // ReducerTest is the natural name

use univent_core::{effect::Effect, reducer::Reducer};

/// Type alias for state assertion functions
type StateAssertion<S> = Box<dyn FnOnce(&S)>;

/// Type alias for effect assertion functions
type EffectAssertion<A> = Box<dyn FnOnce(&[Effect<A>])>;

/// Fluent API for testing reducers with Given-When-Then syntax
///
/// # Example
///
/// ```ignore
/// ReducerTest::new(ParticipationReducer::new())
///     .with_env(test_env())
///     .given_state(ParticipationState::new(event_id, None))
///     .when_action(ParticipationAction::JoinFreeEvent)
///     .then_state(|state| assert_eq!(state.phase, ParticipationPhase::NotJoined))
///     .then_effects(|effects| assert_eq!(effects.len(), 1))
///     .run();
/// ```
pub struct ReducerTest<R, S, A, E>
where
    R: Reducer<State = S, Action = A, Environment = E>,
{
    reducer: R,
    environment: Option<E>,
    initial_state: Option<S>,
    actions: Vec<A>,
    state_assertions: Vec<StateAssertion<S>>,
    effect_assertions: Vec<EffectAssertion<A>>,
}

impl<R, S, A, E> ReducerTest<R, S, A, E>
where
    R: Reducer<State = S, Action = A, Environment = E>,
{
    /// Create a new reducer test with the given reducer
    #[must_use]
    pub const fn new(reducer: R) -> Self {
        Self {
            reducer,
            environment: None,
            initial_state: None,
            actions: Vec::new(),
            state_assertions: Vec::new(),
            effect_assertions: Vec::new(),
        }
    }

    /// Set the environment for the test
    #[must_use]
    pub fn with_env(mut self, env: E) -> Self {
        self.environment = Some(env);
        self
    }

    /// Set the initial state (Given)
    #[must_use]
    pub fn given_state(mut self, state: S) -> Self {
        self.initial_state = Some(state);
        self
    }

    /// Queue an action (When)
    ///
    /// May be called several times; actions are reduced in order and the
    /// effect assertions see the effects of the last one.
    #[must_use]
    pub fn when_action(mut self, action: A) -> Self {
        self.actions.push(action);
        self
    }

    /// Add an assertion about the resulting state (Then)
    #[must_use]
    pub fn then_state<F>(mut self, assertion: F) -> Self
    where
        F: FnOnce(&S) + 'static,
    {
        self.state_assertions.push(Box::new(assertion));
        self
    }

    /// Add an assertion about the effects of the last action (Then)
    #[must_use]
    pub fn then_effects<F>(mut self, assertion: F) -> Self
    where
        F: FnOnce(&[Effect<A>]) + 'static,
    {
        self.effect_assertions.push(Box::new(assertion));
        self
    }

    /// Run the test and execute all assertions
    ///
    /// # Panics
    ///
    /// Panics if initial state, action, or environment is not set,
    /// or if any assertions fail.
    #[allow(clippy::panic)] // Test code can panic
    #[allow(clippy::expect_used)] // Test code can use expect
    pub fn run(self) {
        let mut state = self
            .initial_state
            .expect("Initial state must be set with given_state()");

        let env = self
            .environment
            .expect("Environment must be set with with_env()");

        assert!(!self.actions.is_empty(), "At least one action must be set with when_action()");

        let mut effects = Vec::new();
        for action in self.actions {
            effects = self.reducer.reduce(&mut state, action, &env).into_vec();
        }

        for assertion in self.state_assertions {
            assertion(&state);
        }

        for assertion in self.effect_assertions {
            assertion(&effects);
        }
    }
}

/// Helper assertions for effects
pub mod assertions {
    use univent_core::effect::Effect;

    /// Assert that there are no effects
    ///
    /// # Panics
    ///
    /// Panics if effects is not empty.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_no_effects<A>(effects: &[Effect<A>]) {
        assert!(
            effects.iter().all(Effect::is_none),
            "Expected no effects, but found {}: {:?}",
            effects.len(),
            effects
        );
    }

    /// Assert the number of effects
    ///
    /// # Panics
    ///
    /// Panics if the number of effects doesn't match expected.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_effects_count<A>(effects: &[Effect<A>], expected: usize) {
        assert_eq!(
            effects.len(),
            expected,
            "Expected {} effects, but found {}",
            expected,
            effects.len()
        );
    }

    /// Assert that effects contain at least one Future effect
    ///
    /// # Panics
    ///
    /// Panics if no Future effect is found.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_has_future_effect<A>(effects: &[Effect<A>]) {
        assert!(
            effects.iter().any(|e| matches!(e, Effect::Future(_))),
            "Expected at least one Future effect, but none found"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use univent_core::{SmallVec, smallvec};

    #[derive(Clone, Debug)]
    struct SeatState {
        taken: u32,
        capacity: u32,
    }

    #[derive(Clone, Debug)]
    enum SeatAction {
        Take,
        Release,
    }

    struct SeatReducer;

    impl Reducer for SeatReducer {
        type State = SeatState;
        type Action = SeatAction;
        type Environment = ();

        fn reduce(
            &self,
            state: &mut SeatState,
            action: SeatAction,
            _env: &(),
        ) -> SmallVec<[Effect<SeatAction>; 4]> {
            match action {
                SeatAction::Take if state.taken < state.capacity => {
                    state.taken += 1;
                    smallvec![Effect::future(async { None })]
                },
                SeatAction::Take => SmallVec::new(),
                SeatAction::Release => {
                    state.taken = state.taken.saturating_sub(1);
                    smallvec![Effect::None]
                },
            }
        }
    }

    #[test]
    fn take_until_full() {
        ReducerTest::new(SeatReducer)
            .with_env(())
            .given_state(SeatState { taken: 0, capacity: 2 })
            .when_action(SeatAction::Take)
            .when_action(SeatAction::Take)
            .when_action(SeatAction::Take)
            .then_state(|state| assert_eq!(state.taken, 2))
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn take_produces_future() {
        ReducerTest::new(SeatReducer)
            .with_env(())
            .given_state(SeatState { taken: 0, capacity: 1 })
            .when_action(SeatAction::Take)
            .then_effects(|effects| {
                assertions::assert_effects_count(effects, 1);
                assertions::assert_has_future_effect(effects);
            })
            .run();
    }

    #[test]
    fn release_never_underflows() {
        ReducerTest::new(SeatReducer)
            .with_env(())
            .given_state(SeatState { taken: 0, capacity: 1 })
            .when_action(SeatAction::Release)
            .then_state(|state| assert_eq!(state.taken, 0))
            .then_effects(assertions::assert_no_effects)
            .run();
    }
}
