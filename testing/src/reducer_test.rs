//! Given-When-Then testing for reducers
//!
//! Reducers are pure, so most session logic can be checked without a store,
//! a runtime or any collaborator actually running.

#![allow(clippy::module_name_repetitions)] // ReducerTest is the natural name

use authflow_core::{effect::Effect, reducer::Reducer};

/// Type alias for state assertion functions
type StateAssertion<S> = Box<dyn FnOnce(&S)>;

/// Type alias for effect assertion functions
type EffectAssertion<A> = Box<dyn FnOnce(&[Effect<A>])>;

/// Fluent API for testing reducers with Given-When-Then syntax
///
/// Several actions may be queued with [`ReducerTest::when_action`]; they are
/// reduced in order and the effect assertions see the effects of the last one.
///
/// # Example
///
/// ```ignore
/// use authflow_testing::ReducerTest;
///
/// ReducerTest::new(SessionReducer::new())
///     .with_env(test_environment())
///     .given_state(SessionState::default())
///     .when_action(SessionAction::Initialize { config })
///     .then_state(|state| assert_eq!(state.init_phase(), InitPhase::InProgress))
///     .then_effects(|effects| assertions::assert_has_future_effect(effects))
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

    /// Queue an action to reduce (When)
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

    /// Assert that the queued actions leave the given state untouched (Then)
    ///
    /// # Panics
    ///
    /// Panics if called before [`given_state`](Self::given_state).
    #[must_use]
    #[allow(clippy::expect_used)] // Test code can use expect
    pub fn then_state_unchanged(self) -> Self
    where
        S: Clone + PartialEq + std::fmt::Debug + 'static,
    {
        let before = self
            .initial_state
            .clone()
            .expect("then_state_unchanged() must follow given_state()");
        self.then_state(move |after| assert_eq!(after, &before, "state changed"))
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

        assert!(
            !self.actions.is_empty(),
            "At least one action must be set with when_action()"
        );

        let env = self
            .environment
            .expect("Environment must be set with with_env()");

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
    use authflow_core::effect::Effect;

    /// Assert that there are no effects to run
    ///
    /// # Panics
    ///
    /// Panics if any effect would do something when executed.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_no_effects<A: std::fmt::Debug>(effects: &[Effect<A>]) {
        assert!(
            effects.iter().all(Effect::is_noop),
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

    /// Assert that effects contain at least one Stream effect
    ///
    /// # Panics
    ///
    /// Panics if no Stream effect is found.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_has_stream_effect<A>(effects: &[Effect<A>]) {
        assert!(
            effects.iter().any(|e| matches!(e, Effect::Stream(_))),
            "Expected at least one Stream effect, but none found"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use authflow_core::{smallvec, SmallVec};

    #[derive(Clone, Debug, PartialEq)]
    struct TestState {
        signed_in: bool,
        attempts: u32,
    }

    #[derive(Clone, Debug)]
    enum TestAction {
        SignIn,
        SignOut,
        Fetch,
    }

    struct TestReducer;

    struct TestEnv;

    impl Reducer for TestReducer {
        type State = TestState;
        type Action = TestAction;
        type Environment = TestEnv;

        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            _env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]> {
            match action {
                TestAction::SignIn => {
                    state.signed_in = true;
                    state.attempts += 1;
                    smallvec![Effect::None]
                },
                TestAction::SignOut => {
                    state.signed_in = false;
                    smallvec![Effect::None]
                },
                TestAction::Fetch => smallvec![Effect::task(async { TestAction::SignIn })],
            }
        }
    }

    fn signed_out() -> TestState {
        TestState {
            signed_in: false,
            attempts: 0,
        }
    }

    #[test]
    fn test_single_action() {
        ReducerTest::new(TestReducer)
            .with_env(TestEnv)
            .given_state(signed_out())
            .when_action(TestAction::SignIn)
            .then_state(|state| {
                assert!(state.signed_in);
                assert_eq!(state.attempts, 1);
            })
            .then_effects(|effects| {
                assertions::assert_no_effects(effects);
            })
            .run();
    }

    #[test]
    fn test_actions_reduced_in_order() {
        ReducerTest::new(TestReducer)
            .with_env(TestEnv)
            .given_state(signed_out())
            .when_action(TestAction::SignIn)
            .when_action(TestAction::SignOut)
            .when_action(TestAction::Fetch)
            .then_state(|state| {
                assert!(!state.signed_in);
                assert_eq!(state.attempts, 1);
            })
            .then_effects(|effects| {
                assertions::assert_effects_count(effects, 1);
                assertions::assert_has_future_effect(effects);
            })
            .run();
    }

    #[test]
    fn test_state_unchanged() {
        ReducerTest::new(TestReducer)
            .with_env(TestEnv)
            .given_state(signed_out())
            .when_action(TestAction::SignOut)
            .then_state_unchanged()
            .run();
    }

    #[test]
    #[should_panic(expected = "state changed")]
    fn test_state_unchanged_detects_change() {
        ReducerTest::new(TestReducer)
            .with_env(TestEnv)
            .given_state(signed_out())
            .when_action(TestAction::SignIn)
            .then_state_unchanged()
            .run();
    }

    #[test]
    fn test_assertions_no_effects() {
        assertions::assert_no_effects::<TestAction>(&[Effect::None]);
        assertions::assert_no_effects::<TestAction>(&[]);
        assertions::assert_no_effects::<TestAction>(&[Effect::merge(vec![Effect::None])]);
    }

    #[test]
    #[should_panic(expected = "Expected at least one Stream effect")]
    fn test_missing_stream_effect_fails() {
        assertions::assert_has_stream_effect::<TestAction>(&[Effect::None]);
    }
}
