//! Property tests: `AuthState` invariants hold under any action interleaving.
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use authflow::mocks::MockIdentityProvider;
use authflow::{
    AuthError, CallbackError, CallbackParams, Identity, InitPhase, MemoryPendingLoginStore,
    PendingLogin, ProviderError, ProviderSnapshot, SessionAction, SessionConfig,
    SessionEnvironment, SessionReducer, SessionState,
};
use authflow_core::effect::Effect;
use authflow_core::environment::Clock;
use authflow_core::reducer::Reducer;
use authflow_testing::{test_clock, FixedClock};
use proptest::prelude::*;
use uuid::Uuid;

type TestEnv = SessionEnvironment<MockIdentityProvider, MemoryPendingLoginStore, FixedClock>;
type TestReducer = SessionReducer<MockIdentityProvider, MemoryPendingLoginStore, FixedClock>;

fn env() -> TestEnv {
    SessionEnvironment::new(
        MockIdentityProvider::new(),
        MemoryPendingLoginStore::new(),
        test_clock(),
    )
}

fn valid_config() -> SessionConfig {
    SessionConfig::new("https://app.example.com/redirect", "PARTNER")
}

fn identity(n: u8) -> Identity {
    Identity::new(format!("user-{n}"))
}

fn id(n: u8) -> Uuid {
    Uuid::from_u128(u128::from(n))
}

fn snapshot(authenticated: bool, with_identity: bool, with_error: bool) -> ProviderSnapshot {
    ProviderSnapshot {
        is_authenticated: authenticated,
        identity: with_identity.then(|| identity(0)),
        error: with_error.then_some(ProviderError::Expired),
    }
}

fn arb_attempt() -> impl Strategy<Value = Uuid> {
    (0u8..3).prop_map(id)
}

fn arb_state_param() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec!["a", "b", ""])
}

fn arb_initialization() -> impl Strategy<Value = SessionAction> {
    prop_oneof![
        any::<bool>().prop_map(|valid| SessionAction::Initialize {
            config: if valid {
                valid_config()
            } else {
                SessionConfig::new("", "")
            },
        }),
        (any::<bool>(), any::<bool>(), any::<bool>(), any::<bool>()).prop_map(
            |(auth, ident, err, pending)| SessionAction::InitializeSucceeded {
                snapshot: snapshot(auth, ident, err),
                pending_login: pending.then(|| PendingLogin::new("a", test_clock().now())),
            }
        ),
        Just(SessionAction::InitializeFailed {
            error: AuthError::Initialization(ProviderError::Network("down".into())),
        }),
        (any::<bool>(), any::<bool>(), any::<bool>()).prop_map(|(auth, ident, err)| {
            SessionAction::ProviderStateChanged {
                snapshot: snapshot(auth, ident, err),
            }
        }),
    ]
}

fn arb_login() -> impl Strategy<Value = SessionAction> {
    prop_oneof![
        (arb_attempt(), arb_state_param()).prop_map(|(attempt, s)| SessionAction::StartLogin {
            attempt,
            state_param: s.to_string(),
        }),
        arb_attempt().prop_map(|attempt| SessionAction::LoginRedirected { attempt }),
        arb_attempt().prop_map(|attempt| SessionAction::LoginStartFailed {
            attempt,
            error: AuthError::LoginStart(ProviderError::Expired),
        }),
    ]
}

fn arb_callback() -> impl Strategy<Value = SessionAction> {
    prop_oneof![
        (arb_attempt(), arb_state_param()).prop_map(|(invocation, s)| {
            SessionAction::ResolveCallback {
                invocation,
                params: CallbackParams::success("code", s),
            }
        }),
        (arb_attempt(), 0u8..3).prop_map(|(invocation, who)| SessionAction::CallbackResolved {
            invocation,
            identity: identity(who),
        }),
        arb_attempt().prop_map(|invocation| SessionAction::CallbackFailed {
            invocation,
            error: CallbackError::StateMismatch.into(),
        }),
    ]
}

fn arb_logout() -> impl Strategy<Value = SessionAction> {
    prop_oneof![
        arb_attempt().prop_map(|attempt| SessionAction::Logout {
            attempt,
            destination: "/".into(),
        }),
        arb_attempt().prop_map(|attempt| SessionAction::LogoutSucceeded { attempt }),
        arb_attempt().prop_map(|attempt| SessionAction::LogoutFailed {
            attempt,
            error: AuthError::Logout(ProviderError::Expired),
        }),
    ]
}

/// Any action the store could receive. Ids and `state` values come from
/// small domains so answers and intents collide often.
fn arb_action() -> impl Strategy<Value = SessionAction> {
    prop_oneof![arb_initialization(), arb_login(), arb_callback(), arb_logout()]
}

const fn phase_rank(phase: InitPhase) -> u8 {
    match phase {
        InitPhase::NotStarted => 0,
        InitPhase::InProgress => 1,
        InitPhase::Done => 2,
    }
}

proptest! {
    #[test]
    fn auth_state_stays_consistent(actions in prop::collection::vec(arb_action(), 1..40)) {
        let reducer = TestReducer::new();
        let env = env();
        let mut state = SessionState::default();

        for action in actions {
            let was_initialized = state.auth().is_initialized();
            let previous_phase = phase_rank(state.init_phase());

            let _effects = reducer.reduce(&mut state, action, &env);

            let auth = state.auth();
            prop_assert!(auth.is_consistent(), "inconsistent state: {auth:?}");
            if auth.is_authenticated() {
                prop_assert!(auth.identity().is_some());
                prop_assert!(auth.error().is_none());
            }
            prop_assert!(!was_initialized || auth.is_initialized(), "initialization reverted");
            prop_assert!(phase_rank(state.init_phase()) >= previous_phase);
        }
    }

    #[test]
    fn initialize_starts_work_once(mounts in 1usize..6) {
        let reducer = TestReducer::new();
        let env = env();
        let mut state = SessionState::default();

        let started = (0..mounts)
            .map(|_| {
                reducer.reduce(
                    &mut state,
                    SessionAction::Initialize { config: valid_config() },
                    &env,
                )
            })
            .filter(|effects| !effects.iter().all(Effect::is_noop))
            .count();

        prop_assert_eq!(started, 1);
        prop_assert_eq!(state.init_phase(), InitPhase::InProgress);
    }
}
