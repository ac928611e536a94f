//! Callback resolution (phase 2 of the redirect protocol).
//!
//! The returned `state` is checked against the pending login record here,
//! before the provider client is trusted with the parameters. The record is
//! one-time use: it is consumed whether validation passes or not, so a
//! replayed callback (page reload) fails with `NoPendingLogin`.

use super::{immediate, Effects};
use crate::actions::SessionAction;
use crate::callback::CallbackParams;
use crate::environment::SessionEnvironment;
use crate::error::{AuthError, CallbackError};
use crate::providers::{IdentityProviderClient, PendingLoginStore};
use crate::state::{Identity, PendingLogin, SessionState};
use authflow_core::effect::Effect;
use authflow_core::environment::Clock;
use authflow_core::smallvec;
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

pub(super) fn resolve<C, P, K>(
    state: &mut SessionState,
    invocation: Uuid,
    params: CallbackParams,
    env: &SessionEnvironment<C, P, K>,
) -> Effects
where
    C: IdentityProviderClient + Clone + 'static,
    P: PendingLoginStore + Clone + 'static,
    K: Clock + Clone,
{
    if !state.provider_ready {
        tracing::warn!(%invocation, "Callback arrived before initialization completed");
        return smallvec![immediate(SessionAction::CallbackFailed {
            invocation,
            error: CallbackError::NotInitialized.into(),
        })];
    }

    let pending = state.pending_login.take();
    if let Some(attempt) = state.login_attempt.take() {
        tracing::debug!(%invocation, %attempt, "Callback closes the login attempt");
    }
    let verdict = validate(
        &params,
        pending.as_ref(),
        env.clock.now(),
        env.settings.pending_login_ttl,
    );

    let client = env.client.clone();
    let store = env.pending.clone();

    match verdict {
        Err(reason) => {
            tracing::warn!(%invocation, %reason, "Callback rejected");
            smallvec![Effect::Future(Box::pin(async move {
                store.take().await;
                Some(SessionAction::CallbackFailed {
                    invocation,
                    error: reason.into(),
                })
            }))]
        },
        Ok(()) => {
            tracing::debug!(%invocation, "Callback state verified, exchanging code");
            smallvec![Effect::Future(Box::pin(async move {
                store.take().await;
                match client.resolve_callback(&params).await {
                    Ok(identity) => Some(SessionAction::CallbackResolved {
                        invocation,
                        identity,
                    }),
                    Err(error) => Some(SessionAction::CallbackFailed {
                        invocation,
                        error: CallbackError::ExchangeFailed(error).into(),
                    }),
                }
            }))]
        },
    }
}

fn validate(
    params: &CallbackParams,
    pending: Option<&PendingLogin>,
    now: DateTime<Utc>,
    ttl: Duration,
) -> Result<(), CallbackError> {
    if let Some(error) = &params.error {
        return Err(CallbackError::ProviderRejected {
            error: error.clone(),
            description: params.error_description.clone(),
        });
    }

    let Some(received) = params.state_param() else {
        return Err(CallbackError::MissingState);
    };

    let Some(pending) = pending else {
        return Err(CallbackError::NoPendingLogin);
    };

    if !pending.matches(received) {
        return Err(CallbackError::StateMismatch);
    }

    if pending.is_expired(now, ttl) {
        return Err(CallbackError::Expired);
    }

    Ok(())
}

pub(super) fn resolved(state: &mut SessionState, invocation: Uuid, identity: Identity) -> Effects {
    if state.auth.authenticate(identity) {
        tracing::info!(%invocation, "Callback resolved, session authenticated");
    } else {
        tracing::warn!(%invocation, "Identity resolved before initialization, ignoring");
    }
    smallvec![Effect::None]
}

pub(super) fn failed(state: &mut SessionState, invocation: Uuid, error: AuthError) -> Effects {
    if state.provider_ready {
        tracing::warn!(%invocation, %error, "Callback failed");
        state.auth.fail(error);
    } else {
        // Keeps an initialization failure visible
        tracing::debug!(%invocation, %error, "Callback failed without a ready provider");
    }
    smallvec![Effect::None]
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::validate;
    use crate::actions::SessionAction;
    use crate::callback::CallbackParams;
    use crate::environment::SessionEnvironment;
    use crate::error::{AuthError, CallbackError, ProviderError};
    use crate::mocks::identity::MOCK_AUTH_CODE;
    use crate::mocks::MockIdentityProvider;
    use crate::providers::{MemoryPendingLoginStore, PendingLoginStore};
    use crate::state::{PendingLogin, SessionState};
    use authflow_core::environment::Clock;
    use authflow_core::reducer::Reducer;
    use authflow_testing::{test_clock, ReducerTest};
    use chrono::Duration;
    use uuid::Uuid;

    fn ttl() -> Duration {
        Duration::minutes(10)
    }

    #[test]
    fn test_validate_order() {
        let now = test_clock().now();
        let pending = PendingLogin::new("abc", now);

        let refused = CallbackParams {
            error: Some("access_denied".into()),
            state: Some("abc".into()),
            ..CallbackParams::default()
        };
        assert!(matches!(
            validate(&refused, Some(&pending), now, ttl()),
            Err(CallbackError::ProviderRejected { .. })
        ));

        let no_state = CallbackParams {
            code: Some("c".into()),
            ..CallbackParams::default()
        };
        assert_eq!(
            validate(&no_state, Some(&pending), now, ttl()),
            Err(CallbackError::MissingState)
        );

        let ok = CallbackParams::success("c", "abc");
        assert_eq!(
            validate(&ok, None, now, ttl()),
            Err(CallbackError::NoPendingLogin)
        );
        assert_eq!(validate(&ok, Some(&pending), now, ttl()), Ok(()));

        let forged = CallbackParams::success("c", "abd");
        assert_eq!(
            validate(&forged, Some(&pending), now, ttl()),
            Err(CallbackError::StateMismatch)
        );

        let later = now + Duration::minutes(11);
        assert_eq!(
            validate(&ok, Some(&pending), later, ttl()),
            Err(CallbackError::Expired)
        );
    }

    #[tokio::test]
    async fn test_matching_callback_exchanges_code() {
        let client = MockIdentityProvider::new().with_identity(alice());
        let store = MemoryPendingLoginStore::new();
        let _ = store.save(PendingLogin::new("abc", test_clock().now())).await;
        let env = SessionEnvironment::new(client, store.clone(), test_clock());
        let invocation = Uuid::new_v4();

        let mut state = awaiting_callback("abc");
        let effects = TestReducer::new().reduce(
            &mut state,
            SessionAction::ResolveCallback {
                invocation,
                params: CallbackParams::success(MOCK_AUTH_CODE, "abc"),
            },
            &env,
        );

        assert!(state.pending_login().is_none());
        assert_eq!(
            first_action(effects).await,
            Some(SessionAction::CallbackResolved {
                invocation,
                identity: alice(),
            })
        );
        assert!(store.load().await.is_none());
    }

    #[tokio::test]
    async fn test_mismatched_state_never_reaches_provider() {
        let client = MockIdentityProvider::new();
        let env = SessionEnvironment::new(client.clone(), MemoryPendingLoginStore::new(), test_clock());
        let invocation = Uuid::new_v4();

        let mut state = awaiting_callback("abc");
        state.login_attempt = Some(Uuid::new_v4());
        let effects = TestReducer::new().reduce(
            &mut state,
            SessionAction::ResolveCallback {
                invocation,
                params: CallbackParams::success("code-1", "forged"),
            },
            &env,
        );

        assert!(state.pending_login().is_none());
        assert!(!state.login_in_flight());
        assert_eq!(
            first_action(effects).await,
            Some(SessionAction::CallbackFailed {
                invocation,
                error: CallbackError::StateMismatch.into(),
            })
        );
        assert_eq!(client.exchange_calls(), 0);
    }

    #[tokio::test]
    async fn test_exchange_failure() {
        let env = SessionEnvironment::new(
            MockIdentityProvider::new().failing_exchange(ProviderError::Expired),
            MemoryPendingLoginStore::new(),
            test_clock(),
        );
        let invocation = Uuid::new_v4();

        let mut state = awaiting_callback("abc");
        let effects = TestReducer::new().reduce(
            &mut state,
            SessionAction::ResolveCallback {
                invocation,
                params: CallbackParams::success("code-1", "abc"),
            },
            &env,
        );

        assert_eq!(
            first_action(effects).await,
            Some(SessionAction::CallbackFailed {
                invocation,
                error: CallbackError::ExchangeFailed(ProviderError::Expired).into(),
            })
        );
    }

    #[tokio::test]
    async fn test_callback_before_initialization() {
        let invocation = Uuid::new_v4();
        let mut state = SessionState::default();

        let effects = TestReducer::new().reduce(
            &mut state,
            SessionAction::ResolveCallback {
                invocation,
                params: CallbackParams::success("code-1", "abc"),
            },
            &test_env(),
        );

        let answer = first_action(effects).await;
        assert_eq!(
            answer,
            Some(SessionAction::CallbackFailed {
                invocation,
                error: CallbackError::NotInitialized.into(),
            })
        );
        assert_eq!(state, SessionState::default());
    }

    #[test]
    fn test_resolved_authenticates() {
        let invocation = Uuid::new_v4();

        ReducerTest::new(TestReducer::new())
            .with_env(test_env())
            .given_state(ready())
            .when_action(SessionAction::CallbackFailed {
                invocation,
                error: CallbackError::Expired.into(),
            })
            .when_action(SessionAction::CallbackResolved {
                invocation,
                identity: alice(),
            })
            .then_state(|state| {
                assert!(state.auth().is_authenticated());
                assert_eq!(state.auth().identity(), Some(&alice()));
                assert!(state.auth().error().is_none());
            })
            .run();
    }

    #[test]
    fn test_failed_records_error() {
        let invocation = Uuid::new_v4();

        ReducerTest::new(TestReducer::new())
            .with_env(test_env())
            .given_state(signed_in())
            .when_action(SessionAction::CallbackFailed {
                invocation,
                error: CallbackError::NoPendingLogin.into(),
            })
            .then_state(|state| {
                assert!(!state.auth().is_authenticated());
                assert!(state.auth().identity().is_none());
                assert_eq!(
                    state.auth().error(),
                    Some(&AuthError::Callback(CallbackError::NoPendingLogin))
                );
                assert!(state.auth().is_consistent());
            })
            .run();
    }

    #[test]
    fn test_failed_keeps_initialization_error() {
        let mut failed_init = SessionState::default();
        failed_init
            .auth
            .fail_initialization(AuthError::Initialization(ProviderError::Expired));

        ReducerTest::new(TestReducer::new())
            .with_env(test_env())
            .given_state(failed_init)
            .when_action(SessionAction::CallbackFailed {
                invocation: Uuid::new_v4(),
                error: CallbackError::NotInitialized.into(),
            })
            .then_state_unchanged()
            .run();
    }

    #[test]
    fn test_failed_before_initialization_leaves_state() {
        ReducerTest::new(TestReducer::new())
            .with_env(test_env())
            .given_state(SessionState::default())
            .when_action(SessionAction::CallbackFailed {
                invocation: Uuid::new_v4(),
                error: CallbackError::NotInitialized.into(),
            })
            .then_state_unchanged()
            .run();
    }
}
