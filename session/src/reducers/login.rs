//! Login initiation (phase 1 of the redirect protocol).

use super::{immediate, Effects};
use crate::actions::SessionAction;
use crate::environment::SessionEnvironment;
use crate::error::AuthError;
use crate::providers::{IdentityProviderClient, PendingLoginStore};
use crate::state::{PendingLogin, SessionState};
use authflow_core::effect::Effect;
use authflow_core::environment::Clock;
use authflow_core::smallvec;
use uuid::Uuid;

pub(super) fn start<C, P, K>(
    state: &mut SessionState,
    attempt: Uuid,
    state_param: String,
    env: &SessionEnvironment<C, P, K>,
) -> Effects
where
    C: IdentityProviderClient + Clone + 'static,
    P: PendingLoginStore + Clone + 'static,
    K: Clock + Clone,
{
    if let Some(in_flight) = state.login_attempt {
        tracing::warn!(%attempt, %in_flight, "Login already in flight, rejecting");
        return smallvec![immediate(SessionAction::LoginStartFailed {
            attempt,
            error: AuthError::LoginInFlight,
        })];
    }

    if !state.provider_ready {
        tracing::warn!(%attempt, "Login requested before the provider is ready");
        return smallvec![immediate(SessionAction::LoginStartFailed {
            attempt,
            error: AuthError::NotReady,
        })];
    }

    let pending = PendingLogin::new(state_param.clone(), env.clock.now());
    state.login_attempt = Some(attempt);
    state.pending_login = Some(pending.clone());

    tracing::debug!(%attempt, "Starting login redirect");

    let client = env.client.clone();
    let store = env.pending.clone();

    smallvec![Effect::Future(Box::pin(async move {
        if let Err(error) = store.save(pending).await {
            return Some(SessionAction::LoginStartFailed {
                attempt,
                error: AuthError::LoginStart(error),
            });
        }

        match client.start_login(&state_param).await {
            Ok(()) => Some(SessionAction::LoginRedirected { attempt }),
            Err(error) => Some(SessionAction::LoginStartFailed {
                attempt,
                error: AuthError::LoginStart(error),
            }),
        }
    }))]
}

/// The attempt stays in flight until its callback is resolved.
pub(super) fn redirected(state: &mut SessionState, attempt: Uuid) -> Effects {
    if state.login_attempt == Some(attempt) {
        tracing::info!(%attempt, "Navigated to identity provider");
    }
    smallvec![Effect::None]
}

pub(super) fn start_failed<C, P, K>(
    state: &mut SessionState,
    attempt: Uuid,
    error: &AuthError,
    env: &SessionEnvironment<C, P, K>,
) -> Effects
where
    C: IdentityProviderClient + Clone,
    P: PendingLoginStore + Clone + 'static,
    K: Clock + Clone,
{
    if state.login_attempt != Some(attempt) {
        // Answer to a rejected duplicate; the in-flight attempt is untouched
        return smallvec![Effect::None];
    }

    tracing::warn!(%attempt, %error, "Login redirect failed");
    state.login_attempt = None;
    state.pending_login = None;

    let store = env.pending.clone();
    smallvec![Effect::Future(Box::pin(async move {
        store.take().await;
        None
    }))]
}
