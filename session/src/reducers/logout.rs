//! Session termination.

use super::{immediate, Effects};
use crate::actions::SessionAction;
use crate::environment::SessionEnvironment;
use crate::error::AuthError;
use crate::providers::{IdentityProviderClient, PendingLoginStore};
use crate::state::SessionState;
use authflow_core::effect::Effect;
use authflow_core::environment::Clock;
use authflow_core::smallvec;
use uuid::Uuid;

pub(super) fn logout<C, P, K>(
    state: &SessionState,
    attempt: Uuid,
    destination: String,
    env: &SessionEnvironment<C, P, K>,
) -> Effects
where
    C: IdentityProviderClient + Clone + 'static,
    P: PendingLoginStore + Clone,
    K: Clock + Clone,
{
    if !state.provider_ready {
        tracing::warn!(%attempt, "Logout requested before the provider is ready");
        return smallvec![immediate(SessionAction::LogoutFailed {
            attempt,
            error: AuthError::NotReady,
        })];
    }

    tracing::debug!(%attempt, %destination, "Logging out");

    let client = env.client.clone();
    smallvec![Effect::Future(Box::pin(async move {
        match client.logout(&destination).await {
            Ok(()) => Some(SessionAction::LogoutSucceeded { attempt }),
            Err(error) => Some(SessionAction::LogoutFailed {
                attempt,
                error: AuthError::Logout(error),
            }),
        }
    }))]
}

pub(super) fn succeeded(state: &mut SessionState, attempt: Uuid) -> Effects {
    tracing::info!(%attempt, "Session terminated");
    state.auth.sign_out();
    smallvec![Effect::None]
}

pub(super) fn failed(state: &mut SessionState, attempt: Uuid, error: AuthError) -> Effects {
    if state.auth.is_authenticated() {
        tracing::warn!(%attempt, %error, "Logout failed, session kept");
    } else if state.auth.is_initialized() {
        tracing::warn!(%attempt, %error, "Logout failed");
        state.auth.record_error(error);
    }
    smallvec![Effect::None]
}
