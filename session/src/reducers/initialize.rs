//! Initialization and provider mirroring.

use super::Effects;
use crate::actions::SessionAction;
use crate::config::SessionConfig;
use crate::environment::SessionEnvironment;
use crate::error::AuthError;
use crate::providers::{IdentityProviderClient, PendingLoginStore, ProviderSnapshot};
use crate::state::{InitPhase, PendingLogin, SessionState};
use authflow_core::effect::Effect;
use authflow_core::environment::Clock;
use authflow_core::smallvec;
use futures::StreamExt;

pub(super) fn initialize<C, P, K>(
    state: &mut SessionState,
    config: SessionConfig,
    env: &SessionEnvironment<C, P, K>,
) -> Effects
where
    C: IdentityProviderClient + Clone + 'static,
    P: PendingLoginStore + Clone + 'static,
    K: Clock + Clone,
{
    if state.init != InitPhase::NotStarted {
        tracing::debug!(phase = ?state.init, "Initialization already triggered, ignoring");
        return smallvec![Effect::None];
    }

    if let Err(error) = config.validate() {
        tracing::warn!(%error, "Session configuration rejected");
        state.init = InitPhase::Done;
        state.auth.fail_initialization(error);
        return smallvec![Effect::None];
    }

    tracing::info!(sandbox = config.sandbox_mode(), "Initializing identity provider");
    state.init = InitPhase::InProgress;

    let client = env.client.clone();
    let pending = env.pending.clone();

    smallvec![Effect::Future(Box::pin(async move {
        match client.initialize(&config).await {
            Ok(()) => Some(SessionAction::InitializeSucceeded {
                snapshot: client.snapshot(),
                pending_login: pending.load().await,
            }),
            Err(error) => Some(SessionAction::InitializeFailed {
                error: AuthError::Initialization(error),
            }),
        }
    }))]
}

pub(super) fn succeeded<C, P, K>(
    state: &mut SessionState,
    snapshot: &ProviderSnapshot,
    pending_login: Option<PendingLogin>,
    env: &SessionEnvironment<C, P, K>,
) -> Effects
where
    C: IdentityProviderClient + Clone + 'static,
    P: PendingLoginStore + Clone,
    K: Clock + Clone,
{
    if state.init != InitPhase::InProgress {
        tracing::debug!(phase = ?state.init, "Unexpected initialization result, ignoring");
        return smallvec![Effect::None];
    }

    state.init = InitPhase::Done;
    state.provider_ready = true;
    state.auth.finish_initialization();
    state.auth.mirror(snapshot);
    state.pending_login = pending_login;

    tracing::info!(
        authenticated = state.auth.is_authenticated(),
        pending_login = state.pending_login.is_some(),
        "Identity provider initialized"
    );

    let changes = env
        .client
        .snapshot_changes()
        .map(|snapshot| SessionAction::ProviderStateChanged { snapshot });

    smallvec![Effect::Stream(Box::pin(changes))]
}

pub(super) fn failed(state: &mut SessionState, error: AuthError) -> Effects {
    if state.init != InitPhase::InProgress {
        tracing::debug!(phase = ?state.init, "Unexpected initialization result, ignoring");
        return smallvec![Effect::None];
    }

    tracing::warn!(%error, "Identity provider initialization failed");
    state.init = InitPhase::Done;
    state.auth.fail_initialization(error);
    smallvec![Effect::None]
}

pub(super) fn provider_state_changed(
    state: &mut SessionState,
    snapshot: &ProviderSnapshot,
) -> Effects {
    if !state.provider_ready {
        tracing::debug!("Provider state changed before initialization, ignoring");
        return smallvec![Effect::None];
    }

    tracing::debug!(
        authenticated = snapshot.is_authenticated,
        "Mirroring provider state"
    );
    state.auth.mirror(snapshot);
    smallvec![Effect::None]
}
