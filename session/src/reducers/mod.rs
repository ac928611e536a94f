//! Session reducer.
//!
//! Pure state transitions for the whole session lifecycle:
//! `(SessionState, SessionAction, SessionEnvironment) → (SessionState, Effects)`.
//!
//! # Flow
//!
//! ```text
//! 1. Initialize        → one-shot guard → client.initialize effect
//! 2. StartLogin        → record pending login → client.start_login effect
//! 3. (provider redirects back to /redirect)
//! 4. ResolveCallback   → validate state against pending login → client.resolve_callback effect
//! 5. CallbackResolved  → authenticate
//! 6. Logout            → client.logout effect → LogoutSucceeded → sign out
//! ```

mod callback;
mod initialize;
mod login;
mod logout;

use crate::actions::SessionAction;
use crate::environment::SessionEnvironment;
use crate::providers::{IdentityProviderClient, PendingLoginStore};
use crate::state::SessionState;
use authflow_core::effect::Effect;
use authflow_core::environment::Clock;
use authflow_core::reducer::Reducer;
use authflow_core::SmallVec;
use std::marker::PhantomData;

/// Effects returned by the session reducer.
pub(crate) type Effects = SmallVec<[Effect<SessionAction>; 4]>;

/// Effect feeding `action` straight back into the store.
fn immediate(action: SessionAction) -> Effect<SessionAction> {
    Effect::task(async move { action })
}

/// Session reducer.
///
/// Routes each action to the flow it belongs to.
pub struct SessionReducer<C, P, K> {
    _environment: PhantomData<fn() -> (C, P, K)>,
}

impl<C, P, K> SessionReducer<C, P, K> {
    /// Create a new session reducer.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            _environment: PhantomData,
        }
    }
}

impl<C, P, K> Default for SessionReducer<C, P, K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C, P, K> Clone for SessionReducer<C, P, K> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<C, P, K> std::fmt::Debug for SessionReducer<C, P, K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SessionReducer")
    }
}

impl<C, P, K> Reducer for SessionReducer<C, P, K>
where
    C: IdentityProviderClient + Clone + 'static,
    P: PendingLoginStore + Clone + 'static,
    K: Clock + Clone + 'static,
{
    type State = SessionState;
    type Action = SessionAction;
    type Environment = SessionEnvironment<C, P, K>;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> Effects {
        match action {
            SessionAction::Initialize { config } => initialize::initialize(state, config, env),
            SessionAction::InitializeSucceeded {
                snapshot,
                pending_login,
            } => initialize::succeeded(state, &snapshot, pending_login, env),
            SessionAction::InitializeFailed { error } => initialize::failed(state, error),
            SessionAction::ProviderStateChanged { snapshot } => {
                initialize::provider_state_changed(state, &snapshot)
            },

            SessionAction::StartLogin {
                attempt,
                state_param,
            } => login::start(state, attempt, state_param, env),
            SessionAction::LoginRedirected { attempt } => login::redirected(state, attempt),
            SessionAction::LoginStartFailed { attempt, error } => {
                login::start_failed(state, attempt, &error, env)
            },

            SessionAction::ResolveCallback { invocation, params } => {
                callback::resolve(state, invocation, params, env)
            },
            SessionAction::CallbackResolved {
                invocation,
                identity,
            } => callback::resolved(state, invocation, identity),
            SessionAction::CallbackFailed { invocation, error } => {
                callback::failed(state, invocation, error)
            },

            SessionAction::Logout {
                attempt,
                destination,
            } => logout::logout(state, attempt, destination, env),
            SessionAction::LogoutSucceeded { attempt } => logout::succeeded(state, attempt),
            SessionAction::LogoutFailed { attempt, error } => {
                logout::failed(state, attempt, error)
            },
        }
    }
}
