//! Auth context provider.
//!
//! [`AuthContext`] owns the session store. It is the only writer: the store
//! itself is private, and the only other mutation path is the crate-private
//! [`Dispatcher`] handed to the components it creates. Everything else gets
//! an [`AuthObserver`], which can read and wait but not change anything.

use crate::actions::SessionAction;
use crate::config::{SessionConfig, SessionSettings};
use crate::environment::SessionEnvironment;
use crate::error::{AuthError, Result};
use crate::handlers::{CallbackHandler, LoginInitiator, RouteGuard, SessionTerminator};
use crate::navigation::Navigator;
use crate::providers::{IdentityProviderClient, PendingLoginStore};
use crate::reducers::SessionReducer;
use crate::state::{AuthState, InitPhase, SessionState};
use authflow_core::environment::Clock;
use authflow_runtime::{EffectHandle, Store, StoreError};
use tokio::sync::watch;

type SessionStore<C, P, K> =
    Store<SessionState, SessionAction, SessionEnvironment<C, P, K>, SessionReducer<C, P, K>>;

/// Auth context provider.
///
/// Created once per application; components are obtained from it.
///
/// # Example
///
/// ```ignore
/// let context = AuthContext::new(SessionConfig::from_env(), environment);
/// context.mount().await;
///
/// let guard = context.route_guard(navigator.clone());
/// match guard.render() {
///     GuardView::Loading => show_spinner(),
///     GuardView::Fallback => {},
///     GuardView::Content => show_dashboard(),
/// }
/// ```
pub struct AuthContext<C, P, K>
where
    C: IdentityProviderClient + Clone + 'static,
    P: PendingLoginStore + Clone + 'static,
    K: Clock + Clone + 'static,
{
    dispatcher: Dispatcher<C, P, K>,
    config: SessionConfig,
    settings: SessionSettings,
}

impl<C, P, K> AuthContext<C, P, K>
where
    C: IdentityProviderClient + Clone + 'static,
    P: PendingLoginStore + Clone + 'static,
    K: Clock + Clone + 'static,
{
    /// Create the context. Nothing is initialized until [`mount`](Self::mount).
    #[must_use]
    pub fn new(config: SessionConfig, environment: SessionEnvironment<C, P, K>) -> Self {
        let settings = environment.settings.clone();
        let store = Store::new(SessionState::default(), SessionReducer::new(), environment);

        Self {
            dispatcher: Dispatcher { store },
            config,
            settings,
        }
    }

    /// Mount the provider: start initialization the first time, no-op after.
    ///
    /// The returned handle completes once initialization has resolved (or
    /// immediately on repeated mounts).
    pub async fn mount(&self) -> EffectHandle {
        if self.dispatcher.init_phase() != InitPhase::NotStarted {
            tracing::trace!("Auth context already mounted");
            return EffectHandle::completed();
        }

        self.dispatcher
            .send(SessionAction::Initialize {
                config: self.config.clone(),
            })
            .await
    }

    /// Current authentication status.
    #[must_use]
    pub fn snapshot(&self) -> AuthState {
        self.dispatcher.observer().snapshot()
    }

    /// Read-only handle on the authentication status.
    #[must_use]
    pub fn observer(&self) -> AuthObserver {
        self.dispatcher.observer()
    }

    /// Login button.
    #[must_use]
    pub fn login_initiator(&self) -> LoginInitiator<C, P, K> {
        LoginInitiator::new(
            self.dispatcher.clone(),
            self.settings.default_login_state.clone(),
        )
    }

    /// Handler for one visit of the callback route.
    #[must_use]
    pub fn callback_handler<N: Navigator>(&self, navigator: N) -> CallbackHandler<C, P, K, N> {
        CallbackHandler::new(
            self.dispatcher.clone(),
            navigator,
            self.settings.success_route,
        )
    }

    /// Guard for a protected subtree.
    #[must_use]
    pub fn route_guard<N: Navigator>(&self, navigator: N) -> RouteGuard<N> {
        RouteGuard::new(self.observer(), navigator, self.settings.landing_route)
    }

    /// Logout button.
    #[must_use]
    pub fn session_terminator(&self) -> SessionTerminator<C, P, K> {
        SessionTerminator::new(
            self.dispatcher.clone(),
            self.settings.post_logout_destination.clone(),
        )
    }

    /// Provider configuration.
    #[must_use]
    pub const fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Behaviour knobs.
    #[must_use]
    pub const fn settings(&self) -> &SessionSettings {
        &self.settings
    }
}

/// Mutation handle on the session store.
pub(crate) struct Dispatcher<C, P, K>
where
    C: IdentityProviderClient + Clone + 'static,
    P: PendingLoginStore + Clone + 'static,
    K: Clock + Clone + 'static,
{
    store: SessionStore<C, P, K>,
}

impl<C, P, K> Clone for Dispatcher<C, P, K>
where
    C: IdentityProviderClient + Clone + 'static,
    P: PendingLoginStore + Clone + 'static,
    K: Clock + Clone + 'static,
{
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

impl<C, P, K> Dispatcher<C, P, K>
where
    C: IdentityProviderClient + Clone + 'static,
    P: PendingLoginStore + Clone + 'static,
    K: Clock + Clone + 'static,
{
    /// Dispatch an action.
    pub(crate) async fn send(&self, action: SessionAction) -> EffectHandle {
        self.store.send(action).await
    }

    /// Dispatch an intent and wait for the answer matching `answers`.
    pub(crate) async fn request<F>(&self, action: SessionAction, answers: F) -> Result<SessionAction>
    where
        F: Fn(&SessionAction) -> bool,
    {
        self.store
            .send_and_wait_for(action, answers)
            .await
            .map_err(|error| match error {
                StoreError::Lagged(skipped) => {
                    tracing::warn!(skipped, "Session answer skipped while waiting");
                    AuthError::AnswerLost { skipped }
                },
                StoreError::ChannelClosed => {
                    tracing::error!(%error, "Session store stopped while waiting for an answer");
                    AuthError::SessionClosed
                },
            })
    }

    pub(crate) fn observer(&self) -> AuthObserver {
        AuthObserver::new(self.store.subscribe())
    }

    fn init_phase(&self) -> InitPhase {
        self.store.snapshot().init_phase()
    }
}

/// Read-only view of the session.
///
/// Every transition is visible to observers by the time the call that
/// caused it returns.
#[derive(Debug, Clone)]
pub struct AuthObserver {
    receiver: watch::Receiver<SessionState>,
    seen: AuthState,
}

impl AuthObserver {
    fn new(receiver: watch::Receiver<SessionState>) -> Self {
        let seen = receiver.borrow().auth().clone();
        Self { receiver, seen }
    }

    /// Current authentication status.
    #[must_use]
    pub fn snapshot(&self) -> AuthState {
        self.receiver.borrow().auth().clone()
    }

    /// Initialization guard.
    #[must_use]
    pub fn init_phase(&self) -> InitPhase {
        self.receiver.borrow().init_phase()
    }

    /// Whether a login redirect is being constructed.
    #[must_use]
    pub fn login_in_flight(&self) -> bool {
        self.receiver.borrow().login_in_flight()
    }

    /// Wait for the authentication status to differ from the last one
    /// returned (or the one current at creation).
    ///
    /// Returns `None` once the context is gone.
    pub async fn changed(&mut self) -> Option<AuthState> {
        loop {
            self.receiver.changed().await.ok()?;
            let auth = self.receiver.borrow_and_update().auth().clone();
            if auth != self.seen {
                self.seen = auth.clone();
                return Some(auth);
            }
        }
    }

    /// Wait until initialization has resolved.
    ///
    /// Returns `None` once the context is gone.
    pub async fn wait_initialized(&mut self) -> Option<AuthState> {
        let state = self
            .receiver
            .wait_for(|state| state.auth().is_initialized())
            .await
            .ok()?
            .auth()
            .clone();
        Some(state)
    }
}
