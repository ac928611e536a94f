//! Callback Handler.
//!
//! Mounted on the redirect route. One handler serves one visit: it waits for
//! the provider to be initialized, resolves the returned parameters through
//! the store, and on success navigates to the success route exactly once.
//!
//! ```text
//! Pending ──exchange ok──→ Resolved ──→ navigate(success route)
//!    │
//!    └──invalid / mismatched / expired / network──→ Failed (stay, show error)
//! ```

use crate::actions::SessionAction;
use crate::callback::CallbackParams;
use crate::context::{AuthObserver, Dispatcher};
use crate::error::AuthError;
use crate::navigation::{Navigator, Route};
use crate::providers::{IdentityProviderClient, PendingLoginStore};
use crate::state::Identity;
use authflow_core::environment::Clock;
use tokio::sync::{watch, Mutex};
use uuid::Uuid;

/// Phase of one callback invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CallbackPhase {
    /// Waiting for initialization or the code exchange.
    #[default]
    Pending,
    /// The exchange succeeded.
    Resolved(Identity),
    /// The callback was rejected.
    Failed(AuthError),
}

/// Result of [`CallbackHandler::run`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackOutcome {
    /// Signed in as this identity; navigation to the success route was issued.
    Resolved(Identity),
    /// Callback rejected; the caller decides what to show.
    Failed(AuthError),
}

impl CallbackOutcome {
    /// Identity if resolved.
    #[must_use]
    pub const fn identity(&self) -> Option<&Identity> {
        match self {
            Self::Resolved(identity) => Some(identity),
            Self::Failed(_) => None,
        }
    }

    /// Error if failed.
    #[must_use]
    pub const fn error(&self) -> Option<&AuthError> {
        match self {
            Self::Resolved(_) => None,
            Self::Failed(error) => Some(error),
        }
    }
}

/// What the redirect page renders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackView {
    /// Processing spinner.
    Loading,
    /// Resolved, navigation in progress.
    Redirecting,
    /// Error text.
    Error(String),
}

/// Callback Handler for the redirect route.
pub struct CallbackHandler<C, P, K, N>
where
    C: IdentityProviderClient + Clone + 'static,
    P: PendingLoginStore + Clone + 'static,
    K: Clock + Clone + 'static,
    N: Navigator,
{
    dispatcher: Dispatcher<C, P, K>,
    observer: AuthObserver,
    navigator: N,
    success_route: Route,
    phase: watch::Sender<CallbackPhase>,
    // One run at a time per visit
    running: Mutex<()>,
}

impl<C, P, K, N> CallbackHandler<C, P, K, N>
where
    C: IdentityProviderClient + Clone + 'static,
    P: PendingLoginStore + Clone + 'static,
    K: Clock + Clone + 'static,
    N: Navigator,
{
    pub(crate) fn new(dispatcher: Dispatcher<C, P, K>, navigator: N, success_route: Route) -> Self {
        let observer = dispatcher.observer();
        let (phase, _) = watch::channel(CallbackPhase::Pending);
        Self {
            dispatcher,
            observer,
            navigator,
            success_route,
            phase,
            running: Mutex::new(()),
        }
    }

    /// Resolve the callback parameters.
    ///
    /// Waits for initialization first. `AuthState` is updated before this
    /// returns; on success the navigation to the success route has been
    /// issued. Dropping the future before it completes skips the navigation,
    /// but the exchange already started still lands in `AuthState`.
    ///
    /// Once resolved, the handler answers every later run with the same
    /// identity without touching the store or navigating again.
    pub async fn run(&self, params: CallbackParams) -> CallbackOutcome {
        let _running = self.running.lock().await;
        if let Some(identity) = self.begin() {
            return CallbackOutcome::Resolved(identity);
        }
        self.resolve(params).await
    }

    /// Parse the return URL and resolve it.
    ///
    /// A URL that cannot be parsed fails the callback the same way an
    /// invalid parameter set does.
    pub async fn run_from_url(&self, url: &str) -> CallbackOutcome {
        let _running = self.running.lock().await;
        if let Some(identity) = self.begin() {
            return CallbackOutcome::Resolved(identity);
        }

        match CallbackParams::from_url(url) {
            Ok(params) => self.resolve(params).await,
            Err(reason) => {
                let invocation = Uuid::new_v4();
                tracing::warn!(%invocation, %reason, "Unparsable callback URL");

                if let Err(error) = self.await_initialized(invocation).await {
                    return self.finish(invocation, CallbackOutcome::Failed(error));
                }

                let error = AuthError::from(reason);
                self.dispatcher
                    .send(SessionAction::CallbackFailed {
                        invocation,
                        error: error.clone(),
                    })
                    .await;
                self.finish(invocation, CallbackOutcome::Failed(error))
            },
        }
    }

    /// Current phase of this handler.
    #[must_use]
    pub fn phase(&self) -> CallbackPhase {
        self.phase.borrow().clone()
    }

    /// Watch the phase.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<CallbackPhase> {
        self.phase.subscribe()
    }

    /// What the redirect page should render.
    #[must_use]
    pub fn view(&self) -> CallbackView {
        match &*self.phase.borrow() {
            CallbackPhase::Pending => CallbackView::Loading,
            CallbackPhase::Resolved(_) => CallbackView::Redirecting,
            CallbackPhase::Failed(error) => CallbackView::Error(error.to_string()),
        }
    }

    /// Reset a failed phase to pending; a resolved phase is returned as is.
    fn begin(&self) -> Option<Identity> {
        let mut resolved = None;
        self.phase.send_if_modified(|phase| match phase {
            CallbackPhase::Pending => false,
            CallbackPhase::Resolved(identity) => {
                resolved = Some(identity.clone());
                false
            },
            CallbackPhase::Failed(_) => {
                *phase = CallbackPhase::Pending;
                true
            },
        });
        resolved
    }

    async fn resolve(&self, params: CallbackParams) -> CallbackOutcome {
        let invocation = Uuid::new_v4();

        let outcome = match self.await_initialized(invocation).await {
            Err(error) => CallbackOutcome::Failed(error),
            Ok(()) => {
                let answer = self
                    .dispatcher
                    .request(
                        SessionAction::ResolveCallback { invocation, params },
                        |action| action.answers_callback(invocation),
                    )
                    .await;
                Self::outcome(answer)
            },
        };

        self.finish(invocation, outcome)
    }

    async fn await_initialized(&self, invocation: Uuid) -> Result<(), AuthError> {
        if self.observer.snapshot().is_initialized() {
            return Ok(());
        }

        tracing::debug!(%invocation, "Callback waiting for initialization");
        let mut observer = self.observer.clone();
        match observer.wait_initialized().await {
            Some(_) => Ok(()),
            None => Err(AuthError::SessionClosed),
        }
    }

    fn outcome(answer: crate::error::Result<SessionAction>) -> CallbackOutcome {
        match answer {
            Ok(SessionAction::CallbackResolved { identity, .. }) => {
                CallbackOutcome::Resolved(identity)
            },
            Ok(SessionAction::CallbackFailed { error, .. }) | Err(error) => {
                CallbackOutcome::Failed(error)
            },
            Ok(other) => {
                tracing::error!(?other, "Unexpected answer to callback request");
                CallbackOutcome::Failed(AuthError::SessionClosed)
            },
        }
    }

    fn finish(&self, invocation: Uuid, outcome: CallbackOutcome) -> CallbackOutcome {
        match &outcome {
            CallbackOutcome::Resolved(identity) => {
                let first = self.phase.send_if_modified(|phase| {
                    if matches!(phase, CallbackPhase::Resolved(_)) {
                        false
                    } else {
                        *phase = CallbackPhase::Resolved(identity.clone());
                        true
                    }
                });
                if first {
                    tracing::info!(%invocation, route = %self.success_route, "Callback resolved, navigating");
                    self.navigator.navigate(self.success_route.path());
                }
            },
            CallbackOutcome::Failed(error) => {
                tracing::warn!(%invocation, %error, "Callback failed");
                self.phase.send_replace(CallbackPhase::Failed(error.clone()));
            },
        }
        outcome
    }
}
