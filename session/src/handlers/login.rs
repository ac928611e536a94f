//! Login Initiator.

use crate::actions::SessionAction;
use crate::constants::defaults::GENERATED_STATE_BYTES;
use crate::context::{AuthObserver, Dispatcher};
use crate::error::{AuthError, Result};
use crate::providers::{IdentityProviderClient, PendingLoginStore};
use authflow_core::environment::Clock;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::RngCore;
use uuid::Uuid;

/// Login button.
///
/// Starts the redirect flow. While a redirect is being constructed the
/// initiator is disabled; a second invocation fails with
/// [`AuthError::LoginInFlight`] instead of starting another flow.
pub struct LoginInitiator<C, P, K>
where
    C: IdentityProviderClient + Clone + 'static,
    P: PendingLoginStore + Clone + 'static,
    K: Clock + Clone + 'static,
{
    dispatcher: Dispatcher<C, P, K>,
    observer: AuthObserver,
    default_state: String,
}

impl<C, P, K> LoginInitiator<C, P, K>
where
    C: IdentityProviderClient + Clone + 'static,
    P: PendingLoginStore + Clone + 'static,
    K: Clock + Clone + 'static,
{
    pub(crate) fn new(dispatcher: Dispatcher<C, P, K>, default_state: String) -> Self {
        let observer = dispatcher.observer();
        Self {
            dispatcher,
            observer,
            default_state,
        }
    }

    /// Whether the button should accept a click.
    ///
    /// Stays off after the redirect is issued, until the callback for it
    /// has been resolved.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        !self.observer.login_in_flight()
    }

    /// Begin the redirect login, round-tripping `state` through the provider.
    ///
    /// Returns once the navigation to the provider has been issued.
    /// `AuthState` is not touched; the session only changes when the
    /// callback is resolved.
    ///
    /// # Errors
    ///
    /// - [`AuthError::LoginInFlight`] if a login is already under way
    /// - [`AuthError::NotReady`] before the provider has initialized
    /// - [`AuthError::LoginStart`] if the redirect could not be constructed
    pub async fn login(&self, state: &str) -> Result<()> {
        if self.observer.login_in_flight() {
            tracing::debug!("Login click ignored, redirect already in flight");
            return Err(AuthError::LoginInFlight);
        }

        let attempt = Uuid::new_v4();
        let answer = self
            .dispatcher
            .request(
                SessionAction::StartLogin {
                    attempt,
                    state_param: state.to_string(),
                },
                |action| action.answers_login(attempt),
            )
            .await?;

        match answer {
            SessionAction::LoginRedirected { .. } => Ok(()),
            SessionAction::LoginStartFailed { error, .. } => Err(error),
            other => {
                tracing::error!(?other, "Unexpected answer to login request");
                Err(AuthError::SessionClosed)
            },
        }
    }

    /// Begin the redirect login with the configured default `state`.
    ///
    /// # Errors
    ///
    /// See [`login`](Self::login).
    pub async fn login_default(&self) -> Result<()> {
        self.login(&self.default_state).await
    }

    /// Begin the redirect login with a fresh random `state`, returning it.
    ///
    /// # Errors
    ///
    /// See [`login`](Self::login).
    pub async fn login_with_generated_state(&self) -> Result<String> {
        let state = generate_state();
        self.login(&state).await?;
        Ok(state)
    }
}

/// Random, URL-safe `state` value (256 bits).
#[must_use]
pub fn generate_state() -> String {
    let mut bytes = [0u8; GENERATED_STATE_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}
