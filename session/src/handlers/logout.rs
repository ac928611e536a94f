//! Session Terminator.

use crate::actions::SessionAction;
use crate::context::Dispatcher;
use crate::error::{AuthError, Result};
use crate::providers::{IdentityProviderClient, PendingLoginStore};
use authflow_core::environment::Clock;
use uuid::Uuid;

/// Logout button.
pub struct SessionTerminator<C, P, K>
where
    C: IdentityProviderClient + Clone + 'static,
    P: PendingLoginStore + Clone + 'static,
    K: Clock + Clone + 'static,
{
    dispatcher: Dispatcher<C, P, K>,
    default_destination: String,
}

impl<C, P, K> SessionTerminator<C, P, K>
where
    C: IdentityProviderClient + Clone + 'static,
    P: PendingLoginStore + Clone + 'static,
    K: Clock + Clone + 'static,
{
    pub(crate) const fn new(dispatcher: Dispatcher<C, P, K>, default_destination: String) -> Self {
        Self {
            dispatcher,
            default_destination,
        }
    }

    /// End the session; the provider navigates to `destination` afterwards.
    ///
    /// On success `AuthState` is signed out but stays initialized.
    ///
    /// # Errors
    ///
    /// - [`AuthError::NotReady`] before the provider has initialized
    /// - [`AuthError::Logout`] if the provider refused; an authenticated
    ///   session is kept as it was
    pub async fn logout(&self, destination: &str) -> Result<()> {
        let attempt = Uuid::new_v4();
        let answer = self
            .dispatcher
            .request(
                SessionAction::Logout {
                    attempt,
                    destination: destination.to_string(),
                },
                |action| action.answers_logout(attempt),
            )
            .await?;

        match answer {
            SessionAction::LogoutSucceeded { .. } => Ok(()),
            SessionAction::LogoutFailed { error, .. } => Err(error),
            other => {
                tracing::error!(?other, "Unexpected answer to logout request");
                Err(AuthError::SessionClosed)
            },
        }
    }

    /// End the session, landing on the configured post-logout destination.
    ///
    /// # Errors
    ///
    /// See [`logout`](Self::logout).
    pub async fn logout_default(&self) -> Result<()> {
        self.logout(&self.default_destination).await
    }
}
