//! Identity provider client trait.

use crate::callback::CallbackParams;
use crate::config::SessionConfig;
use crate::error::ProviderError;
use crate::state::Identity;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};
use std::future::Future;

/// Live view of the provider's own session state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderSnapshot {
    /// Whether the provider holds a valid session.
    pub is_authenticated: bool,

    /// Identity of that session.
    pub identity: Option<Identity>,

    /// Last error the provider reported.
    pub error: Option<ProviderError>,
}

impl ProviderSnapshot {
    /// Snapshot of an authenticated provider session.
    #[must_use]
    pub const fn authenticated(identity: Identity) -> Self {
        Self {
            is_authenticated: true,
            identity: Some(identity),
            error: None,
        }
    }
}

/// Redirect-based identity provider client.
///
/// Performs redirect construction, token exchange and logout. Credentials it
/// persists are its own business; the session only sees [`ProviderSnapshot`]s.
///
/// # Implementation Notes
///
/// - `initialize` is called at most once per process
/// - `start_login` must pass `state` to the provider unmodified
/// - timeouts are the implementation's responsibility; the session waits
///   as long as the returned futures do
pub trait IdentityProviderClient: Send + Sync {
    /// Initialize the client.
    ///
    /// # Errors
    ///
    /// Returns error if the provider is unreachable or rejects the
    /// configuration.
    fn initialize(
        &self,
        config: &SessionConfig,
    ) -> impl Future<Output = Result<(), ProviderError>> + Send;

    /// Navigate to the provider's login page, carrying `state`.
    ///
    /// `Ok` means the navigation happened.
    ///
    /// # Errors
    ///
    /// Returns error if the redirect could not be constructed.
    fn start_login(&self, state: &str) -> impl Future<Output = Result<(), ProviderError>> + Send;

    /// Exchange the callback parameters for an identity.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - the code is invalid, expired or already used
    /// - the network request fails
    fn resolve_callback(
        &self,
        params: &CallbackParams,
    ) -> impl Future<Output = Result<Identity, ProviderError>> + Send;

    /// End the provider session and send the user to `post_logout_destination`.
    ///
    /// # Errors
    ///
    /// Returns error if the logout call fails.
    fn logout(
        &self,
        post_logout_destination: &str,
    ) -> impl Future<Output = Result<(), ProviderError>> + Send;

    /// Current provider state.
    fn snapshot(&self) -> ProviderSnapshot;

    /// Every subsequent change of the provider state.
    fn snapshot_changes(&self) -> BoxStream<'static, ProviderSnapshot>;
}
