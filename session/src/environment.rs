//! Session environment.
//!
//! This module defines the environment type for dependency injection
//! in the session reducer.

use crate::config::SessionSettings;
use crate::providers::{IdentityProviderClient, PendingLoginStore};
use authflow_core::environment::Clock;

/// Session environment.
///
/// Contains all external dependencies needed by the session reducer.
///
/// # Type Parameters
///
/// - `C`: Identity provider client
/// - `P`: Pending login store
/// - `K`: Clock
#[derive(Clone)]
pub struct SessionEnvironment<C, P, K>
where
    C: IdentityProviderClient + Clone,
    P: PendingLoginStore + Clone,
    K: Clock + Clone,
{
    /// Identity provider client.
    pub client: C,

    /// Pending login store (must survive the provider redirect).
    pub pending: P,

    /// Time source for pending login expiry.
    pub clock: K,

    /// Routes, expiry window and defaults.
    pub settings: SessionSettings,
}

impl<C, P, K> SessionEnvironment<C, P, K>
where
    C: IdentityProviderClient + Clone,
    P: PendingLoginStore + Clone,
    K: Clock + Clone,
{
    /// Create an environment with default settings.
    #[must_use]
    pub fn new(client: C, pending: P, clock: K) -> Self {
        Self {
            client,
            pending,
            clock,
            settings: SessionSettings::default(),
        }
    }

    /// Replace the settings.
    #[must_use]
    pub fn with_settings(mut self, settings: SessionSettings) -> Self {
        self.settings = settings;
        self
    }
}
