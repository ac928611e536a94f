//! Session actions.
//!
//! Intents come from the session components; the `*Succeeded`, `*Failed`,
//! `*Resolved` and `*Redirected` variants are produced by effects and carry
//! the correlation id of the intent they answer.

use crate::callback::CallbackParams;
use crate::config::SessionConfig;
use crate::error::AuthError;
use crate::providers::ProviderSnapshot;
use crate::state::{Identity, PendingLogin};
use uuid::Uuid;

/// Everything the session reducer reacts to.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionAction {
    // ═══════════════════════════════════════════════════════════════════════
    // Initialization
    // ═══════════════════════════════════════════════════════════════════════
    /// Initialize the provider client (no-op after the first time).
    Initialize {
        /// Provider configuration
        config: SessionConfig,
    },

    /// The provider client initialized.
    InitializeSucceeded {
        /// Provider state right after initialization
        snapshot: ProviderSnapshot,
        /// Login record left by the page load that started the redirect
        pending_login: Option<PendingLogin>,
    },

    /// The provider client failed to initialize.
    InitializeFailed {
        /// Failure detail
        error: AuthError,
    },

    /// The provider state changed.
    ProviderStateChanged {
        /// New provider state
        snapshot: ProviderSnapshot,
    },

    // ═══════════════════════════════════════════════════════════════════════
    // Login
    // ═══════════════════════════════════════════════════════════════════════
    /// Start the redirect-based login.
    StartLogin {
        /// Correlation id
        attempt: Uuid,
        /// Opaque `state` passed to the provider unmodified
        state_param: String,
    },

    /// Navigation to the provider happened.
    LoginRedirected {
        /// Correlation id
        attempt: Uuid,
    },

    /// The redirect could not be started.
    LoginStartFailed {
        /// Correlation id
        attempt: Uuid,
        /// Failure detail
        error: AuthError,
    },

    // ═══════════════════════════════════════════════════════════════════════
    // Callback
    // ═══════════════════════════════════════════════════════════════════════
    /// Resolve the provider callback.
    ResolveCallback {
        /// Correlation id
        invocation: Uuid,
        /// Parameters from the callback URL
        params: CallbackParams,
    },

    /// The exchange produced an identity.
    CallbackResolved {
        /// Correlation id
        invocation: Uuid,
        /// Exchanged identity
        identity: Identity,
    },

    /// The callback was rejected or the exchange failed.
    CallbackFailed {
        /// Correlation id
        invocation: Uuid,
        /// Failure detail
        error: AuthError,
    },

    // ═══════════════════════════════════════════════════════════════════════
    // Logout
    // ═══════════════════════════════════════════════════════════════════════
    /// End the session.
    Logout {
        /// Correlation id
        attempt: Uuid,
        /// Where the provider sends the user afterwards
        destination: String,
    },

    /// Logout completed.
    LogoutSucceeded {
        /// Correlation id
        attempt: Uuid,
    },

    /// Logout failed.
    LogoutFailed {
        /// Correlation id
        attempt: Uuid,
        /// Failure detail
        error: AuthError,
    },
}

impl SessionAction {
    /// Whether this is the answer to login attempt `attempt`.
    #[must_use]
    pub fn answers_login(&self, attempt: Uuid) -> bool {
        matches!(
            self,
            Self::LoginRedirected { attempt: id } | Self::LoginStartFailed { attempt: id, .. }
                if *id == attempt
        )
    }

    /// Whether this is the answer to callback invocation `invocation`.
    #[must_use]
    pub fn answers_callback(&self, invocation: Uuid) -> bool {
        matches!(
            self,
            Self::CallbackResolved { invocation: id, .. } | Self::CallbackFailed { invocation: id, .. }
                if *id == invocation
        )
    }

    /// Whether this is the answer to logout attempt `attempt`.
    #[must_use]
    pub fn answers_logout(&self, attempt: Uuid) -> bool {
        matches!(
            self,
            Self::LogoutSucceeded { attempt: id } | Self::LogoutFailed { attempt: id, .. }
                if *id == attempt
        )
    }
}
