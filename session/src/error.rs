//! Error types for session operations.
//!
//! Every failure is captured at the component boundary and turned into a
//! value: either stored in [`AuthState`](crate::state::AuthState) or returned
//! to the caller. Errors are therefore `Clone + PartialEq` and serialisable.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for session operations.
pub type Result<T> = std::result::Result<T, AuthError>;

/// Failure reported by the identity provider client.
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProviderError {
    /// Provider could not be reached.
    #[error("Identity provider unreachable: {0}")]
    Network(String),

    /// Provider refused the request.
    #[error("Identity provider rejected the request: {0}")]
    Rejected(String),

    /// The request (authorization code, login session) is no longer valid.
    #[error("Request expired at the identity provider")]
    Expired,

    /// Anything else.
    #[error("Identity provider error: {0}")]
    Other(String),
}

/// Why a provider callback could not be turned into an identity.
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CallbackError {
    /// The session was not initialized when the callback arrived.
    #[error("Callback arrived before the session was initialized")]
    NotInitialized,

    /// The callback URL could not be parsed.
    #[error("Malformed callback parameters: {0}")]
    Malformed(String),

    /// The provider redirected back with an error instead of a code.
    #[error("Identity provider returned '{error}'")]
    ProviderRejected {
        /// Protocol error code (`error` parameter)
        error: String,
        /// Human-readable detail (`error_description` parameter)
        description: Option<String>,
    },

    /// No `state` parameter on the callback.
    #[error("Callback is missing the state parameter")]
    MissingState,

    /// No login request was recorded before the redirect.
    #[error("No login request is pending")]
    NoPendingLogin,

    /// The `state` parameter does not match the pending login request.
    #[error("Callback state does not match the pending login request")]
    StateMismatch,

    /// The pending login request is older than the allowed window.
    #[error("Pending login request expired")]
    Expired,

    /// The provider failed the token exchange.
    #[error("Token exchange failed: {0}")]
    ExchangeFailed(ProviderError),
}

/// Session error taxonomy.
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthError {
    /// Missing or invalid `SessionConfig` field.
    #[error("Invalid session configuration: {field} {reason}")]
    Configuration {
        /// Offending field
        field: String,
        /// What is wrong with it
        reason: String,
    },

    /// Identity provider initialization failed.
    #[error("Identity provider initialization failed: {0}")]
    Initialization(ProviderError),

    /// The identity provider is not ready (initialization pending or failed).
    #[error("Identity provider is not initialized")]
    NotReady,

    /// Error mirrored from the provider's own state.
    #[error("{0}")]
    Provider(ProviderError),

    /// The login redirect could not be started.
    #[error("Could not start login: {0}")]
    LoginStart(ProviderError),

    /// Another login request is still in flight.
    #[error("A login request is already in flight")]
    LoginInFlight,

    /// Callback resolution failed.
    #[error("Callback resolution failed: {0}")]
    Callback(#[from] CallbackError),

    /// Logout failed.
    #[error("Logout failed: {0}")]
    Logout(ProviderError),

    /// The session store stopped before answering.
    #[error("Session store is no longer running")]
    SessionClosed,

    /// The answer was lost while waiting; `AuthState` holds the outcome.
    #[error("Lost track of the answer after {skipped} session updates")]
    AnswerLost {
        /// Session actions skipped by the waiting caller.
        skipped: u64,
    },
}

impl AuthError {
    /// Configuration error for `field`.
    #[must_use]
    pub fn configuration(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Configuration {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Whether this is a configuration error.
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration { .. })
    }

    /// Whether this is a callback resolution error.
    #[must_use]
    pub const fn is_callback(&self) -> bool {
        matches!(self, Self::Callback(_))
    }
}
