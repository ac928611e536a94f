//! Session state types.
//!
//! [`AuthState`] is what the rest of the application observes. Its fields are
//! private and only change through the transition methods below, each of
//! which keeps these invariants:
//!
//! - `is_authenticated` implies an identity is present and no error is set
//! - `!is_initialized` implies not authenticated and no identity
//! - `is_initialized` never reverts to `false`

use crate::error::AuthError;
use crate::providers::ProviderSnapshot;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Authenticated user identity, as returned by a successful exchange.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity {
    /// Opaque user identifier.
    pub subject_id: String,

    /// Secondary account identifier (e.g. a wallet address).
    pub linked_address: Option<String>,
}

impl Identity {
    /// Identity without a linked address.
    #[must_use]
    pub fn new(subject_id: impl Into<String>) -> Self {
        Self {
            subject_id: subject_id.into(),
            linked_address: None,
        }
    }

    /// Attach a linked address.
    #[must_use]
    pub fn with_linked_address(mut self, address: impl Into<String>) -> Self {
        self.linked_address = Some(address.into());
        self
    }
}

/// Authentication status visible to the whole application.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AuthState {
    is_initialized: bool,
    is_authenticated: bool,
    error: Option<AuthError>,
    identity: Option<Identity>,
}

impl AuthState {
    /// Whether initialization has resolved (successfully or not).
    #[must_use]
    pub const fn is_initialized(&self) -> bool {
        self.is_initialized
    }

    /// Whether a valid identity is established.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.is_authenticated
    }

    /// Last failure, if any.
    #[must_use]
    pub const fn error(&self) -> Option<&AuthError> {
        self.error.as_ref()
    }

    /// Current identity; present only while authenticated.
    #[must_use]
    pub const fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    /// Whether the state satisfies every invariant.
    #[must_use]
    pub const fn is_consistent(&self) -> bool {
        let authenticated_ok =
            !self.is_authenticated || (self.identity.is_some() && self.error.is_none());
        let identity_ok = self.is_authenticated || self.identity.is_none();
        let uninitialized_ok =
            self.is_initialized || (!self.is_authenticated && self.identity.is_none());
        authenticated_ok && identity_ok && uninitialized_ok
    }

    /// Initialization resolved successfully.
    pub(crate) const fn finish_initialization(&mut self) {
        self.is_initialized = true;
    }

    /// Initialization resolved with a failure. Terminal for the process.
    pub(crate) fn fail_initialization(&mut self, error: AuthError) {
        self.is_initialized = true;
        self.is_authenticated = false;
        self.identity = None;
        self.error = Some(error);
    }

    /// Establish `identity`. Refused before initialization.
    pub(crate) fn authenticate(&mut self, identity: Identity) -> bool {
        if !self.is_initialized {
            return false;
        }
        self.is_authenticated = true;
        self.identity = Some(identity);
        self.error = None;
        true
    }

    /// Successful transition to unauthenticated.
    pub(crate) fn sign_out(&mut self) {
        self.is_authenticated = false;
        self.identity = None;
        self.error = None;
    }

    /// Failed transition: drops any identity and records the error.
    pub(crate) fn fail(&mut self, error: AuthError) {
        self.is_authenticated = false;
        self.identity = None;
        self.error = Some(error);
    }

    /// Record an error without touching the session.
    ///
    /// Ignored while authenticated; returns whether the error was stored.
    pub(crate) fn record_error(&mut self, error: AuthError) -> bool {
        if self.is_authenticated {
            return false;
        }
        self.error = Some(error);
        true
    }

    /// Mirror the provider's live snapshot.
    ///
    /// Only real transitions clear an error: becoming authenticated, or
    /// dropping an authenticated session.
    pub(crate) fn mirror(&mut self, snapshot: &ProviderSnapshot) {
        match (snapshot.is_authenticated, &snapshot.identity) {
            (true, Some(identity)) => {
                if self.identity.as_ref() != Some(identity) || !self.is_authenticated {
                    self.authenticate(identity.clone());
                }
            },
            (true, None) => {
                tracing::warn!("Provider reports an authenticated session without identity");
                if self.is_authenticated {
                    self.sign_out();
                }
            },
            (false, _) => {
                if self.is_authenticated {
                    self.sign_out();
                }
                if let Some(error) = &snapshot.error {
                    let error = AuthError::Provider(error.clone());
                    if self.error.as_ref() != Some(&error) {
                        self.record_error(error);
                    }
                }
            },
        }
    }
}

/// One-shot initialization guard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum InitPhase {
    /// Nobody has asked for initialization yet.
    #[default]
    NotStarted,
    /// The provider client is initializing.
    InProgress,
    /// Initialization resolved; never left again.
    Done,
}

/// Phase 1 record of the redirect protocol.
///
/// Written before navigating to the provider; read back and consumed when the
/// provider redirects to the callback route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingLogin {
    /// `state` parameter sent to the provider.
    pub state_param: String,

    /// When the login was started.
    pub initiated_at: DateTime<Utc>,
}

impl PendingLogin {
    /// Create a pending login record.
    #[must_use]
    pub fn new(state_param: impl Into<String>, initiated_at: DateTime<Utc>) -> Self {
        Self {
            state_param: state_param.into(),
            initiated_at,
        }
    }

    /// Constant-time comparison against the `state` received on callback.
    #[must_use]
    pub fn matches(&self, received: &str) -> bool {
        constant_time_eq::constant_time_eq(self.state_param.as_bytes(), received.as_bytes())
    }

    /// Whether the record is older than `ttl` at `now`.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now.signed_duration_since(self.initiated_at) > ttl
    }
}

/// State owned by the session store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    pub(crate) auth: AuthState,
    pub(crate) init: InitPhase,
    pub(crate) provider_ready: bool,
    pub(crate) pending_login: Option<PendingLogin>,
    pub(crate) login_attempt: Option<Uuid>,
}

impl SessionState {
    /// Observable authentication status.
    #[must_use]
    pub const fn auth(&self) -> &AuthState {
        &self.auth
    }

    /// Initialization guard.
    #[must_use]
    pub const fn init_phase(&self) -> InitPhase {
        self.init
    }

    /// Whether the provider client initialized successfully.
    #[must_use]
    pub const fn provider_ready(&self) -> bool {
        self.provider_ready
    }

    /// Login request waiting for its callback.
    #[must_use]
    pub const fn pending_login(&self) -> Option<&PendingLogin> {
        self.pending_login.as_ref()
    }

    /// Whether a login is under way: from the redirect request until its
    /// callback is resolved, or until the redirect fails.
    #[must_use]
    pub const fn login_in_flight(&self) -> bool {
        self.login_attempt.is_some()
    }
}
