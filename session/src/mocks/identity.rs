//! Mock identity provider for testing.

use crate::callback::CallbackParams;
use crate::config::SessionConfig;
use crate::error::ProviderError;
use crate::providers::{IdentityProviderClient, ProviderSnapshot};
use crate::state::Identity;
use futures::stream::{self, BoxStream, StreamExt};
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{watch, Notify};

/// Authorization code the mock hands out and accepts.
pub const MOCK_AUTH_CODE: &str = "mock-auth-code";

/// Mock identity provider.
///
/// Succeeds by default. Each operation can be made to fail, and
/// initialization and the code exchange can be held open until released,
/// to observe the loading states in between. Clones share call records
/// and provider state.
#[derive(Debug, Clone)]
pub struct MockIdentityProvider {
    identity: Identity,
    persisted_session: Option<Identity>,
    initialize_error: Option<ProviderError>,
    login_error: Option<ProviderError>,
    exchange_error: Option<ProviderError>,
    logout_error: Option<ProviderError>,
    initialize_gate: Option<Arc<Notify>>,
    exchange_gate: Option<Arc<Notify>>,
    shared: Arc<Shared>,
}

#[derive(Debug)]
struct Shared {
    snapshots: watch::Sender<ProviderSnapshot>,
    initialize_calls: AtomicUsize,
    exchange_calls: AtomicUsize,
    started_logins: Mutex<Vec<String>>,
    logout_destinations: Mutex<Vec<String>>,
}

impl MockIdentityProvider {
    /// Create a mock that succeeds every call.
    #[must_use]
    pub fn new() -> Self {
        let (snapshots, _) = watch::channel(ProviderSnapshot::default());
        Self {
            identity: Identity::new("mock.user").with_linked_address("0x0000000000000000000000000000000000000001"),
            persisted_session: None,
            initialize_error: None,
            login_error: None,
            exchange_error: None,
            logout_error: None,
            initialize_gate: None,
            exchange_gate: None,
            shared: Arc::new(Shared {
                snapshots,
                initialize_calls: AtomicUsize::new(0),
                exchange_calls: AtomicUsize::new(0),
                started_logins: Mutex::new(Vec::new()),
                logout_destinations: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Identity returned by successful exchanges.
    #[must_use]
    pub fn with_identity(mut self, identity: Identity) -> Self {
        self.identity = identity;
        self
    }

    /// Credentials persisted by an earlier visit; restored on initialization.
    #[must_use]
    pub fn with_persisted_session(mut self, identity: Identity) -> Self {
        self.persisted_session = Some(identity);
        self
    }

    /// Make initialization fail.
    #[must_use]
    pub fn failing_initialize(mut self, error: ProviderError) -> Self {
        self.initialize_error = Some(error);
        self
    }

    /// Make login redirects fail.
    #[must_use]
    pub fn failing_login(mut self, error: ProviderError) -> Self {
        self.login_error = Some(error);
        self
    }

    /// Make code exchanges fail.
    #[must_use]
    pub fn failing_exchange(mut self, error: ProviderError) -> Self {
        self.exchange_error = Some(error);
        self
    }

    /// Make logout fail.
    #[must_use]
    pub fn failing_logout(mut self, error: ProviderError) -> Self {
        self.logout_error = Some(error);
        self
    }

    /// Hold initialization until [`release_initialization`](Self::release_initialization).
    #[must_use]
    pub fn gate_initialization(mut self) -> Self {
        self.initialize_gate = Some(Arc::new(Notify::new()));
        self
    }

    /// Hold code exchanges until [`release_exchange`](Self::release_exchange).
    #[must_use]
    pub fn gate_exchange(mut self) -> Self {
        self.exchange_gate = Some(Arc::new(Notify::new()));
        self
    }

    /// Let a held initialization finish.
    pub fn release_initialization(&self) {
        if let Some(gate) = &self.initialize_gate {
            gate.notify_one();
        }
    }

    /// Let one held exchange finish.
    pub fn release_exchange(&self) {
        if let Some(gate) = &self.exchange_gate {
            gate.notify_one();
        }
    }

    /// Change the provider state, as if it changed on the provider's side.
    pub fn set_snapshot(&self, snapshot: ProviderSnapshot) {
        self.shared.snapshots.send_replace(snapshot);
    }

    /// Callback parameters the provider would send back for `state`.
    #[must_use]
    pub fn callback_params(&self, state: &str) -> CallbackParams {
        CallbackParams::success(MOCK_AUTH_CODE, state)
    }

    /// Callback URL the provider would redirect to for `state`.
    #[must_use]
    pub fn callback_url(&self, return_uri: &str, state: &str) -> String {
        format!("{return_uri}?{}", self.callback_params(state).to_query())
    }

    /// Identity returned by successful exchanges.
    #[must_use]
    pub const fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Number of `initialize` calls.
    #[must_use]
    pub fn initialize_calls(&self) -> usize {
        self.shared.initialize_calls.load(Ordering::SeqCst)
    }

    /// Number of `resolve_callback` calls.
    #[must_use]
    pub fn exchange_calls(&self) -> usize {
        self.shared.exchange_calls.load(Ordering::SeqCst)
    }

    /// `state` values passed to `start_login`.
    #[must_use]
    pub fn started_logins(&self) -> Vec<String> {
        self.shared
            .started_logins
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Destinations passed to `logout`.
    #[must_use]
    pub fn logout_destinations(&self) -> Vec<String> {
        self.shared
            .logout_destinations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Default for MockIdentityProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentityProviderClient for MockIdentityProvider {
    fn initialize(
        &self,
        _config: &SessionConfig,
    ) -> impl Future<Output = Result<(), ProviderError>> + Send {
        let shared = Arc::clone(&self.shared);
        let gate = self.initialize_gate.clone();
        let error = self.initialize_error.clone();
        let persisted = self.persisted_session.clone();

        async move {
            shared.initialize_calls.fetch_add(1, Ordering::SeqCst);

            if let Some(gate) = gate {
                gate.notified().await;
            }

            if let Some(error) = error {
                return Err(error);
            }

            if let Some(identity) = persisted {
                shared
                    .snapshots
                    .send_replace(ProviderSnapshot::authenticated(identity));
            }
            Ok(())
        }
    }

    fn start_login(&self, state: &str) -> impl Future<Output = Result<(), ProviderError>> + Send {
        let shared = Arc::clone(&self.shared);
        let error = self.login_error.clone();
        let state = state.to_string();

        async move {
            if let Some(error) = error {
                return Err(error);
            }

            shared
                .started_logins
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(state);
            Ok(())
        }
    }

    fn resolve_callback(
        &self,
        params: &CallbackParams,
    ) -> impl Future<Output = Result<Identity, ProviderError>> + Send {
        let shared = Arc::clone(&self.shared);
        let gate = self.exchange_gate.clone();
        let error = self.exchange_error.clone();
        let identity = self.identity.clone();
        let code = params.code.clone();

        async move {
            shared.exchange_calls.fetch_add(1, Ordering::SeqCst);

            if let Some(gate) = gate {
                gate.notified().await;
            }

            if let Some(error) = error {
                return Err(error);
            }

            if code.as_deref() != Some(MOCK_AUTH_CODE) {
                return Err(ProviderError::Rejected("invalid authorization code".into()));
            }

            shared
                .snapshots
                .send_replace(ProviderSnapshot::authenticated(identity.clone()));
            Ok(identity)
        }
    }

    fn logout(
        &self,
        post_logout_destination: &str,
    ) -> impl Future<Output = Result<(), ProviderError>> + Send {
        let shared = Arc::clone(&self.shared);
        let error = self.logout_error.clone();
        let destination = post_logout_destination.to_string();

        async move {
            shared
                .logout_destinations
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(destination);

            if let Some(error) = error {
                return Err(error);
            }

            shared.snapshots.send_replace(ProviderSnapshot::default());
            Ok(())
        }
    }

    fn snapshot(&self) -> ProviderSnapshot {
        self.shared.snapshots.borrow().clone()
    }

    fn snapshot_changes(&self) -> BoxStream<'static, ProviderSnapshot> {
        let receiver = self.shared.snapshots.subscribe();

        stream::unfold(receiver, |mut receiver| async move {
            receiver.changed().await.ok()?;
            let snapshot = receiver.borrow_and_update().clone();
            Some((snapshot, receiver))
        })
        .boxed()
    }
}
