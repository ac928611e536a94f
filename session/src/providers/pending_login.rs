//! Pending login storage.

use crate::error::ProviderError;
use crate::state::PendingLogin;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Storage for the phase 1 login record.
///
/// The record must survive the navigation to the provider and back (in a
/// browser: session storage). At most one record is kept.
pub trait PendingLoginStore: Send + Sync {
    /// Replace the stored record.
    ///
    /// # Errors
    ///
    /// Returns error if the record cannot be persisted.
    fn save(&self, pending: PendingLogin) -> impl Future<Output = Result<(), ProviderError>> + Send;

    /// Read the stored record without consuming it.
    fn load(&self) -> impl Future<Output = Option<PendingLogin>> + Send;

    /// Remove and return the stored record (one-time use).
    fn take(&self) -> impl Future<Output = Option<PendingLogin>> + Send;
}

/// In-memory pending login store.
///
/// Clones share the same slot.
#[derive(Debug, Clone, Default)]
pub struct MemoryPendingLoginStore {
    slot: Arc<Mutex<Option<PendingLogin>>>,
}

impl MemoryPendingLoginStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store already holding `pending` (a record left by a
    /// previous page load).
    #[must_use]
    pub fn with_record(pending: PendingLogin) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Some(pending))),
        }
    }
}

impl PendingLoginStore for MemoryPendingLoginStore {
    async fn save(&self, pending: PendingLogin) -> Result<(), ProviderError> {
        *self.slot.lock().await = Some(pending);
        Ok(())
    }

    async fn load(&self) -> Option<PendingLogin> {
        self.slot.lock().await.clone()
    }

    async fn take(&self) -> Option<PendingLogin> {
        self.slot.lock().await.take()
    }
}
