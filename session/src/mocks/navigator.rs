//! Navigator that records destinations.

use crate::navigation::Navigator;
use std::sync::{Arc, Mutex, PoisonError};

/// Navigator that records every destination instead of navigating.
///
/// Clones share the same history.
#[derive(Debug, Clone, Default)]
pub struct RecordingNavigator {
    visits: Arc<Mutex<Vec<String>>>,
}

impl RecordingNavigator {
    /// Create a navigator with an empty history.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every destination navigated to, oldest first.
    #[must_use]
    pub fn visits(&self) -> Vec<String> {
        self.visits
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Most recent destination.
    #[must_use]
    pub fn last(&self) -> Option<String> {
        self.visits().pop()
    }

    /// How many times `destination` was navigated to.
    #[must_use]
    pub fn count(&self, destination: &str) -> usize {
        self.visits().iter().filter(|v| *v == destination).count()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, destination: &str) {
        tracing::debug!(destination, "Navigating");
        self.visits
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(destination.to_string());
    }
}
