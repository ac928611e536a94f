//! Mock collaborators for testing.
//!
//! In-memory implementations of the session's collaborator traits, for unit
//! tests, integration tests and the demo.

pub mod identity;
pub mod navigator;

pub use identity::MockIdentityProvider;
pub use navigator::RecordingNavigator;
