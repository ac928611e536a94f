//! Session collaborators.
//!
//! Traits for everything the session reducer cannot do itself: talking to
//! the identity provider and remembering the pending login across the
//! full-page redirect. The reducer depends on these traits; applications
//! (and tests) inject the implementations through
//! [`SessionEnvironment`](crate::environment::SessionEnvironment).
//!
//! ```text
//!  LoginInitiator ──StartLogin──▶ Reducer ──save──▶ PendingLoginStore
//!                                    │
//!                                    └──start_login──▶ IdentityProviderClient ──▶ provider
//!                                                                                   │
//!  CallbackHandler ◀──────────────── /redirect?code=…&state=… ◀───────────────────┘
//!        │
//!        └─ResolveCallback──▶ Reducer ──take──▶ PendingLoginStore (validate state)
//!                                └──resolve_callback──▶ IdentityProviderClient
//! ```

pub mod identity;
pub mod pending_login;

pub use identity::{IdentityProviderClient, ProviderSnapshot};
pub use pending_login::{MemoryPendingLoginStore, PendingLoginStore};
