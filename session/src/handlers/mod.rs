//! UI-facing session components.
//!
//! Each component is obtained from [`AuthContext`](crate::AuthContext) and
//! wraps one part of the session flow:
//!
//! - [`LoginInitiator`]: starts the redirect login
//! - [`CallbackHandler`]: resolves the provider's return navigation
//! - [`RouteGuard`]: protects authenticated routes
//! - [`SessionTerminator`]: ends the session
//!
//! Failures never escape as panics; they come back as results or show up in
//! the observed `AuthState`.

mod callback;
mod guard;
mod login;
mod logout;

pub use callback::{CallbackHandler, CallbackOutcome, CallbackPhase, CallbackView};
pub use guard::{GuardView, RouteGuard};
pub use login::{generate_state, LoginInitiator};
pub use logout::SessionTerminator;
