//! # Authflow
//!
//! Client-side session orchestration for a redirect-based identity provider
//! (OAuth-style authorization code flow), built on the authflow store.
//!
//! ## Features
//!
//! - **Single writer**: `AuthState` lives in one store owned by [`AuthContext`]
//! - **One-shot initialization**: mounting any number of times initializes once
//! - **Two-phase login**: the `state` sent to the provider is recorded before
//!   the redirect and verified (constant-time, one use, with expiry) on return
//! - **Route protection**: guards render loading, fallback or content, and
//!   redirect once per sign-out
//! - **Testable**: every collaborator is a trait with an in-memory mock
//!
//! ## Architecture
//!
//! ```text
//! Component → Action → SessionReducer → (SessionState, Effects) → Effect Execution → Answer
//!                                             │
//!                                             └→ watch snapshot → AuthObserver / RouteGuard
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use authflow::*;
//!
//! let context = AuthContext::new(config, SessionEnvironment::new(client, pending, SystemClock));
//! context.mount().await;
//!
//! // Landing page: login button
//! context.login_initiator().login_default().await?;
//!
//! // Redirect page: resolve the provider's answer
//! let handler = context.callback_handler(navigator.clone());
//! match handler.run_from_url(&current_url).await {
//!     CallbackOutcome::Resolved(identity) => {}, // already navigating to /dashboard
//!     CallbackOutcome::Failed(error) => show(error),
//! }
//! ```

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]

pub mod actions;
pub mod callback;
pub mod config;
pub mod constants;
pub mod context;
pub mod environment;
pub mod error;
pub mod handlers;
pub mod navigation;
pub mod providers;
pub mod reducers;
pub mod state;
pub mod views;

#[cfg(any(test, feature = "test-utils"))]
pub mod mocks;

pub use actions::SessionAction;
pub use callback::CallbackParams;
pub use config::{SessionConfig, SessionSettings};
pub use context::{AuthContext, AuthObserver};
pub use environment::SessionEnvironment;
pub use error::{AuthError, CallbackError, ProviderError, Result};
pub use handlers::{
    CallbackHandler, CallbackOutcome, CallbackPhase, CallbackView, GuardView, LoginInitiator,
    RouteGuard, SessionTerminator,
};
pub use navigation::{Navigator, Route};
pub use providers::{
    IdentityProviderClient, MemoryPendingLoginStore, PendingLoginStore, ProviderSnapshot,
};
pub use reducers::SessionReducer;
pub use state::{AuthState, Identity, InitPhase, PendingLogin, SessionState};
pub use views::{LandingView, ProfileCard};
