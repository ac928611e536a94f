//! Route Guard.

use crate::context::AuthObserver;
use crate::navigation::{Navigator, Route};
use std::sync::atomic::{AtomicBool, Ordering};

/// What a guarded route renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardView {
    /// Initialization unresolved; never redirect while loading.
    Loading,
    /// No session; a redirect to the landing route has been issued.
    Fallback,
    /// Authenticated; render the protected content.
    Content,
}

/// Route Guard for a protected subtree.
///
/// Re-evaluated on every render. A redirect is issued once per transition
/// into the initialized-and-unauthenticated state, not once per render.
pub struct RouteGuard<N: Navigator> {
    observer: AuthObserver,
    navigator: N,
    redirect_to: Route,
    redirected: AtomicBool,
}

impl<N: Navigator> RouteGuard<N> {
    pub(crate) const fn new(observer: AuthObserver, navigator: N, redirect_to: Route) -> Self {
        Self {
            observer,
            navigator,
            redirect_to,
            redirected: AtomicBool::new(false),
        }
    }

    /// Decide what to render from the current `AuthState`.
    pub fn render(&self) -> GuardView {
        let auth = self.observer.snapshot();

        if !auth.is_initialized() {
            return GuardView::Loading;
        }

        if auth.is_authenticated() {
            self.redirected.store(false, Ordering::SeqCst);
            return GuardView::Content;
        }

        if !self.redirected.swap(true, Ordering::SeqCst) {
            tracing::debug!(to = %self.redirect_to, "No session, redirecting");
            self.navigator.navigate(self.redirect_to.path());
        }
        GuardView::Fallback
    }

    /// Wait for the next `AuthState` change, then render.
    ///
    /// Returns `None` once the context is gone.
    pub async fn next(&mut self) -> Option<GuardView> {
        self.observer.changed().await?;
        Some(self.render())
    }
}

