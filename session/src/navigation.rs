//! Routes and client-side navigation.

use crate::constants::routes;
use serde::{Deserialize, Serialize};

/// Routes surfaced to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Route {
    /// Public landing page, shows the login button or the identity summary.
    Landing,
    /// Callback target the provider redirects to.
    Redirect,
    /// Protected view behind the route guard.
    Dashboard,
}

impl Route {
    /// URL path of the route.
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Landing => routes::LANDING,
            Self::Redirect => routes::REDIRECT,
            Self::Dashboard => routes::DASHBOARD,
        }
    }

    /// Route for a path, ignoring any query string or fragment.
    #[must_use]
    pub fn from_path(path: &str) -> Option<Self> {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        match path {
            routes::LANDING => Some(Self::Landing),
            routes::REDIRECT => Some(Self::Redirect),
            routes::DASHBOARD => Some(Self::Dashboard),
            _ => None,
        }
    }

    /// Whether an authenticated session is required to render the route.
    #[must_use]
    pub const fn requires_auth(self) -> bool {
        matches!(self, Self::Dashboard)
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.path())
    }
}

/// Client-side navigation (history push, no full page load).
pub trait Navigator: Send + Sync {
    /// Navigate to `destination`.
    fn navigate(&self, destination: &str);
}

impl<N: Navigator + ?Sized> Navigator for std::sync::Arc<N> {
    fn navigate(&self, destination: &str) {
        (**self).navigate(destination);
    }
}
