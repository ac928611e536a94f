//! Presentation decisions for the public landing page and profile card.

use crate::state::{AuthState, Identity};
use std::fmt;

/// Placeholder for identity fields the provider did not supply.
pub const NOT_AVAILABLE: &str = "Not available";

/// What the landing page shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LandingView {
    /// Initialization unresolved.
    Loading,
    /// No session; show the login button.
    SignedOut,
    /// Signed in; show the profile card and logout button.
    Profile(ProfileCard),
    /// Error text from `AuthState`.
    Error(String),
}

impl LandingView {
    /// Pick the view for `auth`.
    ///
    /// An error takes precedence over the signed-out view so the user sees
    /// why they are not signed in.
    #[must_use]
    pub fn from_state(auth: &AuthState) -> Self {
        if !auth.is_initialized() {
            return Self::Loading;
        }
        if let Some(error) = auth.error() {
            return Self::Error(error.to_string());
        }
        match auth.identity() {
            Some(identity) if auth.is_authenticated() => Self::Profile(ProfileCard::new(identity)),
            _ => Self::SignedOut,
        }
    }
}

/// Signed-in user's profile summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileCard {
    /// Provider subject id, or the placeholder.
    pub subject_id: String,
    /// Linked address, or the placeholder.
    pub linked_address: String,
}

impl ProfileCard {
    /// Build the card for `identity`.
    #[must_use]
    pub fn new(identity: &Identity) -> Self {
        let or_placeholder = |value: Option<&str>| {
            value
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(NOT_AVAILABLE)
                .to_string()
        };

        Self {
            subject_id: or_placeholder(Some(identity.subject_id.as_str())),
            linked_address: or_placeholder(identity.linked_address.as_deref()),
        }
    }

    /// Labelled lines, in display order.
    #[must_use]
    pub fn lines(&self) -> [(&'static str, &str); 2] {
        [
            ("ID", self.subject_id.as_str()),
            ("Address", self.linked_address.as_str()),
        ]
    }
}

impl fmt::Display for ProfileCard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (label, value) in self.lines() {
            writeln!(f, "{label}: {value}")?;
        }
        Ok(())
    }
}
