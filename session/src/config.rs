//! Session configuration.
//!
//! [`SessionConfig`] is what the identity provider client is initialized
//! with; it is supplied once at process start. [`SessionSettings`] holds the
//! orchestrator's own knobs (routes, expiry window, defaults).

use crate::constants::{defaults, env_vars};
use crate::error::{AuthError, Result};
use crate::navigation::Route;
use chrono::Duration;
use serde::{Deserialize, Serialize};
use url::Url;

/// Identity provider configuration.
///
/// Invalid values are not rejected here: [`SessionConfig::validate`] runs
/// during initialization so a bad deployment ends in an error *state* the UI
/// can render, not a crash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    return_uri: String,
    referral_code: String,
    domain: Option<String>,
    same_site_cookies: Option<bool>,
    sandbox_mode: bool,
}

impl SessionConfig {
    /// Create a configuration with sandbox mode on and no cookie overrides.
    #[must_use]
    pub fn new(return_uri: impl Into<String>, referral_code: impl Into<String>) -> Self {
        Self {
            return_uri: return_uri.into(),
            referral_code: referral_code.into(),
            domain: None,
            same_site_cookies: None,
            sandbox_mode: defaults::SANDBOX_MODE,
        }
    }

    /// Set the cookie domain.
    #[must_use]
    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    /// Set `SameSite` cookie behaviour.
    #[must_use]
    pub const fn with_same_site_cookies(mut self, same_site: bool) -> Self {
        self.same_site_cookies = Some(same_site);
        self
    }

    /// Toggle sandbox vs. production endpoints.
    #[must_use]
    pub const fn with_sandbox_mode(mut self, sandbox: bool) -> Self {
        self.sandbox_mode = sandbox;
        self
    }

    /// Read configuration from the process environment.
    ///
    /// See [`env_vars`] for the variable names. Missing required variables
    /// become empty strings (rejected later by [`validate`](Self::validate));
    /// unparsable booleans fall back to their defaults with a warning.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    #[must_use]
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let return_uri = lookup(env_vars::RETURN_URI).unwrap_or_default();
        let referral_code = lookup(env_vars::REFERRAL_CODE).unwrap_or_default();
        let domain = lookup(env_vars::DOMAIN).filter(|d| !d.trim().is_empty());
        let same_site_cookies = lookup(env_vars::SAME_SITE_COOKIES)
            .and_then(|raw| parse_flag(env_vars::SAME_SITE_COOKIES, &raw));
        let sandbox_mode = lookup(env_vars::SANDBOX_MODE)
            .and_then(|raw| parse_flag(env_vars::SANDBOX_MODE, &raw))
            .unwrap_or(defaults::SANDBOX_MODE);

        Self {
            return_uri,
            referral_code,
            domain,
            same_site_cookies,
            sandbox_mode,
        }
    }

    /// Check the fields the provider cannot work without.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Configuration`] when `return_uri` or
    /// `referral_code` is empty, `return_uri` does not parse as an absolute
    /// http(s) URL with a host, or `domain` is set but blank.
    pub fn validate(&self) -> Result<()> {
        let return_uri = self.return_uri.trim();
        if return_uri.is_empty() {
            return Err(AuthError::configuration("return_uri", "must not be empty"));
        }
        validate_return_uri(return_uri)?;
        if self.referral_code.trim().is_empty() {
            return Err(AuthError::configuration("referral_code", "must not be empty"));
        }
        if self.domain.as_deref().is_some_and(|d| d.trim().is_empty()) {
            return Err(AuthError::configuration("domain", "must not be blank when set"));
        }
        Ok(())
    }

    /// Absolute URL the provider redirects back to.
    #[must_use]
    pub fn return_uri(&self) -> &str {
        &self.return_uri
    }

    /// Partner/tenant identifier.
    #[must_use]
    pub fn referral_code(&self) -> &str {
        &self.referral_code
    }

    /// Cookie domain, if overridden.
    #[must_use]
    pub fn domain(&self) -> Option<&str> {
        self.domain.as_deref()
    }

    /// `SameSite` cookie behaviour, if overridden.
    #[must_use]
    pub const fn same_site_cookies(&self) -> Option<bool> {
        self.same_site_cookies
    }

    /// Whether the sandbox provider endpoint is used.
    #[must_use]
    pub const fn sandbox_mode(&self) -> bool {
        self.sandbox_mode
    }
}

fn validate_return_uri(raw: &str) -> Result<()> {
    let url = Url::parse(raw).map_err(|e| {
        AuthError::configuration("return_uri", format!("must be an absolute http(s) URL ({e})"))
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(AuthError::configuration(
            "return_uri",
            "must be an absolute http(s) URL",
        ));
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(AuthError::configuration("return_uri", "must name a host"));
    }
    Ok(())
}

fn parse_flag(name: &str, raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        other => {
            tracing::warn!(variable = name, value = other, "Ignoring unparsable boolean");
            None
        },
    }
}

/// Orchestrator behaviour knobs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSettings {
    /// How long a pending login request may wait for its callback.
    pub pending_login_ttl: Duration,

    /// Where the callback handler navigates after a successful exchange.
    pub success_route: Route,

    /// Where the route guard sends unauthenticated users.
    pub landing_route: Route,

    /// Destination passed to the provider on logout.
    pub post_logout_destination: String,

    /// `state` used by `LoginInitiator::login_default`.
    pub default_login_state: String,
}

impl SessionSettings {
    /// Override the pending login expiry window.
    #[must_use]
    pub const fn with_pending_login_ttl(mut self, ttl: Duration) -> Self {
        self.pending_login_ttl = ttl;
        self
    }

    /// Override the post-login destination.
    #[must_use]
    pub const fn with_success_route(mut self, route: Route) -> Self {
        self.success_route = route;
        self
    }

    /// Override the default login `state`.
    #[must_use]
    pub fn with_default_login_state(mut self, state: impl Into<String>) -> Self {
        self.default_login_state = state.into();
        self
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            pending_login_ttl: Duration::seconds(defaults::PENDING_LOGIN_TTL_SECS),
            success_route: Route::Dashboard,
            landing_route: Route::Landing,
            post_logout_destination: defaults::POST_LOGOUT_DESTINATION.to_string(),
            default_login_state: defaults::LOGIN_STATE.to_string(),
        }
    }
}
