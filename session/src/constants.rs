//! Session constants.
//!
//! Default values and environment variable names used across the crate.

/// Defaults applied when the application does not override them.
pub mod defaults {
    /// `state` value passed to the provider when the caller supplies none.
    pub const LOGIN_STATE: &str = "login";

    /// How long a pending login request stays valid, in seconds (10 minutes).
    pub const PENDING_LOGIN_TTL_SECS: i64 = 600;

    /// Where the provider sends the user after logout.
    pub const POST_LOGOUT_DESTINATION: &str = "/";

    /// Random bytes in a generated `state` value (256 bits).
    pub const GENERATED_STATE_BYTES: usize = 32;

    /// Sandbox endpoints unless configured otherwise.
    pub const SANDBOX_MODE: bool = true;
}

/// Route paths surfaced to the user.
pub mod routes {
    /// Public landing page.
    pub const LANDING: &str = "/";

    /// Provider callback target.
    pub const REDIRECT: &str = "/redirect";

    /// Protected dashboard.
    pub const DASHBOARD: &str = "/dashboard";
}

/// Environment variables read by `SessionConfig::from_env`.
pub mod env_vars {
    /// Absolute URL the provider redirects back to.
    pub const RETURN_URI: &str = "AUTHFLOW_RETURN_URI";

    /// Partner/tenant identifier.
    pub const REFERRAL_CODE: &str = "AUTHFLOW_REFERRAL_CODE";

    /// Cookie domain.
    pub const DOMAIN: &str = "AUTHFLOW_DOMAIN";

    /// Whether cookies are `SameSite`.
    pub const SAME_SITE_COOKIES: &str = "AUTHFLOW_SAME_SITE_COOKIES";

    /// Sandbox vs. production provider endpoint.
    pub const SANDBOX_MODE: &str = "AUTHFLOW_SANDBOX_MODE";
}
