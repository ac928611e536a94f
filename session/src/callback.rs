//! Provider callback parameters.

use crate::error::CallbackError;
use serde::{Deserialize, Serialize};
use url::Url;

const RELATIVE_BASE: &str = "http://localhost/";

/// Protocol parameters the provider appends to the callback URL.
///
/// Every field is optional on the wire; which combination is acceptable is
/// decided when the callback is resolved.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallbackParams {
    /// Authorization code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    /// Echo of the `state` sent when the login started.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,

    /// Protocol error code, when the provider refused the login.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Human-readable error detail.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_description: Option<String>,
}

impl CallbackParams {
    /// Parameters of a successful authorization.
    #[must_use]
    pub fn success(code: impl Into<String>, state: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            state: Some(state.into()),
            ..Self::default()
        }
    }

    /// Parse a query string, with or without the leading `?`.
    ///
    /// Unknown parameters are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`CallbackError::Malformed`] if the query cannot be decoded.
    pub fn from_query(query: &str) -> Result<Self, CallbackError> {
        let query = query.strip_prefix('?').unwrap_or(query);
        serde_urlencoded::from_str(query).map_err(|e| CallbackError::Malformed(e.to_string()))
    }

    /// Parse the query string of a full or relative URL; the fragment is ignored.
    ///
    /// Relative URLs (`/redirect?code=...`) are resolved against a
    /// placeholder origin, which never leaks into the parameters.
    ///
    /// # Errors
    ///
    /// Returns [`CallbackError::Malformed`] if the URL or its query cannot be
    /// parsed.
    pub fn from_url(url: &str) -> Result<Self, CallbackError> {
        let malformed = |e: url::ParseError| CallbackError::Malformed(e.to_string());
        let base = Url::parse(RELATIVE_BASE).map_err(malformed)?;
        let url = Url::options()
            .base_url(Some(&base))
            .parse(url.trim())
            .map_err(malformed)?;

        url.query().map_or_else(|| Ok(Self::default()), Self::from_query)
    }

    /// Encode as a query string (no leading `?`).
    #[must_use]
    pub fn to_query(&self) -> String {
        serde_urlencoded::to_string(self).unwrap_or_default()
    }

    /// Non-empty `state` parameter, if any.
    #[must_use]
    pub fn state_param(&self) -> Option<&str> {
        self.state.as_deref().filter(|s| !s.is_empty())
    }
}
