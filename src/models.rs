//! Form and query models for the login flow.

use serde::Deserialize;
use zeroize::Zeroizing;

/// Fields posted by the login form.
///
/// Both fields are optional so a malformed submission still deserializes; a missing
/// password simply fails verification.
#[derive(Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub password: Option<Zeroizing<String>>,
    #[serde(default)]
    pub redirect: Option<String>,
}

impl std::fmt::Debug for LoginForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginForm")
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("redirect", &self.redirect)
            .finish()
    }
}

/// Query string of a page request that ended up on the login form.
#[derive(Debug, Default, Deserialize)]
pub struct LoginPageQuery {
    pub error: Option<String>,
}

impl LoginPageQuery {
    /// The banner is shown only for `error=1`, the value written by a failed login.
    pub fn has_error(&self) -> bool {
        self.error.as_deref() == Some("1")
    }
}
