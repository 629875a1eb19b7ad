//! Session token derivation and the session cookie.

use crate::auth::verify::digest;
use std::fmt;
use std::str::FromStr;

/// Name of the session cookie.
pub const SESSION_COOKIE_NAME: &str = "CFP-Auth-Key";

/// Session cookie lifetime: one week.
pub const SESSION_COOKIE_MAX_AGE_SECS: u64 = 60 * 60 * 24 * 7;

/// Derive the session token for a configured password.
///
/// The token is a pure function of the password: no salt, no nonce, no timestamp.
/// Every successful login hands out the same value, and it stays valid for as long as
/// the password is unchanged.
pub fn derive_session_token(password: &str) -> String {
    digest(password)
}

/// Build the `Set-Cookie` header value issued after a successful login.
pub fn session_set_cookie(token: &str) -> String {
    format!(
        "{}={}; Max-Age={}; Path=/; HttpOnly; Secure",
        SESSION_COOKIE_NAME, token, SESSION_COOKIE_MAX_AGE_SECS
    )
}

/// How the `Cookie` header is checked for the session token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CookieMatch {
    /// Split the header into `name=value` pairs; require the session cookie with the
    /// exact token.
    Strict,
    /// Accept any header containing `CFP-Auth-Key=<token>` anywhere in it. Not anchored
    /// to cookie boundaries, so another cookie's value can satisfy it.
    Substring,
}

impl fmt::Display for CookieMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CookieMatch::Strict => write!(f, "strict"),
            CookieMatch::Substring => write!(f, "substring"),
        }
    }
}

impl FromStr for CookieMatch {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(CookieMatch::Strict),
            "substring" => Ok(CookieMatch::Substring),
            other => Err(format!("unknown cookie match mode '{}'", other)),
        }
    }
}

/// Whether a raw `Cookie` header carries a valid session for `token`.
pub fn has_session_cookie(cookie_header: &str, token: &str, mode: CookieMatch) -> bool {
    if token.is_empty() {
        return false;
    }

    match mode {
        CookieMatch::Strict => cookie_header
            .split(';')
            .filter_map(|pair| pair.trim().split_once('='))
            .any(|(key, value)| key.trim() == SESSION_COOKIE_NAME && value.trim() == token),
        CookieMatch::Substring => {
            cookie_header.contains(&format!("{}={}", SESSION_COOKIE_NAME, token))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOKEN: &str = "2bb80d537b1da3e38bd30361aa855686bde0eacd7162fef6a25fe97bf527a25b";

    #[test]
    fn test_derive_session_token_deterministic() {
        let a = derive_session_token("secret");
        let b = derive_session_token("secret");
        assert_eq!(a, b);
        assert_eq!(a, TOKEN);
    }

    #[test]
    fn test_derive_session_token_differs_per_password() {
        assert_ne!(derive_session_token("secret"), derive_session_token("secret2"));
    }

    #[test]
    fn test_session_set_cookie_attributes() {
        let header = session_set_cookie(TOKEN);
        assert!(header.starts_with(&format!("CFP-Auth-Key={};", TOKEN)));
        assert!(header.contains("Max-Age=604800"));
        assert!(header.contains("Path=/"));
        assert!(header.contains("HttpOnly"));
        assert!(header.contains("Secure"));
    }

    #[test]
    fn test_strict_accepts_exact_cookie() {
        let header = format!("a=1; CFP-Auth-Key={}", TOKEN);
        assert!(has_session_cookie(&header, TOKEN, CookieMatch::Strict));
        assert!(has_session_cookie(
            &format!("CFP-Auth-Key={}", TOKEN),
            TOKEN,
            CookieMatch::Strict
        ));
    }

    #[test]
    fn test_strict_rejects_embedded_token() {
        // The session pair hidden inside another cookie's value
        let header = format!("tracker=xCFP-Auth-Key={}", TOKEN);
        assert!(!has_session_cookie(&header, TOKEN, CookieMatch::Strict));
        assert!(has_session_cookie(&header, TOKEN, CookieMatch::Substring));
    }

    #[test]
    fn test_strict_rejects_token_prefix_match() {
        let header = format!("CFP-Auth-Key={}extra", TOKEN);
        assert!(!has_session_cookie(&header, TOKEN, CookieMatch::Strict));
        // Substring mode is not anchored at the end of the value either
        assert!(has_session_cookie(&header, TOKEN, CookieMatch::Substring));
    }

    #[test]
    fn test_wrong_token_rejected_in_both_modes() {
        let header = "CFP-Auth-Key=deadbeef";
        assert!(!has_session_cookie(header, TOKEN, CookieMatch::Strict));
        assert!(!has_session_cookie(header, TOKEN, CookieMatch::Substring));
    }

    #[test]
    fn test_empty_token_never_matches() {
        assert!(!has_session_cookie("CFP-Auth-Key=", "", CookieMatch::Strict));
        assert!(!has_session_cookie("CFP-Auth-Key=", "", CookieMatch::Substring));
    }

    #[test]
    fn test_cookie_match_from_str() {
        assert_eq!("strict".parse::<CookieMatch>(), Ok(CookieMatch::Strict));
        assert_eq!(" Substring ".parse::<CookieMatch>(), Ok(CookieMatch::Substring));
        assert!("exact".parse::<CookieMatch>().is_err());
        assert_eq!(CookieMatch::Substring.to_string(), "substring");
    }
}
