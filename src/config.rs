use crate::auth::session::CookieMatch;
use reqwest::Url;
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use zeroize::Zeroizing;

/// Where authenticated requests are forwarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OriginConfig {
    /// No origin bound. Forwarding branches fail closed with 500.
    None,
    /// Serve files from a local directory.
    AssetsDir(PathBuf),
    /// Proxy to an HTTP(S) base URL.
    Upstream(Url),
}

#[derive(Clone)]
pub struct Config {
    // Shared secret. `None` keeps the process up but every request gets a 500.
    pub password: Option<Zeroizing<String>>,

    // Server
    pub bind_addr: SocketAddr,

    // Origin
    pub origin: OriginConfig,
    pub upstream_timeout_secs: u64,

    // Session cookie
    pub cookie_match: CookieMatch,

    // Limits
    pub max_login_body_bytes: usize,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field(
                "password",
                &self.password.as_ref().map(|_| "[REDACTED]"),
            )
            .field("bind_addr", &self.bind_addr)
            .field("origin", &self.origin)
            .field("upstream_timeout_secs", &self.upstream_timeout_secs)
            .field("cookie_match", &self.cookie_match)
            .field("max_login_body_bytes", &self.max_login_body_bytes)
            .finish()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),

    #[error("Failed to parse {0}: {1}")]
    ParseError(String, String),
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        // Attempt to load .env file, but don't fail if it doesn't exist
        let _ = dotenvy::dotenv();

        // An absent secret is not fatal at startup; the gate answers 500 until it is set.
        let password = env::var("CFP_PASSWORD")
            .ok()
            .filter(|p| !p.is_empty())
            .map(Zeroizing::new);

        // Server
        let bind_addr_str = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let bind_addr = bind_addr_str
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::ParseError("BIND_ADDR".to_string(), e.to_string()))?;

        // Origin
        let assets_dir = non_empty_var("CFP_ASSETS_DIR");
        let upstream_url = non_empty_var("CFP_UPSTREAM_URL");

        let origin = match (assets_dir, upstream_url) {
            (Some(_), Some(_)) => {
                return Err(ConfigError::InvalidValue(
                    "CFP_UPSTREAM_URL".to_string(),
                    "cannot be combined with CFP_ASSETS_DIR".to_string(),
                ))
            }
            (Some(dir), None) => OriginConfig::AssetsDir(PathBuf::from(dir)),
            (None, Some(url)) => OriginConfig::Upstream(parse_upstream_url(&url)?),
            (None, None) => OriginConfig::None,
        };

        let upstream_timeout_secs = parse_env_or_default("UPSTREAM_TIMEOUT_SECS", 30)?;
        if upstream_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue(
                "UPSTREAM_TIMEOUT_SECS".to_string(),
                "must be greater than zero".to_string(),
            ));
        }

        // Session cookie
        let cookie_match = parse_env_or_default("CFP_COOKIE_MATCH", CookieMatch::Strict)?;

        // Limits
        let max_login_body_bytes = parse_env_or_default("MAX_LOGIN_BODY_BYTES", 16_384)?;

        Ok(Config {
            password,
            bind_addr,
            origin,
            upstream_timeout_secs,
            cookie_match,
            max_login_body_bytes,
        })
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_upstream_url(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw)
        .map_err(|e| ConfigError::ParseError("CFP_UPSTREAM_URL".to_string(), e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidValue(
            "CFP_UPSTREAM_URL".to_string(),
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }

    Ok(url)
}

/// Helper function to parse environment variable with a default value
fn parse_env_or_default<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(val) => val
            .parse::<T>()
            .map_err(|e| ConfigError::ParseError(key.to_string(), format!("{}: {}", e, val))),
        Err(_) => Ok(default),
    }
}
