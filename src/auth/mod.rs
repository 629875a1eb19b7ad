//! Shared-password authentication: verification, the session token, and the gate.

pub mod middleware;
pub mod session;
pub mod verify;

pub use middleware::{decide, gate, AppState, Decision};
pub use session::{derive_session_token, has_session_cookie, CookieMatch};
pub use verify::verify_password;
