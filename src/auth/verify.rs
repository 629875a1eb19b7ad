//! Shared-password verification.

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// SHA-256 of `input`, rendered as 64 lowercase hex characters.
pub fn digest(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

/// Check a submitted password against the configured one.
///
/// Both sides are digested before comparing, so the comparison always runs over two
/// 64-byte strings regardless of what was submitted. The digests are compared in
/// constant time.
///
/// # Returns
/// * `true` if the digests match
/// * `false` on mismatch, or if either input is empty
pub fn verify_password(submitted: &str, configured: &str) -> bool {
    if submitted.is_empty() || configured.is_empty() {
        return false;
    }

    let submitted_digest = digest(submitted);
    let configured_digest = digest(configured);

    submitted_digest
        .as_bytes()
        .ct_eq(configured_digest.as_bytes())
        .into()
}
