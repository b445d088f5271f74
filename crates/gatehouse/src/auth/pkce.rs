// PKCE (RFC 7636) utilities for the OAuth provider round-trip

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use rand::Rng;
use sha2::{Digest, Sha256};

/// Generate a cryptographically random code verifier (43 characters).
///
/// Produces 32 random bytes encoded as base64url (43 chars).
pub fn generate_code_verifier() -> String {
    let mut rng = rand::thread_rng();
    let bytes: [u8; 32] = rng.gen();
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Generate a code challenge from a verifier using SHA-256.
///
/// `challenge = base64url(SHA-256(verifier))`
pub fn compute_code_challenge(verifier: &str) -> String {
    let hash = Sha256::digest(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hash)
}

/// Generate a random state parameter (22 characters) for CSRF protection.
pub fn generate_state() -> String {
    let mut rng = rand::thread_rng();
    let bytes: [u8; 16] = rng.gen();
    URL_SAFE_NO_PAD.encode(bytes)
}
