//! Authentication for the task server.
//!
//! The task surface is either open or protected by a single bearer token.
//! Validation compares SHA-256 digests in constant time, so a caller probing
//! the token byte-by-byte learns nothing from response timing.

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Authentication configuration for the task server.
#[derive(Debug, Clone)]
pub enum AuthConfig {
    /// No authentication required.
    None,
    /// Bearer token authentication.
    Bearer(String),
}

impl AuthConfig {
    /// Create bearer token authentication.
    pub fn bearer(token: impl Into<String>) -> Self {
        Self::Bearer(token.into())
    }

    /// Validate an `Authorization` header value (e.g. `"Bearer token123"`).
    ///
    /// Returns `true` if the header matches the configured authentication.
    pub fn validate(&self, header: &str) -> bool {
        match self {
            AuthConfig::None => true,
            AuthConfig::Bearer(token) => {
                if let Some(token_part) = header.strip_prefix("Bearer ") {
                    // subtle::ConstantTimeEq on SHA-256 digests prevents timing oracle attacks.
                    // The optimizer cannot short-circuit ct_eq() the way it can with `==`.
                    let expected_hash = Sha256::digest(token.as_bytes());
                    let provided_hash = Sha256::digest(token_part.as_bytes());
                    expected_hash.ct_eq(&provided_hash).into()
                } else {
                    false
                }
            }
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self::None
    }
}
