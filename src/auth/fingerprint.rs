// Log-safe token fingerprints

use sha2::{Digest, Sha256};
use std::fmt;

/// Short SHA-256 fingerprint of a bearer token
///
/// Deterministic, so the same token can be correlated across log lines
/// without ever writing the token itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TokenFingerprint(String);

impl TokenFingerprint {
    const PREFIX_LEN: usize = 12;

    pub fn of(token: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(token.as_bytes());
        let digest = hex::encode(hasher.finalize());
        Self(digest[..Self::PREFIX_LEN].to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TokenFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
