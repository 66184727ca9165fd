// Credential primitives: tokens, password hashing, log-safe fingerprints

pub mod fingerprint;
pub mod password;
pub mod tokens;

pub use fingerprint::TokenFingerprint;
pub use password::PasswordHasher;
pub use tokens::TokenService;
