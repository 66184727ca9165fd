// Domain error types - typed failures with no information disclosure

use std::fmt;
use thiserror::Error;

/// Reason a wallet could not be bound to an account
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalletFailure {
    /// The ledger network has no account for this public key
    NotFound,
    /// The public key is already bound to an account
    AlreadyRegistered,
    /// The ledger network could not be reached in time
    NetworkError,
}

impl fmt::Display for WalletFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            WalletFailure::NotFound => "not found",
            WalletFailure::AlreadyRegistered => "already registered",
            WalletFailure::NetworkError => "network error",
        };
        f.write_str(reason)
    }
}

/// Main error type for the identity core
#[derive(Error, Debug)]
pub enum IdentityError {
    /// Malformed input (HTTP 400)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Duplicate email or wallet (HTTP 409)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// No matching account or wallet (HTTP 404)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Token signature or structure invalid (HTTP 401)
    #[error("Invalid token")]
    InvalidToken,

    /// Token past its validity horizon (HTTP 410)
    #[error("Token expired")]
    Expired,

    /// Login attempted before email ownership was proven (HTTP 403)
    #[error("Email not verified")]
    EmailNotVerified,

    /// Wallet could not be verified against the ledger (HTTP 422)
    #[error("Wallet verification failed: {reason}")]
    WalletVerificationFailed { reason: WalletFailure },

    /// Ledger network unreachable or timed out (HTTP 503)
    #[error("Network error: {0}")]
    Network(String),

    /// Unexpected failure (HTTP 500)
    #[error("Internal error: {0}")]
    Internal(String),

    /// Configuration error (HTTP 500)
    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Persistence collaborator errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Write-time uniqueness violation or forbidden state change
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Row does not exist
    #[error("Record not found")]
    NotFound,

    /// Storage backend failure
    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// Email dispatch collaborator errors
#[derive(Error, Debug)]
pub enum EmailError {
    #[error("Email transport failed: {0}")]
    Transport(String),

    #[error("Email provider rejected message with status {status}")]
    Rejected { status: u16 },
}

impl From<StoreError> for IdentityError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(what) => IdentityError::Conflict(what),
            StoreError::NotFound => IdentityError::NotFound("Account not found".to_string()),
            StoreError::Backend(msg) => IdentityError::Internal(msg),
        }
    }
}

impl IdentityError {
    /// Get HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            IdentityError::Validation(_) => 400,
            IdentityError::Conflict(_) => 409,
            IdentityError::NotFound(_) => 404,
            IdentityError::InvalidToken => 401,
            IdentityError::Expired => 410,
            IdentityError::EmailNotVerified => 403,
            IdentityError::WalletVerificationFailed { .. } => 422,
            IdentityError::Network(_) => 503,
            IdentityError::Internal(_) => 500,
            IdentityError::Configuration(_) => 500,
        }
    }

    /// Get user-friendly error message (no sensitive information)
    pub fn user_message(&self) -> String {
        match self {
            IdentityError::Validation(msg) => msg.clone(),
            IdentityError::Conflict(_) => "Email or wallet already in use".to_string(),
            IdentityError::NotFound(what) => what.clone(),
            IdentityError::InvalidToken => "Invalid verification token".to_string(),
            IdentityError::Expired => "Verification token has expired".to_string(),
            IdentityError::EmailNotVerified => "Email not verified".to_string(),
            IdentityError::WalletVerificationFailed { reason } => {
                format!("Wallet verification failed: {}", reason)
            }
            IdentityError::Network(_) => "Ledger network unavailable".to_string(),
            IdentityError::Internal(_) => "Internal error".to_string(),
            IdentityError::Configuration(_) => "Internal error".to_string(),
        }
    }

    pub(crate) fn wallet(reason: WalletFailure) -> Self {
        IdentityError::WalletVerificationFailed { reason }
    }
}
