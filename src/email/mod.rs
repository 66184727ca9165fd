// Verification email dispatch

use crate::auth::TokenFingerprint;
use crate::core::errors::EmailError;
use async_trait::async_trait;
use tracing::info;

pub mod http;

pub use http::HttpEmailDispatcher;

/// Delivers a verification token to an email address
#[async_trait]
pub trait EmailDispatcher: Send + Sync {
    async fn send(&self, to_email: &str, token: &str) -> Result<(), EmailError>;
}

/// Development dispatcher that only records the send in the log
#[derive(Debug, Default)]
pub struct LoggingEmailDispatcher;

#[async_trait]
impl EmailDispatcher for LoggingEmailDispatcher {
    async fn send(&self, to_email: &str, token: &str) -> Result<(), EmailError> {
        info!(
            to = %to_email,
            token_fingerprint = %TokenFingerprint::of(token),
            "Verification email not delivered (no mail API configured)"
        );
        Ok(())
    }
}
