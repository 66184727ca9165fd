// Account lifecycle workflows

use crate::auth::TokenFingerprint;
use crate::email::EmailDispatcher;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, warn};

pub mod authentication;
pub mod registration;
pub mod status;
pub mod verification;

pub use authentication::AuthenticationWorkflow;
pub use registration::{RegistrationRequest, RegistrationWorkflow};
pub use status::VerificationStatusQuery;
pub use verification::EmailVerificationWorkflow;

/// Default bound on a ledger lookup during wallet verification
pub const DEFAULT_WALLET_TIMEOUT: Duration = Duration::from_secs(10);

/// Default bound on a verification email dispatch
pub const DEFAULT_EMAIL_TIMEOUT: Duration = Duration::from_secs(5);

/// Send a verification email; failures are logged and swallowed
///
/// Returns whether the dispatcher reported success.
pub(crate) async fn dispatch_verification_email(
    dispatcher: &dyn EmailDispatcher,
    limit: Duration,
    to_email: &str,
    token: &str,
) -> bool {
    let fingerprint = TokenFingerprint::of(token);

    match timeout(limit, dispatcher.send(to_email, token)).await {
        Ok(Ok(())) => {
            debug!(to = %to_email, token_fingerprint = %fingerprint, "Verification email dispatched");
            true
        }
        Ok(Err(e)) => {
            warn!(
                error = %e,
                to = %to_email,
                token_fingerprint = %fingerprint,
                "Verification email dispatch failed"
            );
            false
        }
        Err(_) => {
            warn!(
                to = %to_email,
                token_fingerprint = %fingerprint,
                timeout_ms = limit.as_millis() as u64,
                "Verification email dispatch timed out"
            );
            false
        }
    }
}
