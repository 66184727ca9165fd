// Email ownership verification and idempotent token re-issue

use crate::auth::{TokenFingerprint, TokenService};
use crate::core::errors::{IdentityError, StoreError};
use crate::core::models::{Account, EmailVerificationOutcome};
use crate::email::EmailDispatcher;
use crate::store::CredentialStore;
use crate::workflows::{dispatch_verification_email, DEFAULT_EMAIL_TIMEOUT};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Drives an account from unverified to verified
///
/// An expired token is rejected on either trigger: the signature's own
/// `exp` claim or the expiry persisted next to the account.
pub struct EmailVerificationWorkflow {
    store: Arc<dyn CredentialStore>,
    tokens: Arc<TokenService>,
    email: Arc<dyn EmailDispatcher>,
    email_timeout: Duration,
}

impl EmailVerificationWorkflow {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        tokens: Arc<TokenService>,
        email: Arc<dyn EmailDispatcher>,
    ) -> Self {
        Self {
            store,
            tokens,
            email,
            email_timeout: DEFAULT_EMAIL_TIMEOUT,
        }
    }

    pub fn with_email_timeout(mut self, email_timeout: Duration) -> Self {
        self.email_timeout = email_timeout;
        self
    }

    /// Consume a verification token
    ///
    /// Submitting a token for an account that is already verified succeeds
    /// with `AlreadyVerified`.
    pub async fn verify(&self, token: &str) -> Result<EmailVerificationOutcome, IdentityError> {
        let fingerprint = TokenFingerprint::of(token);

        let email = self.tokens.verify_email_token(token).map_err(|e| {
            info!(token_fingerprint = %fingerprint, error = %e, "Verification token rejected");
            e
        })?;

        let account = self.load_by_email(&email).await?;

        if account.is_verified {
            info!(account_id = %account.id, "Email already verified");
            return Ok(EmailVerificationOutcome::AlreadyVerified);
        }

        if account.verification_expired_at(Utc::now()) {
            info!(
                account_id = %account.id,
                token_fingerprint = %fingerprint,
                "Stored verification expiry has elapsed"
            );
            return Err(IdentityError::Expired);
        }

        self.store.mark_verified(account.id).await?;

        info!(account_id = %account.id, email = %account.email, "Email verified");
        Ok(EmailVerificationOutcome::Verified)
    }

    /// Issue a fresh token and send it again
    ///
    /// The stored token and expiry are overwritten whether or not the old
    /// token was still active. A verified account gets `AlreadyVerified`
    /// and no email.
    pub async fn resend(&self, email: &str) -> Result<EmailVerificationOutcome, IdentityError> {
        let account = self.load_by_email(email).await?;

        if account.is_verified {
            info!(account_id = %account.id, "Resend skipped: email already verified");
            return Ok(EmailVerificationOutcome::AlreadyVerified);
        }

        let issued = self.tokens.issue_email_token(&account.email)?;

        match self
            .store
            .update_verification_token(account.id, &issued.token, issued.expires_at)
            .await
        {
            Ok(()) => {}
            Err(StoreError::Conflict(_)) => {
                // Verified between the load and the write
                info!(account_id = %account.id, "Resend skipped: verified concurrently");
                return Ok(EmailVerificationOutcome::AlreadyVerified);
            }
            Err(e) => {
                warn!(account_id = %account.id, error = %e, "Failed to store reissued token");
                return Err(e.into());
            }
        }

        dispatch_verification_email(self.email.as_ref(), self.email_timeout, &account.email, &issued.token)
            .await;

        info!(
            account_id = %account.id,
            token_fingerprint = %TokenFingerprint::of(&issued.token),
            expires_at = %issued.expires_at,
            "Verification token reissued"
        );
        Ok(EmailVerificationOutcome::Resent)
    }

    async fn load_by_email(&self, email: &str) -> Result<Account, IdentityError> {
        self.store
            .find_by_email(email)
            .await?
            .ok_or_else(|| IdentityError::NotFound("Account not found".to_string()))
    }
}
