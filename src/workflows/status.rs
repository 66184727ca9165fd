// Read-only verification status

use crate::auth::TokenService;
use crate::core::errors::IdentityError;
use crate::core::models::VerificationStatus;
use crate::store::CredentialStore;
use std::sync::Arc;
use uuid::Uuid;

pub struct VerificationStatusQuery {
    store: Arc<dyn CredentialStore>,
    tokens: Arc<TokenService>,
}

impl VerificationStatusQuery {
    pub fn new(store: Arc<dyn CredentialStore>, tokens: Arc<TokenService>) -> Self {
        Self { store, tokens }
    }

    pub async fn check_status(&self, account_id: Uuid) -> Result<VerificationStatus, IdentityError> {
        let is_verified = self.store.is_verified(account_id).await?;
        let message = if is_verified {
            "Email is verified"
        } else {
            "Email is not verified"
        };

        Ok(VerificationStatus {
            is_verified,
            message: message.to_string(),
        })
    }

    /// Status of the account a session token was issued to
    pub async fn check_status_for_session(
        &self,
        session_token: &str,
    ) -> Result<VerificationStatus, IdentityError> {
        let account_id = self.tokens.verify_session_token(session_token)?;
        self.check_status(account_id).await
    }
}
