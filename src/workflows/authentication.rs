// Wallet-based login for verified accounts

use crate::auth::TokenService;
use crate::core::errors::IdentityError;
use crate::core::models::SessionToken;
use crate::store::CredentialStore;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

pub struct AuthenticationWorkflow {
    store: Arc<dyn CredentialStore>,
    tokens: Arc<TokenService>,
}

impl AuthenticationWorkflow {
    pub fn new(store: Arc<dyn CredentialStore>, tokens: Arc<TokenService>) -> Self {
        Self { store, tokens }
    }

    /// Issue a session token for the account bound to `wallet_address`
    ///
    /// Login is blocked with `EmailNotVerified` until the email is verified.
    pub async fn authenticate(&self, wallet_address: &str) -> Result<SessionToken, IdentityError> {
        let account = self
            .store
            .find_by_wallet(wallet_address)
            .await?
            .ok_or_else(|| IdentityError::NotFound("Account not found".to_string()))?;

        if !account.is_verified {
            info!(account_id = %account.id, "Login rejected: email not verified");
            return Err(IdentityError::EmailNotVerified);
        }

        let session = self.tokens.issue_session_token(account.id)?;
        info!(account_id = %account.id, expires_at = %session.expires_at, "Session issued");
        Ok(session)
    }

    /// Account id carried by a session token
    pub fn resolve_session(&self, token: &str) -> Result<Uuid, IdentityError> {
        self.tokens.verify_session_token(token)
    }

    /// Fail with `EmailNotVerified` unless `account_id` is verified
    pub async fn require_verified(&self, account_id: Uuid) -> Result<(), IdentityError> {
        if self.store.is_verified(account_id).await? {
            Ok(())
        } else {
            Err(IdentityError::EmailNotVerified)
        }
    }
}
