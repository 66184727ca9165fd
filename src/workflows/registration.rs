// Account registration: wallet proof, credential hashing, verification email

use crate::auth::{PasswordHasher, TokenService};
use crate::core::errors::IdentityError;
use crate::core::models::{Account, NewAccount, RegistrationOutcome, WalletRecord};
use crate::email::EmailDispatcher;
use crate::store::CredentialStore;
use crate::wallet::{is_well_formed_key, WalletVerifier};
use crate::workflows::{dispatch_verification_email, DEFAULT_EMAIL_TIMEOUT};
use secrecy::{ExposeSecret, Secret};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use uuid::Uuid;

const MIN_PASSWORD_LEN: usize = 8;

const REGISTERED_MESSAGE: &str = "Registration successful. Please verify your email.";

/// Registration input
#[derive(Debug)]
pub struct RegistrationRequest {
    pub name: String,
    pub last_name: String,
    pub email: String,
    pub password: Secret<String>,
    pub wallet_address: String,
}

impl RegistrationRequest {
    pub fn new(
        name: &str,
        last_name: &str,
        email: &str,
        password: &str,
        wallet_address: &str,
    ) -> Self {
        Self {
            name: name.to_string(),
            last_name: last_name.to_string(),
            email: email.to_string(),
            password: Secret::new(password.to_string()),
            wallet_address: wallet_address.to_string(),
        }
    }

    /// Reject malformed input before any lookup or network call
    pub fn validate(&self) -> Result<(), IdentityError> {
        if self.name.trim().is_empty() {
            return Err(IdentityError::Validation("Name is required".to_string()));
        }
        if self.last_name.trim().is_empty() {
            return Err(IdentityError::Validation("Last name is required".to_string()));
        }
        if !is_plausible_email(&self.email) {
            return Err(IdentityError::Validation("Email address is invalid".to_string()));
        }
        if self.password.expose_secret().chars().count() < MIN_PASSWORD_LEN {
            return Err(IdentityError::Validation(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }
        if !is_well_formed_key(&self.wallet_address) {
            return Err(IdentityError::Validation("Wallet address is invalid".to_string()));
        }
        Ok(())
    }
}

fn is_plausible_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && !domain.is_empty() && !domain.contains('@'),
        None => false,
    }
}

/// Creates unverified accounts bound to a ledger-verified wallet
pub struct RegistrationWorkflow {
    store: Arc<dyn CredentialStore>,
    wallets: Arc<WalletVerifier>,
    tokens: Arc<TokenService>,
    hasher: Arc<PasswordHasher>,
    email: Arc<dyn EmailDispatcher>,
    email_timeout: Duration,
}

impl RegistrationWorkflow {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        wallets: Arc<WalletVerifier>,
        tokens: Arc<TokenService>,
        hasher: Arc<PasswordHasher>,
        email: Arc<dyn EmailDispatcher>,
    ) -> Self {
        Self {
            store,
            wallets,
            tokens,
            hasher,
            email,
            email_timeout: DEFAULT_EMAIL_TIMEOUT,
        }
    }

    pub fn with_email_timeout(mut self, email_timeout: Duration) -> Self {
        self.email_timeout = email_timeout;
        self
    }

    /// Register a new account
    ///
    /// No account row is written unless the wallet was verified on the
    /// ledger and bound first. A failed email dispatch is logged and the
    /// registration still succeeds.
    pub async fn register(
        &self,
        request: RegistrationRequest,
    ) -> Result<RegistrationOutcome, IdentityError> {
        request.validate()?;

        if self.store.find_by_email(&request.email).await?.is_some() {
            info!(email = %request.email, "Registration rejected: email already registered");
            return Err(IdentityError::Conflict("email already registered".to_string()));
        }

        let account_id = Uuid::new_v4();
        let wallet = self.bind_wallet(&request.wallet_address, account_id).await?;

        let account = match self.persist_account(&request, account_id).await {
            Ok(account) => account,
            Err(e) => {
                // The wallet record belongs to an account that will never exist
                self.wallets.release(&wallet).await;
                return Err(e);
            }
        };

        if let Some(token) = account.verification_token.as_deref() {
            dispatch_verification_email(self.email.as_ref(), self.email_timeout, &account.email, token)
                .await;
        }

        info!(
            account_id = %account.id,
            email = %account.email,
            wallet = %account.wallet_address,
            "Account registered"
        );

        Ok(RegistrationOutcome {
            account: account.summary(),
            message: REGISTERED_MESSAGE.to_string(),
        })
    }

    /// The ledger lookup inside is bounded by the verifier; the record write
    /// is not, so a failure here never leaves a record behind.
    async fn bind_wallet(
        &self,
        wallet_address: &str,
        account_id: Uuid,
    ) -> Result<WalletRecord, IdentityError> {
        self.wallets
            .verify_and_register(wallet_address, account_id)
            .await
            .map_err(|reason| {
                info!(wallet = %wallet_address, reason = %reason, "Registration rejected: wallet verification failed");
                IdentityError::wallet(reason)
            })
    }

    async fn persist_account(
        &self,
        request: &RegistrationRequest,
        account_id: Uuid,
    ) -> Result<Account, IdentityError> {
        let password_hash = self
            .hasher
            .clone()
            .hash_blocking(Secret::new(request.password.expose_secret().clone()))
            .await?;
        let issued = self.tokens.issue_email_token(&request.email)?;

        let new_account = NewAccount {
            id: account_id,
            name: request.name.trim().to_string(),
            last_name: request.last_name.trim().to_string(),
            email: request.email.clone(),
            password_hash,
            wallet_address: request.wallet_address.clone(),
            verification_token: issued.token,
            verification_token_expires_at: issued.expires_at,
        };

        self.store.create(new_account).await.map_err(|e| {
            error!(error = %e, email = %request.email, "Failed to persist account");
            IdentityError::from(e)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> RegistrationRequest {
        RegistrationRequest::new("Ana", "Lee", "ana@x.com", "pw123456", "GABCWALLET")
    }

    #[test]
    fn test_valid_request() {
        assert!(request().validate().is_ok());
    }

    #[test]
    fn test_rejects_blank_names() {
        let mut req = request();
        req.name = "  ".to_string();
        assert!(matches!(req.validate(), Err(IdentityError::Validation(_))));

        let mut req = request();
        req.last_name = String::new();
        assert!(matches!(req.validate(), Err(IdentityError::Validation(_))));
    }

    #[test]
    fn test_rejects_malformed_email() {
        for email in ["", "ana", "@x.com", "ana@", "ana@x@y.com", "ana @x.com"] {
            let mut req = request();
            req.email = email.to_string();
            assert!(
                matches!(req.validate(), Err(IdentityError::Validation(_))),
                "accepted {:?}",
                email
            );
        }
    }

    #[test]
    fn test_rejects_short_password() {
        let mut req = request();
        req.password = Secret::new("short".to_string());
        assert!(matches!(req.validate(), Err(IdentityError::Validation(_))));
    }

    #[test]
    fn test_rejects_wallet_outside_path_alphabet() {
        for wallet in ["", "GABC/../x", "GABC WALLET", "GABC?x=1"] {
            let mut req = request();
            req.wallet_address = wallet.to_string();
            assert!(matches!(req.validate(), Err(IdentityError::Validation(_))));
        }
    }

    #[test]
    fn test_debug_hides_password() {
        let debug = format!("{:?}", request());
        assert!(!debug.contains("pw123456"));
    }
}
