// Composition root: builds every component once and wires the workflows

use crate::auth::{PasswordHasher, TokenService};
use crate::config::Config;
use crate::core::errors::IdentityError;
use crate::email::{EmailDispatcher, HttpEmailDispatcher, LoggingEmailDispatcher};
use crate::store::{CredentialStore, InMemoryCredentialStore, PgCredentialStore, WalletStore};
use crate::wallet::{HorizonLedgerClient, LedgerClient, WalletVerifier};
use crate::workflows::{
    AuthenticationWorkflow, EmailVerificationWorkflow, RegistrationWorkflow,
    VerificationStatusQuery, DEFAULT_EMAIL_TIMEOUT, DEFAULT_WALLET_TIMEOUT,
};
use secrecy::{ExposeSecret, Secret};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// External collaborators the workflows consume
#[derive(Clone)]
pub struct Collaborators {
    pub store: Arc<dyn CredentialStore>,
    pub wallets: Arc<dyn WalletStore>,
    pub ledger: Arc<dyn LedgerClient>,
    pub email: Arc<dyn EmailDispatcher>,
}

impl Collaborators {
    /// Both store halves backed by one in-memory store
    pub fn in_memory(ledger: Arc<dyn LedgerClient>, email: Arc<dyn EmailDispatcher>) -> Self {
        let store = Arc::new(InMemoryCredentialStore::new());
        Self {
            store: store.clone(),
            wallets: store,
            ledger,
            email,
        }
    }
}

/// Bounds applied by the workflows to outbound calls
#[derive(Debug, Clone, Copy)]
pub struct Timeouts {
    pub wallet_verification: Duration,
    pub email_dispatch: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            wallet_verification: DEFAULT_WALLET_TIMEOUT,
            email_dispatch: DEFAULT_EMAIL_TIMEOUT,
        }
    }
}

/// Fully wired identity core
pub struct IdentityService {
    pub registration: RegistrationWorkflow,
    pub verification: EmailVerificationWorkflow,
    pub authentication: AuthenticationWorkflow,
    pub status: VerificationStatusQuery,
    pub wallets: Arc<WalletVerifier>,
    pub tokens: Arc<TokenService>,
    pub hasher: Arc<PasswordHasher>,
}

impl IdentityService {
    pub fn new(collaborators: Collaborators, tokens: TokenService, timeouts: Timeouts) -> Self {
        let Collaborators { store, wallets, ledger, email } = collaborators;

        let tokens = Arc::new(tokens);
        let hasher = Arc::new(PasswordHasher::new());
        let verifier = Arc::new(
            WalletVerifier::new(ledger, wallets).with_lookup_timeout(timeouts.wallet_verification),
        );

        let registration = RegistrationWorkflow::new(
            store.clone(),
            verifier.clone(),
            tokens.clone(),
            hasher.clone(),
            email.clone(),
        )
        .with_email_timeout(timeouts.email_dispatch);

        let verification = EmailVerificationWorkflow::new(store.clone(), tokens.clone(), email)
            .with_email_timeout(timeouts.email_dispatch);

        Self {
            registration,
            verification,
            authentication: AuthenticationWorkflow::new(store.clone(), tokens.clone()),
            status: VerificationStatusQuery::new(store, tokens.clone()),
            wallets: verifier,
            tokens,
            hasher,
        }
    }

    /// Build the service from configuration
    ///
    /// Connects to Postgres when `DATABASE_URL` is set and to the mail API
    /// when `EMAIL_API_URL` is set; otherwise falls back to the in-memory
    /// store and log-only dispatch.
    pub async fn from_config(config: &Config) -> Result<Self, IdentityError> {
        let ledger: Arc<dyn LedgerClient> = Arc::new(HorizonLedgerClient::new(
            &config.ledger_url,
            config.ledger_timeout_secs,
        )?);

        let email: Arc<dyn EmailDispatcher> = match (&config.email_api_url, &config.email_api_key) {
            (Some(api_url), Some(api_key)) => {
                info!(api_url = %api_url, "Using HTTP email dispatcher");
                Arc::new(HttpEmailDispatcher::new(
                    api_url,
                    Secret::new(api_key.expose_secret().clone()),
                    &config.email_sender,
                    &config.verification_base_url,
                    config.email_timeout_secs,
                )?)
            }
            _ => {
                info!("EMAIL_API_URL not set, verification emails will only be logged");
                Arc::new(LoggingEmailDispatcher)
            }
        };

        let collaborators = match &config.database_url {
            Some(url) => {
                let store = Arc::new(PgCredentialStore::connect(url).await?);
                info!("Using Postgres credential store");
                Collaborators {
                    store: store.clone(),
                    wallets: store,
                    ledger,
                    email,
                }
            }
            None => {
                info!("DATABASE_URL not set, using in-memory credential store");
                Collaborators::in_memory(ledger, email)
            }
        };

        let tokens = TokenService::new(&config.email_secret, &config.jwt_secret);
        let timeouts = Timeouts {
            wallet_verification: Duration::from_secs(config.wallet_verification_timeout_secs),
            email_dispatch: Duration::from_secs(config.email_timeout_secs),
        };

        Ok(Self::new(collaborators, tokens, timeouts))
    }
}
