// Common test utilities and helpers for all test modules
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Duration as ChronoDuration;
use secrecy::Secret;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use volunchain_identity::auth::TokenService;
use uuid::Uuid;
use volunchain_identity::core::errors::{EmailError, StoreError};
use volunchain_identity::core::models::WalletRecord;
use volunchain_identity::email::EmailDispatcher;
use volunchain_identity::store::{InMemoryCredentialStore, WalletStore};
use volunchain_identity::wallet::{LedgerClient, LedgerLookup};
use volunchain_identity::workflows::RegistrationRequest;
use volunchain_identity::{Collaborators, IdentityService, Timeouts};

pub const EMAIL_SECRET: &str = "integration-email-secret-0123456789abcdef";
pub const SESSION_SECRET: &str = "integration-session-secret-0123456789abcdef";

/// Ledger stub answering from a fixed table; unknown keys are `Missing`
pub struct ScriptedLedgerClient {
    pub answers: HashMap<String, LedgerLookup>,
    pub delay: Option<Duration>,
    pub calls: AtomicUsize,
}

impl Default for ScriptedLedgerClient {
    fn default() -> Self {
        let mut answers = HashMap::new();
        answers.insert("GABCWALLET".to_string(), LedgerLookup::Found);
        answers.insert("GOTHERWALLET".to_string(), LedgerLookup::Found);
        answers.insert(
            "GDOWNWALLET".to_string(),
            LedgerLookup::Unreachable("connection failed".to_string()),
        );
        Self {
            answers,
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }
}

impl ScriptedLedgerClient {
    /// Ledger where every key in `keys` exists
    pub fn knowing(keys: &[&str]) -> Self {
        let mut ledger = Self::default();
        for key in keys {
            ledger.answers.insert(key.to_string(), LedgerLookup::Found);
        }
        ledger
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LedgerClient for ScriptedLedgerClient {
    async fn lookup(&self, public_key: &str) -> LedgerLookup {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.answers
            .get(public_key)
            .cloned()
            .unwrap_or(LedgerLookup::Missing)
    }
}

/// Email dispatcher that records every `(to_email, token)` it is given
#[derive(Default)]
pub struct RecordingEmailDispatcher {
    pub sent: Mutex<Vec<(String, String)>>,
    pub send_should_fail: bool,
}

impl RecordingEmailDispatcher {
    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            send_should_fail: true,
        }
    }

    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    pub fn last_token(&self) -> Option<String> {
        self.sent.lock().unwrap().last().map(|(_, token)| token.clone())
    }
}

#[async_trait]
impl EmailDispatcher for RecordingEmailDispatcher {
    async fn send(&self, to_email: &str, token: &str) -> Result<(), EmailError> {
        self.sent
            .lock()
            .unwrap()
            .push((to_email.to_string(), token.to_string()));
        if self.send_should_fail {
            return Err(EmailError::Transport("SMTP relay unavailable".to_string()));
        }
        Ok(())
    }
}

/// Wallet store that commits each insert, then stalls before acknowledging it
pub struct SlowAckWalletStore {
    pub inner: Arc<InMemoryCredentialStore>,
    pub ack_delay: Duration,
}

#[async_trait]
impl WalletStore for SlowAckWalletStore {
    async fn find_wallet(&self, public_key: &str) -> Result<Option<WalletRecord>, StoreError> {
        self.inner.find_wallet(public_key).await
    }

    async fn create_wallet(&self, record: WalletRecord) -> Result<WalletRecord, StoreError> {
        let created = self.inner.create_wallet(record).await?;
        tokio::time::sleep(self.ack_delay).await;
        Ok(created)
    }

    async fn release_wallet(&self, id: Uuid) -> Result<(), StoreError> {
        self.inner.release_wallet(id).await
    }
}

pub fn test_token_service() -> TokenService {
    TokenService::new(
        &Secret::new(EMAIL_SECRET.to_string()),
        &Secret::new(SESSION_SECRET.to_string()),
    )
}

/// Fully wired service over in-memory collaborators
pub struct TestHarness {
    pub service: Arc<IdentityService>,
    pub store: Arc<InMemoryCredentialStore>,
    pub ledger: Arc<ScriptedLedgerClient>,
    pub email: Arc<RecordingEmailDispatcher>,
}

pub struct HarnessBuilder {
    ledger: ScriptedLedgerClient,
    email: RecordingEmailDispatcher,
    tokens: TokenService,
    timeouts: Timeouts,
}

impl HarnessBuilder {
    pub fn ledger(mut self, ledger: ScriptedLedgerClient) -> Self {
        self.ledger = ledger;
        self
    }

    pub fn email(mut self, email: RecordingEmailDispatcher) -> Self {
        self.email = email;
        self
    }

    pub fn token_lifetimes(mut self, email_ttl: ChronoDuration, session_ttl: ChronoDuration) -> Self {
        self.tokens = self.tokens.with_lifetimes(email_ttl, session_ttl);
        self
    }

    pub fn wallet_timeout(mut self, timeout: Duration) -> Self {
        self.timeouts.wallet_verification = timeout;
        self
    }

    pub fn build(self) -> TestHarness {
        let store = Arc::new(InMemoryCredentialStore::new());
        let ledger = Arc::new(self.ledger);
        let email = Arc::new(self.email);

        let collaborators = Collaborators {
            store: store.clone(),
            wallets: store.clone(),
            ledger: ledger.clone(),
            email: email.clone(),
        };

        TestHarness {
            service: Arc::new(IdentityService::new(collaborators, self.tokens, self.timeouts)),
            store,
            ledger,
            email,
        }
    }
}

pub fn harness_builder() -> HarnessBuilder {
    HarnessBuilder {
        ledger: ScriptedLedgerClient::default(),
        email: RecordingEmailDispatcher::default(),
        tokens: test_token_service(),
        timeouts: Timeouts::default(),
    }
}

pub fn harness() -> TestHarness {
    harness_builder().build()
}

pub fn ana_request() -> RegistrationRequest {
    RegistrationRequest::new("Ana", "Lee", "ana@x.com", "pw123456", "GABCWALLET")
}

pub fn request_for(email: &str, wallet: &str) -> RegistrationRequest {
    RegistrationRequest::new("Test", "User", email, "pw123456", wallet)
}
