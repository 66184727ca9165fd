// In-memory credential store for development and tests

use crate::core::errors::StoreError;
use crate::core::models::{Account, NewAccount, WalletRecord};
use crate::store::{CredentialStore, WalletStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
struct Tables {
    accounts: HashMap<Uuid, Account>,
    wallets: HashMap<Uuid, WalletRecord>,
}

/// Credential store backed by process memory
///
/// All writes take the same lock, so the uniqueness checks inside `create`
/// and `create_wallet` are authoritative even under concurrent callers.
#[derive(Default)]
pub struct InMemoryCredentialStore {
    tables: RwLock<Tables>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored accounts
    pub async fn account_count(&self) -> usize {
        self.tables.read().await.accounts.len()
    }

    /// Number of stored wallet records
    pub async fn wallet_count(&self) -> usize {
        self.tables.read().await.wallets.len()
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.accounts.values().find(|a| a.email == email).cloned())
    }

    async fn find_by_wallet(&self, wallet_address: &str) -> Result<Option<Account>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .accounts
            .values()
            .find(|a| a.wallet_address == wallet_address)
            .cloned())
    }

    async fn find_by_verification_token(&self, token: &str) -> Result<Option<Account>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .accounts
            .values()
            .find(|a| a.verification_token.as_deref() == Some(token))
            .cloned())
    }

    async fn create(&self, account: NewAccount) -> Result<Account, StoreError> {
        let mut tables = self.tables.write().await;

        for existing in tables.accounts.values() {
            if existing.id == account.id {
                return Err(StoreError::Conflict("accounts_pkey".to_string()));
            }
            if existing.email == account.email {
                return Err(StoreError::Conflict("accounts_email_key".to_string()));
            }
            if existing.wallet_address == account.wallet_address {
                return Err(StoreError::Conflict("accounts_wallet_address_key".to_string()));
            }
        }

        let stored = account.into_account(Utc::now());
        tables.accounts.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn update_verification_token(
        &self,
        id: Uuid,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        let account = tables.accounts.get_mut(&id).ok_or(StoreError::NotFound)?;

        if account.is_verified {
            return Err(StoreError::Conflict("account already verified".to_string()));
        }

        account.verification_token = Some(token.to_string());
        account.verification_token_expires_at = Some(expires_at);
        account.updated_at = Utc::now();
        Ok(())
    }

    async fn mark_verified(&self, id: Uuid) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        let account = tables.accounts.get_mut(&id).ok_or(StoreError::NotFound)?;

        account.is_verified = true;
        account.verification_token = None;
        account.verification_token_expires_at = None;
        account.updated_at = Utc::now();
        Ok(())
    }

    async fn is_verified(&self, id: Uuid) -> Result<bool, StoreError> {
        let tables = self.tables.read().await;
        tables
            .accounts
            .get(&id)
            .map(|a| a.is_verified)
            .ok_or(StoreError::NotFound)
    }
}

#[async_trait]
impl WalletStore for InMemoryCredentialStore {
    async fn find_wallet(&self, public_key: &str) -> Result<Option<WalletRecord>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.wallets.values().find(|w| w.public_key == public_key).cloned())
    }

    async fn create_wallet(&self, record: WalletRecord) -> Result<WalletRecord, StoreError> {
        let mut tables = self.tables.write().await;

        if tables.wallets.values().any(|w| w.public_key == record.public_key) {
            return Err(StoreError::Conflict("wallet_records_public_key_key".to_string()));
        }

        tables.wallets.insert(record.id, record.clone());
        Ok(record)
    }

    async fn release_wallet(&self, id: Uuid) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        tables.wallets.remove(&id).map(|_| ()).ok_or(StoreError::NotFound)
    }
}
