// Persistence interface consumed by the workflows

use crate::core::errors::StoreError;
use crate::core::models::{Account, NewAccount, WalletRecord};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

pub mod memory;
pub mod postgres;

pub use memory::InMemoryCredentialStore;
pub use postgres::PgCredentialStore;

/// Account persistence
///
/// Email and wallet address are unique keys. Implementations must enforce
/// them at write time and report a violation as `StoreError::Conflict`;
/// lookups made before a write are advisory only.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, StoreError>;

    async fn find_by_wallet(&self, wallet_address: &str) -> Result<Option<Account>, StoreError>;

    async fn find_by_verification_token(&self, token: &str) -> Result<Option<Account>, StoreError>;

    async fn create(&self, account: NewAccount) -> Result<Account, StoreError>;

    /// Overwrite the token and its expiry.
    ///
    /// Fails with `StoreError::Conflict` on a verified account and
    /// `StoreError::NotFound` when `id` does not exist.
    async fn update_verification_token(
        &self,
        id: Uuid,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    /// Set the verified flag and clear both token fields in one write
    async fn mark_verified(&self, id: Uuid) -> Result<(), StoreError>;

    async fn is_verified(&self, id: Uuid) -> Result<bool, StoreError>;
}

/// Wallet record persistence (the wallet half of the credential store)
#[async_trait]
pub trait WalletStore: Send + Sync {
    async fn find_wallet(&self, public_key: &str) -> Result<Option<WalletRecord>, StoreError>;

    /// Insert a record; a duplicate public key is `StoreError::Conflict`
    async fn create_wallet(&self, record: WalletRecord) -> Result<WalletRecord, StoreError>;

    /// Remove a record created by a registration attempt that lost a race
    async fn release_wallet(&self, id: Uuid) -> Result<(), StoreError>;
}
