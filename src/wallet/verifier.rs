// Wallet verification against the ledger network plus uniqueness binding

use crate::auth::TokenFingerprint;
use crate::core::errors::{IdentityError, StoreError, WalletFailure};
use crate::core::models::{WalletRecord, WalletStatus};
use crate::store::WalletStore;
use crate::wallet::ledger::{LedgerClient, LedgerLookup};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Confirms a public key exists on the ledger and binds it to one account
pub struct WalletVerifier {
    ledger: Arc<dyn LedgerClient>,
    wallets: Arc<dyn WalletStore>,
    lookup_timeout: Option<Duration>,
}

impl WalletVerifier {
    pub fn new(ledger: Arc<dyn LedgerClient>, wallets: Arc<dyn WalletStore>) -> Self {
        Self {
            ledger,
            wallets,
            lookup_timeout: None,
        }
    }

    /// Bound every ledger lookup; an elapsed lookup counts as unreachable
    ///
    /// Store writes are never bounded, so a record is either fully written
    /// and returned or not written at all.
    pub fn with_lookup_timeout(mut self, limit: Duration) -> Self {
        self.lookup_timeout = Some(limit);
        self
    }

    async fn lookup(&self, public_key: &str) -> LedgerLookup {
        let Some(limit) = self.lookup_timeout else {
            return self.ledger.lookup(public_key).await;
        };
        match timeout(limit, self.ledger.lookup(public_key)).await {
            Ok(lookup) => lookup,
            Err(_) => LedgerLookup::Unreachable(format!(
                "lookup timed out after {}ms",
                limit.as_millis()
            )),
        }
    }

    async fn confirm_on_ledger(&self, public_key: &str) -> Result<(), WalletFailure> {
        match self.lookup(public_key).await {
            LedgerLookup::Found => Ok(()),
            LedgerLookup::Missing => {
                info!(public_key = %public_key, "Wallet not found on ledger network");
                Err(WalletFailure::NotFound)
            }
            LedgerLookup::Unreachable(reason) => {
                warn!(public_key = %public_key, reason = %reason, "Ledger lookup failed");
                Err(WalletFailure::NetworkError)
            }
        }
    }

    /// Whether the ledger knows `public_key`
    ///
    /// Never fails: every non-success outcome is logged and reported as `false`.
    pub async fn exists(&self, public_key: &str) -> bool {
        self.confirm_on_ledger(public_key).await.is_ok()
    }

    /// Verify `public_key` on the ledger and persist a record owned by `owner_id`
    ///
    /// The duplicate check before the insert is advisory; a uniqueness
    /// violation raised by the store at write time is also `AlreadyRegistered`.
    pub async fn verify_and_register(
        &self,
        public_key: &str,
        owner_id: Uuid,
    ) -> Result<WalletRecord, WalletFailure> {
        self.confirm_on_ledger(public_key).await?;

        match self.wallets.find_wallet(public_key).await {
            Ok(Some(_)) => {
                info!(public_key = %public_key, "Wallet already registered");
                return Err(WalletFailure::AlreadyRegistered);
            }
            Ok(None) => {}
            Err(e) => {
                error!(error = %e, public_key = %public_key, "Wallet lookup failed");
                return Err(WalletFailure::NetworkError);
            }
        }

        match self.wallets.create_wallet(WalletRecord::verified(public_key, owner_id)).await {
            Ok(record) => {
                info!(
                    public_key = %public_key,
                    owner_id = %owner_id,
                    wallet_id = %record.id,
                    "Wallet verified and registered"
                );
                Ok(record)
            }
            Err(StoreError::Conflict(_)) => {
                info!(public_key = %public_key, "Wallet registered concurrently by another account");
                Err(WalletFailure::AlreadyRegistered)
            }
            Err(e) => {
                error!(error = %e, public_key = %public_key, "Failed to persist wallet record");
                Err(WalletFailure::NetworkError)
            }
        }
    }

    /// Release a record created by a registration that did not complete
    pub async fn release(&self, record: &WalletRecord) {
        if let Err(e) = self.wallets.release_wallet(record.id).await {
            error!(
                error = %e,
                wallet_id = %record.id,
                fingerprint = %TokenFingerprint::of(&record.public_key),
                "Failed to release wallet record"
            );
        }
    }

    /// Stored binding plus current ledger presence of `public_key`
    pub async fn status(&self, public_key: &str) -> Result<WalletStatus, IdentityError> {
        let record = self
            .wallets
            .find_wallet(public_key)
            .await?
            .ok_or_else(|| IdentityError::NotFound("Wallet not found".to_string()))?;

        let on_ledger = match self.lookup(public_key).await {
            LedgerLookup::Found => true,
            LedgerLookup::Missing => false,
            LedgerLookup::Unreachable(reason) => return Err(IdentityError::Network(reason)),
        };

        Ok(WalletStatus {
            public_key: record.public_key,
            owner_id: record.owner_id,
            on_ledger,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryCredentialStore;

    struct FixedLedger(LedgerLookup);

    #[async_trait::async_trait]
    impl LedgerClient for FixedLedger {
        async fn lookup(&self, _public_key: &str) -> LedgerLookup {
            self.0.clone()
        }
    }

    fn verifier(lookup: LedgerLookup) -> (WalletVerifier, Arc<InMemoryCredentialStore>) {
        let store = Arc::new(InMemoryCredentialStore::new());
        let verifier = WalletVerifier::new(Arc::new(FixedLedger(lookup)), store.clone());
        (verifier, store)
    }

    #[tokio::test]
    async fn test_exists_never_fails() {
        assert!(verifier(LedgerLookup::Found).0.exists("GABC").await);
        assert!(!verifier(LedgerLookup::Missing).0.exists("GABC").await);
        assert!(!verifier(LedgerLookup::Unreachable("timeout".into())).0.exists("GABC").await);
    }

    #[tokio::test]
    async fn test_verify_and_register_persists_record() {
        let (verifier, store) = verifier(LedgerLookup::Found);
        let owner = Uuid::new_v4();

        let record = verifier.verify_and_register("GABC", owner).await.unwrap();
        assert_eq!(record.owner_id, owner);
        assert!(record.is_verified);
        assert_eq!(store.wallet_count().await, 1);
    }

    #[tokio::test]
    async fn test_verify_and_register_failures() {
        let (missing, store) = verifier(LedgerLookup::Missing);
        assert_eq!(
            missing.verify_and_register("GHOST", Uuid::new_v4()).await,
            Err(WalletFailure::NotFound)
        );
        assert_eq!(store.wallet_count().await, 0);

        let (down, _) = verifier(LedgerLookup::Unreachable("connection failed".into()));
        assert_eq!(
            down.verify_and_register("GABC", Uuid::new_v4()).await,
            Err(WalletFailure::NetworkError)
        );

        let (found, _) = verifier(LedgerLookup::Found);
        found.verify_and_register("GABC", Uuid::new_v4()).await.unwrap();
        assert_eq!(
            found.verify_and_register("GABC", Uuid::new_v4()).await,
            Err(WalletFailure::AlreadyRegistered)
        );
    }

    #[tokio::test]
    async fn test_release_frees_public_key() {
        let (verifier, store) = verifier(LedgerLookup::Found);
        let record = verifier.verify_and_register("GABC", Uuid::new_v4()).await.unwrap();

        verifier.release(&record).await;
        assert_eq!(store.wallet_count().await, 0);
        assert!(verifier.verify_and_register("GABC", Uuid::new_v4()).await.is_ok());
    }

    #[tokio::test]
    async fn test_status() {
        let (verifier, _) = verifier(LedgerLookup::Found);
        assert!(matches!(verifier.status("GABC").await, Err(IdentityError::NotFound(_))));

        let owner = Uuid::new_v4();
        verifier.verify_and_register("GABC", owner).await.unwrap();
        let status = verifier.status("GABC").await.unwrap();
        assert_eq!(status.owner_id, owner);
        assert!(status.on_ledger);
    }

    struct StalledLedger;

    #[async_trait::async_trait]
    impl LedgerClient for StalledLedger {
        async fn lookup(&self, _public_key: &str) -> LedgerLookup {
            tokio::time::sleep(Duration::from_secs(5)).await;
            LedgerLookup::Found
        }
    }

    #[tokio::test]
    async fn test_lookup_timeout_is_network_error() {
        let store = Arc::new(InMemoryCredentialStore::new());
        let verifier = WalletVerifier::new(Arc::new(StalledLedger), store.clone())
            .with_lookup_timeout(Duration::from_millis(20));

        assert_eq!(
            verifier.verify_and_register("GABC", Uuid::new_v4()).await,
            Err(WalletFailure::NetworkError)
        );
        assert!(!verifier.exists("GABC").await);
        assert_eq!(store.wallet_count().await, 0);
    }
}
