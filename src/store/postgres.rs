// Postgres-backed credential store

use crate::core::errors::StoreError;
use crate::core::models::{Account, NewAccount, WalletRecord};
use crate::store::{CredentialStore, WalletStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use tracing::{error, info};
use uuid::Uuid;

const ACCOUNT_COLUMNS: &str = "id, name, last_name, email, password_hash, wallet_address, \
     is_verified, verification_token, verification_token_expires_at, created_at, updated_at";

const SCHEMA: [&str; 2] = [
    "CREATE TABLE IF NOT EXISTS accounts (
        id UUID PRIMARY KEY,
        name TEXT NOT NULL,
        last_name TEXT NOT NULL,
        email TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        wallet_address TEXT NOT NULL UNIQUE,
        is_verified BOOLEAN NOT NULL DEFAULT FALSE,
        verification_token TEXT,
        verification_token_expires_at TIMESTAMPTZ,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )",
    "CREATE TABLE IF NOT EXISTS wallet_records (
        id UUID PRIMARY KEY,
        public_key TEXT NOT NULL UNIQUE,
        owner_id UUID NOT NULL,
        is_verified BOOLEAN NOT NULL DEFAULT FALSE,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )",
];

/// Database row structure for account lookup
#[derive(FromRow)]
struct AccountRow {
    id: Uuid,
    name: String,
    last_name: String,
    email: String,
    password_hash: String,
    wallet_address: String,
    is_verified: bool,
    verification_token: Option<String>,
    verification_token_expires_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<AccountRow> for Account {
    fn from(r: AccountRow) -> Self {
        Account {
            id: r.id,
            name: r.name,
            last_name: r.last_name,
            email: r.email,
            password_hash: r.password_hash,
            wallet_address: r.wallet_address,
            is_verified: r.is_verified,
            verification_token: r.verification_token,
            verification_token_expires_at: r.verification_token_expires_at,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[derive(FromRow)]
struct WalletRow {
    id: Uuid,
    public_key: String,
    owner_id: Uuid,
    is_verified: bool,
    created_at: DateTime<Utc>,
}

impl From<WalletRow> for WalletRecord {
    fn from(r: WalletRow) -> Self {
        WalletRecord {
            id: r.id,
            public_key: r.public_key,
            owner_id: r.owner_id,
            is_verified: r.is_verified,
            created_at: r.created_at,
        }
    }
}

/// Credential store on a Postgres pool
///
/// Uniqueness is enforced by UNIQUE constraints; violations surface as
/// `StoreError::Conflict` carrying the constraint name.
pub struct PgCredentialStore {
    db_pool: PgPool,
}

impl PgCredentialStore {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }

    /// Connect to `database_url` and build a store
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let db_pool = PgPool::connect(database_url).await.map_err(|e| {
            error!(error = %e, "Failed to connect to database");
            map_sqlx_error(e)
        })?;
        Ok(Self::new(db_pool))
    }

    /// Create the `accounts` and `wallet_records` tables if missing
    pub async fn migrate(&self) -> Result<(), StoreError> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&self.db_pool)
                .await
                .map_err(map_sqlx_error)?;
        }
        info!("Credential store schema is up to date");
        Ok(())
    }

    async fn find_account_where(
        &self,
        column: &str,
        value: &str,
    ) -> Result<Option<Account>, StoreError> {
        let sql = format!("SELECT {} FROM accounts WHERE {} = $1", ACCOUNT_COLUMNS, column);
        let row = sqlx::query_as::<_, AccountRow>(&sql)
            .bind(value)
            .fetch_optional(&self.db_pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(row.map(Account::from))
    }
}

fn map_sqlx_error(err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            StoreError::Conflict(db.constraint().unwrap_or("unique constraint").to_string())
        }
        sqlx::Error::RowNotFound => StoreError::NotFound,
        other => StoreError::Backend(other.to_string()),
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        self.find_account_where("email", email).await
    }

    async fn find_by_wallet(&self, wallet_address: &str) -> Result<Option<Account>, StoreError> {
        self.find_account_where("wallet_address", wallet_address).await
    }

    async fn find_by_verification_token(&self, token: &str) -> Result<Option<Account>, StoreError> {
        self.find_account_where("verification_token", token).await
    }

    async fn create(&self, account: NewAccount) -> Result<Account, StoreError> {
        let sql = format!(
            "INSERT INTO accounts (id, name, last_name, email, password_hash, wallet_address, \
             is_verified, verification_token, verification_token_expires_at) \
             VALUES ($1, $2, $3, $4, $5, $6, FALSE, $7, $8) \
             RETURNING {}",
            ACCOUNT_COLUMNS
        );

        let row = sqlx::query_as::<_, AccountRow>(&sql)
            .bind(account.id)
            .bind(&account.name)
            .bind(&account.last_name)
            .bind(&account.email)
            .bind(&account.password_hash)
            .bind(&account.wallet_address)
            .bind(&account.verification_token)
            .bind(account.verification_token_expires_at)
            .fetch_one(&self.db_pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.into())
    }

    async fn update_verification_token(
        &self,
        id: Uuid,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE accounts
             SET verification_token = $2, verification_token_expires_at = $3, updated_at = NOW()
             WHERE id = $1 AND is_verified = FALSE",
        )
        .bind(id)
        .bind(token)
        .bind(expires_at)
        .execute(&self.db_pool)
        .await
        .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            // Either the row is gone or it was verified in the meantime
            return match self.is_verified(id).await? {
                true => Err(StoreError::Conflict("account already verified".to_string())),
                false => Err(StoreError::NotFound),
            };
        }
        Ok(())
    }

    async fn mark_verified(&self, id: Uuid) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE accounts
             SET is_verified = TRUE, verification_token = NULL,
                 verification_token_expires_at = NULL, updated_at = NOW()
             WHERE id = $1",
        )
        .bind(id)
        .execute(&self.db_pool)
        .await
        .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn is_verified(&self, id: Uuid) -> Result<bool, StoreError> {
        sqlx::query_scalar::<_, bool>("SELECT is_verified FROM accounts WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db_pool)
            .await
            .map_err(map_sqlx_error)?
            .ok_or(StoreError::NotFound)
    }
}

#[async_trait]
impl WalletStore for PgCredentialStore {
    async fn find_wallet(&self, public_key: &str) -> Result<Option<WalletRecord>, StoreError> {
        let row = sqlx::query_as::<_, WalletRow>(
            "SELECT id, public_key, owner_id, is_verified, created_at
             FROM wallet_records WHERE public_key = $1",
        )
        .bind(public_key)
        .fetch_optional(&self.db_pool)
        .await
        .map_err(map_sqlx_error)?;
        Ok(row.map(WalletRecord::from))
    }

    async fn create_wallet(&self, record: WalletRecord) -> Result<WalletRecord, StoreError> {
        let row = sqlx::query_as::<_, WalletRow>(
            "INSERT INTO wallet_records (id, public_key, owner_id, is_verified, created_at)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING id, public_key, owner_id, is_verified, created_at",
        )
        .bind(record.id)
        .bind(&record.public_key)
        .bind(record.owner_id)
        .bind(record.is_verified)
        .bind(record.created_at)
        .fetch_one(&self.db_pool)
        .await
        .map_err(map_sqlx_error)?;
        Ok(row.into())
    }

    async fn release_wallet(&self, id: Uuid) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM wallet_records WHERE id = $1")
            .bind(id)
            .execute(&self.db_pool)
            .await
            .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        assert_eq!(map_sqlx_error(sqlx::Error::RowNotFound), StoreError::NotFound);
    }

    #[test]
    fn test_other_errors_map_to_backend() {
        let err = map_sqlx_error(sqlx::Error::PoolTimedOut);
        assert!(matches!(err, StoreError::Backend(_)));
    }

    #[test]
    fn test_schema_declares_unique_keys() {
        assert!(SCHEMA[0].contains("email TEXT NOT NULL UNIQUE"));
        assert!(SCHEMA[0].contains("wallet_address TEXT NOT NULL UNIQUE"));
        assert!(SCHEMA[1].contains("public_key TEXT NOT NULL UNIQUE"));
    }
}
