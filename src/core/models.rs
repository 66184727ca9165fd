// Domain models for accounts, wallets and workflow results

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Persisted account row
///
/// `is_verified == false` implies both token fields are set; once verified
/// both are cleared and stay cleared.
#[derive(Clone, PartialEq, Eq)]
pub struct Account {
    pub id: Uuid,
    pub name: String,
    pub last_name: String,
    pub email: String,
    pub password_hash: String,
    pub wallet_address: String,
    pub is_verified: bool,
    pub verification_token: Option<String>,
    pub verification_token_expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Public view of the account (never includes the password hash)
    pub fn summary(&self) -> AccountSummary {
        AccountSummary {
            id: self.id,
            name: self.name.clone(),
            last_name: self.last_name.clone(),
            email: self.email.clone(),
            wallet_address: self.wallet_address.clone(),
            is_verified: self.is_verified,
            created_at: self.created_at,
        }
    }

    /// Whether the stored verification expiry has elapsed at `now`
    pub fn verification_expired_at(&self, now: DateTime<Utc>) -> bool {
        match self.verification_token_expires_at {
            Some(expires_at) => expires_at <= now,
            None => false,
        }
    }
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("wallet_address", &self.wallet_address)
            .field("is_verified", &self.is_verified)
            .field("password_hash", &"<REDACTED>")
            .field("verification_token", &self.verification_token.as_ref().map(|_| "<REDACTED>"))
            .field("verification_token_expires_at", &self.verification_token_expires_at)
            .finish()
    }
}

/// Insert payload for a freshly registered, unverified account
#[derive(Clone)]
pub struct NewAccount {
    pub id: Uuid,
    pub name: String,
    pub last_name: String,
    pub email: String,
    pub password_hash: String,
    pub wallet_address: String,
    pub verification_token: String,
    pub verification_token_expires_at: DateTime<Utc>,
}

impl NewAccount {
    /// Materialize the row as it is stored, stamped with `now`
    pub fn into_account(self, now: DateTime<Utc>) -> Account {
        Account {
            id: self.id,
            name: self.name,
            last_name: self.last_name,
            email: self.email,
            password_hash: self.password_hash,
            wallet_address: self.wallet_address,
            is_verified: false,
            verification_token: Some(self.verification_token),
            verification_token_expires_at: Some(self.verification_token_expires_at),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Account fields safe to return to callers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountSummary {
    pub id: Uuid,
    pub name: String,
    pub last_name: String,
    pub email: String,
    pub wallet_address: String,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
}

/// Ledger wallet bound to an account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletRecord {
    pub id: Uuid,
    pub public_key: String,
    pub owner_id: Uuid,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
}

impl WalletRecord {
    /// New record for a key that passed ledger verification
    pub fn verified(public_key: &str, owner_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            public_key: public_key.to_string(),
            owner_id,
            is_verified: true,
            created_at: Utc::now(),
        }
    }
}

/// Result of a successful registration
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationOutcome {
    pub account: AccountSummary,
    pub message: String,
}

/// Success-shaped results of the email verification workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailVerificationOutcome {
    Verified,
    AlreadyVerified,
    Resent,
}

impl EmailVerificationOutcome {
    pub fn message(&self) -> &'static str {
        match self {
            EmailVerificationOutcome::Verified => "Email successfully verified",
            EmailVerificationOutcome::AlreadyVerified => "Email already verified",
            EmailVerificationOutcome::Resent => "Verification email resent",
        }
    }
}

impl fmt::Display for EmailVerificationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Read-only verification status of an account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationStatus {
    pub is_verified: bool,
    pub message: String,
}

/// Signed bearer credential returned by login
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Freshly issued email verification token and the horizon to persist with it
#[derive(Debug, Clone)]
pub struct IssuedEmailToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Wallet status as seen by the store and the ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletStatus {
    pub public_key: String,
    pub owner_id: Uuid,
    pub on_ledger: bool,
}
