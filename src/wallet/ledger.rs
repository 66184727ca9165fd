// HTTP client for the ledger network account lookup

use crate::core::errors::IdentityError;
use crate::core::resilience::{create_circuit_breaker, execute_with_cb, LedgerCircuitBreaker};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

/// Outcome of a ledger lookup, normalized so no transport error escapes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerLookup {
    /// Success response carrying an account identity
    Found,
    /// The ledger answered, but the key has no account
    Missing,
    /// Timeout, transport failure, server error or open circuit
    Unreachable(String),
}

/// Lookup-by-public-key capability of the ledger network
#[async_trait]
pub trait LedgerClient: Send + Sync {
    async fn lookup(&self, public_key: &str) -> LedgerLookup;
}

/// Whether `public_key` can be a ledger account id
///
/// Keys are embedded as a URL path segment, so only ASCII alphanumerics pass.
pub fn is_well_formed_key(public_key: &str) -> bool {
    !public_key.is_empty() && public_key.chars().all(|c| c.is_ascii_alphanumeric())
}

/// Subset of the Horizon account resource we rely on
#[derive(Debug, Deserialize)]
struct AccountResource {
    #[serde(default)]
    account_id: Option<String>,
}

/// Stellar Horizon client (`GET {base}/accounts/{public_key}`)
pub struct HorizonLedgerClient {
    http_client: Client,
    base_url: String,
    timeout: Duration,
    cb: LedgerCircuitBreaker,
}

impl HorizonLedgerClient {
    /// Create a client with a bounded per-request timeout
    ///
    /// # Arguments
    /// * `base_url` - ledger network root, e.g. `https://horizon.stellar.org`
    /// * `timeout_secs` - request timeout in seconds
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self, IdentityError> {
        let timeout = Duration::from_secs(timeout_secs);

        let http_client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(2))
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .map_err(|e| IdentityError::Configuration(format!(
                "Failed to create ledger HTTP client: {}", e
            )))?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
            cb: create_circuit_breaker(),
        })
    }

    /// Single lookup; `Ok(false)` means the ledger answered "no such account"
    ///
    /// Only transport-level failures are returned as `Err`, so the circuit
    /// breaker counts outages and not unknown keys.
    async fn lookup_internal(&self, public_key: &str) -> Result<bool, String> {
        if !is_well_formed_key(public_key) {
            debug!(public_key = %public_key, "Malformed key cannot be a ledger account");
            return Ok(false);
        }

        let url = format!("{}/accounts/{}", self.base_url, public_key);
        debug!(url = %url, "Looking up account on ledger network");

        let response = self
            .http_client
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    format!("request timed out after {}s", self.timeout.as_secs())
                } else if e.is_connect() {
                    "connection failed".to_string()
                } else {
                    format!("request failed: {}", e)
                }
            })?;

        let status = response.status();
        if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
            return Err(format!("ledger returned HTTP {}", status));
        }
        if !status.is_success() {
            debug!(status = %status, "Ledger has no account for key");
            return Ok(false);
        }

        match response.json::<AccountResource>().await {
            Ok(resource) => Ok(resource.account_id.is_some_and(|id| !id.is_empty())),
            Err(e) => {
                warn!(error = %e, "Ledger response was not an account resource");
                Ok(false)
            }
        }
    }
}

#[async_trait]
impl LedgerClient for HorizonLedgerClient {
    async fn lookup(&self, public_key: &str) -> LedgerLookup {
        let result = execute_with_cb(&self.cb, "ledger", || async {
            self.lookup_internal(public_key).await
        })
        .await;

        match result {
            Ok(true) => LedgerLookup::Found,
            Ok(false) => LedgerLookup::Missing,
            Err(IdentityError::Network(reason)) => LedgerLookup::Unreachable(reason),
            Err(other) => LedgerLookup::Unreachable(other.to_string()),
        }
    }
}
