use failsafe::{backoff, failure_policy, Config, StateMachine, Error};
use failsafe::futures::CircuitBreaker;
use std::time::Duration;
use crate::core::errors::IdentityError;

/// Circuit breaker guarding outbound ledger calls
///
/// Policy:
/// - 5 consecutive transport failures trip the breaker OPEN
/// - 5 seconds cool-down before HALF-OPEN (one probe allowed)
pub type LedgerCircuitBreaker = StateMachine<
    failure_policy::ConsecutiveFailures<backoff::Constant>,
    ()
>;

/// Create a new standard circuit breaker instance
pub fn create_circuit_breaker() -> LedgerCircuitBreaker {
    Config::new()
        .failure_policy(failure_policy::consecutive_failures(
            5,
            backoff::constant(Duration::from_secs(5)),
        ))
        .build()
}

/// Execute a fallible async operation under circuit breaker protection
///
/// Inner failures and rejections while OPEN both surface as
/// `IdentityError::Network`, tagged with `service`.
pub async fn execute_with_cb<F, Fut, T, E>(
    cb: &LedgerCircuitBreaker,
    service: &str,
    operation: F,
) -> Result<T, IdentityError>
where
    F: FnOnce() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
    E: std::fmt::Display + std::fmt::Debug + Send + Sync + 'static,
{
    match cb.call(operation()).await {
        Ok(val) => Ok(val),
        Err(Error::Inner(e)) => Err(IdentityError::Network(format!("{}: {}", service, e))),
        Err(Error::Rejected) => Err(IdentityError::Network(format!(
            "{}: circuit breaker open",
            service
        ))),
    }
}
