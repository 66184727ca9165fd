// Compile-time and error-contract checks on the public surface

use static_assertions::assert_impl_all;
use volunchain_identity::auth::{PasswordHasher, TokenService};
use volunchain_identity::email::{HttpEmailDispatcher, LoggingEmailDispatcher};
use volunchain_identity::store::{InMemoryCredentialStore, PgCredentialStore};
use volunchain_identity::wallet::{HorizonLedgerClient, WalletVerifier};
use volunchain_identity::workflows::{
    AuthenticationWorkflow, EmailVerificationWorkflow, RegistrationWorkflow, VerificationStatusQuery,
};
use volunchain_identity::{IdentityError, IdentityService, WalletFailure};

assert_impl_all!(IdentityService: Send, Sync);
assert_impl_all!(RegistrationWorkflow: Send, Sync);
assert_impl_all!(EmailVerificationWorkflow: Send, Sync);
assert_impl_all!(AuthenticationWorkflow: Send, Sync);
assert_impl_all!(VerificationStatusQuery: Send, Sync);
assert_impl_all!(TokenService: Send, Sync);
assert_impl_all!(PasswordHasher: Send, Sync);
assert_impl_all!(WalletVerifier: Send, Sync);
assert_impl_all!(HorizonLedgerClient: Send, Sync);
assert_impl_all!(InMemoryCredentialStore: Send, Sync);
assert_impl_all!(PgCredentialStore: Send, Sync);
assert_impl_all!(HttpEmailDispatcher: Send, Sync);
assert_impl_all!(LoggingEmailDispatcher: Send, Sync);
assert_impl_all!(IdentityError: std::error::Error, Send, Sync);

#[test]
fn test_every_error_kind_has_distinct_status() {
    let errors = [
        IdentityError::Validation("bad".to_string()),
        IdentityError::Conflict("accounts_email_key".to_string()),
        IdentityError::NotFound("Account not found".to_string()),
        IdentityError::InvalidToken,
        IdentityError::Expired,
        IdentityError::EmailNotVerified,
        IdentityError::WalletVerificationFailed { reason: WalletFailure::NotFound },
        IdentityError::Network("timeout".to_string()),
    ];

    let mut codes: Vec<u16> = errors.iter().map(IdentityError::status_code).collect();
    codes.sort_unstable();
    codes.dedup();
    assert_eq!(codes.len(), errors.len());
}

#[test]
fn test_internal_errors_hide_detail() {
    for err in [
        IdentityError::Internal("sqlx pool timed out".to_string()),
        IdentityError::Configuration("JWT_SECRET not set".to_string()),
    ] {
        assert_eq!(err.status_code(), 500);
        assert_eq!(err.user_message(), "Internal error");
    }
}
