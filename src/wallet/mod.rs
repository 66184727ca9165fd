// Ledger-backed wallet verification

pub mod ledger;
pub mod verifier;

pub use ledger::{is_well_formed_key, HorizonLedgerClient, LedgerClient, LedgerLookup};
pub use verifier::WalletVerifier;
