// Library root for the VolunChain identity core

pub mod auth;
pub mod config;
pub mod core;
pub mod email;
pub mod service;
pub mod store;
pub mod telemetry;
pub mod wallet;
pub mod workflows;

pub use crate::core::errors::{IdentityError, WalletFailure};
pub use crate::service::{Collaborators, IdentityService, Timeouts};
