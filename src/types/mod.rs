//! Types module
//!
//! Contains core data structures used throughout the application.
//! This module organizes types into logical submodules:
//! - `account`: The account record and its store key
//! - `transfer`: Transfer requests and their validation
//! - `error`: Error types for the banking engine

pub mod account;
pub mod error;
pub mod transfer;

pub use account::{key_for_id, Account, ACCOUNT_KEY_PREFIX};
pub use error::BankingError;
pub use transfer::TransferRequest;
