//! Error types for the Rust Banking Engine
//!
//! This module defines every error that can surface from the record store,
//! the transfer orchestrator, and the bootstrap collaborators.
//!
//! # Error Categories
//!
//! - **Store Errors**: Record not found, record exists, row locked, unlocked before
//! - **Validation Errors**: Invalid amount, insufficient funds, same account
//! - **Arithmetic Errors**: Overflow while computing a new balance
//! - **Bootstrap Errors**: I/O, seeding, and configuration failures

use rust_decimal::Decimal;
use thiserror::Error;

/// Main error type for the banking engine
///
/// Store errors are mechanical and bubble unchanged through the orchestrator
/// to the boundary layer. Validation errors are business-rule failures
/// returned straight to the caller. None of them is fatal to the process.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BankingError {
    /// No record exists for the key
    #[error("Record not found: {key}")]
    RecordNotFound {
        /// The key that was looked up
        key: String,
    },

    /// A record already exists for the key (duplicate create)
    #[error("Record already exists: {key}")]
    RecordExists {
        /// The key that was already present
        key: String,
    },

    /// The record's latch is held by another caller
    ///
    /// This is the only contention error and the only one that is always
    /// safe to retry.
    #[error("Row is locked: {key}")]
    RowLocked {
        /// The contended key
        key: String,
    },

    /// Unlock was requested for a latch that was not held
    #[error("Row was unlocked before: {key}")]
    UnlockedBefore {
        /// The key whose latch was already free
        key: String,
    },

    /// Transfer amount is zero or negative
    #[error("Invalid amount {amount}")]
    InvalidAmount {
        /// The rejected amount
        amount: Decimal,
    },

    /// Transfer amount exceeds the sender's live balance
    #[error("Insufficient funds for account {account}: balance {balance}, requested {requested}")]
    InsufficientFunds {
        /// Sender key
        account: String,
        /// Sender balance at execution time
        balance: Decimal,
        /// Requested transfer amount
        requested: Decimal,
    },

    /// Sender and receiver are the same account
    #[error("Sender and receiver are the same account: {key}")]
    SameAccount {
        /// The duplicated key
        key: String,
    },

    /// Decimal arithmetic left the representable range
    #[error("Arithmetic overflow in {operation} for account {account}")]
    ArithmeticOverflow {
        /// Operation that would overflow
        operation: String,
        /// Account key
        account: String,
    },

    /// I/O error while reading seed data
    #[error("I/O error: {message}")]
    IoError {
        /// Description of the I/O error
        message: String,
    },

    /// Seed accounts could not be fetched or decoded
    #[error("Seed error: {message}")]
    SeedError {
        /// Description of the failure
        message: String,
    },

    /// Invalid configuration value
    #[error("Configuration error: {message}")]
    ConfigError {
        /// Description of the problem
        message: String,
    },
}

impl From<std::io::Error> for BankingError {
    fn from(error: std::io::Error) -> Self {
        BankingError::IoError {
            message: error.to_string(),
        }
    }
}

impl From<serde_json::Error> for BankingError {
    fn from(error: serde_json::Error) -> Self {
        BankingError::SeedError {
            message: format!("cannot decode accounts: {}", error),
        }
    }
}

impl From<reqwest::Error> for BankingError {
    fn from(error: reqwest::Error) -> Self {
        BankingError::SeedError {
            message: format!("cannot load accounts: {}", error),
        }
    }
}

// Helper functions for creating common errors

impl BankingError {
    /// Create a RecordNotFound error
    pub fn record_not_found(key: &str) -> Self {
        BankingError::RecordNotFound {
            key: key.to_string(),
        }
    }

    /// Create a RecordExists error
    pub fn record_exists(key: &str) -> Self {
        BankingError::RecordExists {
            key: key.to_string(),
        }
    }

    /// Create a RowLocked error
    pub fn row_locked(key: &str) -> Self {
        BankingError::RowLocked {
            key: key.to_string(),
        }
    }

    /// Create an UnlockedBefore error
    pub fn unlocked_before(key: &str) -> Self {
        BankingError::UnlockedBefore {
            key: key.to_string(),
        }
    }

    /// Create an InvalidAmount error
    pub fn invalid_amount(amount: Decimal) -> Self {
        BankingError::InvalidAmount { amount }
    }

    /// Create an InsufficientFunds error
    pub fn insufficient_funds(account: &str, balance: Decimal, requested: Decimal) -> Self {
        BankingError::InsufficientFunds {
            account: account.to_string(),
            balance,
            requested,
        }
    }

    /// Create a SameAccount error
    pub fn same_account(key: &str) -> Self {
        BankingError::SameAccount {
            key: key.to_string(),
        }
    }

    /// Create an ArithmeticOverflow error
    pub fn arithmetic_overflow(operation: &str, account: &str) -> Self {
        BankingError::ArithmeticOverflow {
            operation: operation.to_string(),
            account: account.to_string(),
        }
    }

    /// Create a ConfigError
    pub fn config(message: impl Into<String>) -> Self {
        BankingError::ConfigError {
            message: message.into(),
        }
    }

    /// Whether the error comes from latch contention
    pub fn is_contention(&self) -> bool {
        matches!(self, BankingError::RowLocked { .. })
    }
}
