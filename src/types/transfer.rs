//! Transfer request type for the Rust Banking Engine

use super::{Account, BankingError};
use crate::core::calculator::fits_precision;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A request to move `amount` from `sender` to `receiver`
///
/// Built per request. Nothing about the sender's balance is checked at
/// construction time: validation runs inside the orchestrator once both
/// latches are held, against the live record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferRequest {
    /// Store key of the debited account
    pub sender: String,

    /// Store key of the credited account
    pub receiver: String,

    /// Amount to move; must be positive
    pub amount: Decimal,
}

impl TransferRequest {
    pub fn new(sender: impl Into<String>, receiver: impl Into<String>, amount: Decimal) -> Self {
        TransferRequest {
            sender: sender.into(),
            receiver: receiver.into(),
            amount,
        }
    }

    /// Keys the request touches, sender first
    pub fn keys(&self) -> [&str; 2] {
        [self.sender.as_str(), self.receiver.as_str()]
    }

    /// Validate the amount against the sender's current state
    ///
    /// # Errors
    ///
    /// - `InvalidAmount` if the amount is zero, negative, or finer than
    ///   the balance precision (it would be rounded differently on each side)
    /// - `InsufficientFunds` if the amount exceeds the sender's balance
    pub fn validate_amount(&self, sender: &Account) -> Result<(), BankingError> {
        if self.amount <= Decimal::ZERO || !fits_precision(self.amount) {
            return Err(BankingError::invalid_amount(self.amount));
        }

        if self.amount > sender.balance {
            return Err(BankingError::insufficient_funds(
                &self.sender,
                sender.balance,
                self.amount,
            ));
        }

        Ok(())
    }
}
