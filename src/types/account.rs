//! Account-related types for the Rust Banking Engine
//!
//! This module defines the Account record held by the record store.

use crate::core::traits::IdentifiedRecord;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Prefix of every account key in the record store
pub const ACCOUNT_KEY_PREFIX: &str = "account-";

/// Bank account record
///
/// `id` and `name` never change once the account exists. `balance` is only
/// mutated by whoever holds the account's latch in the record store, or by
/// single-threaded setup code before the store is shared.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    /// Globally unique identifier
    pub id: Uuid,

    /// Display label
    pub name: String,

    /// Current balance
    ///
    /// Serialized as a decimal string; accepted as a string or a number.
    pub balance: Decimal,
}

impl Account {
    /// Create a new account with a fresh random id
    pub fn new(name: impl Into<String>, balance: Decimal) -> Self {
        Account {
            id: Uuid::new_v4(),
            name: name.into(),
            balance,
        }
    }

    /// Store key for this account
    pub fn key(&self) -> String {
        key_for_id(&self.id.to_string())
    }
}

impl IdentifiedRecord for Account {
    fn record_key(&self) -> String {
        self.key()
    }
}

/// Build the store key for a raw account id, e.g. from a URL path segment
pub fn key_for_id(id: &str) -> String {
    format!("{}{}", ACCOUNT_KEY_PREFIX, id)
}
