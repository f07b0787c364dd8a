//! Two-phase transfer orchestration
//!
//! This module provides the `TransferOrchestrator` struct, which composes the
//! record store's non-blocking latches into an atomic transfer between two
//! accounts.
//!
//! # Protocol
//!
//! ```text
//! prepare(sender, receiver)   try-lock every key, release all on first failure
//!     │
//! execute(request)            read both unsynchronized, validate, write both
//!     │
//! commit(keys) | rollback(keys)   release every latch
//! ```
//!
//! Every successful `prepare` must be paired with exactly one `commit` or
//! `rollback`, otherwise the keys stay latched forever. The orchestrator never
//! retries and never waits for a latch; see [`super::retry`] for the
//! caller-side loop.

use super::calculator::precise_add;
use super::record_store::{Access, RecordStore};
use crate::types::{Account, BankingError, TransferRequest};
use std::sync::Arc;

/// Record store holding accounts
pub type AccountStore = RecordStore<Account>;

/// Order in which `prepare` acquires latches
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LockOrdering {
    /// Acquire in the order the caller lists the keys
    ///
    /// Two opposite-direction transfers between the same pair can each take
    /// one latch and fail on the other, repeatedly, under sustained
    /// contention. No thread ever blocks.
    #[default]
    AsGiven,

    /// Acquire in lexicographic key order
    ///
    /// Opposite-direction transfers contend on the same first key, so one of
    /// them always wins both latches.
    Canonical,
}

/// Orchestrates prepare/execute/commit transfers over an account store
#[derive(Debug, Clone)]
pub struct TransferOrchestrator {
    store: Arc<AccountStore>,
    ordering: LockOrdering,
}

impl TransferOrchestrator {
    /// Create an orchestrator over an explicitly owned store
    pub fn new(store: Arc<AccountStore>) -> Self {
        Self {
            store,
            ordering: LockOrdering::default(),
        }
    }

    /// Set the latch acquisition order used by `prepare`
    pub fn with_lock_ordering(mut self, ordering: LockOrdering) -> Self {
        self.ordering = ordering;
        self
    }

    pub fn lock_ordering(&self) -> LockOrdering {
        self.ordering
    }

    /// The underlying account store
    pub fn store(&self) -> &Arc<AccountStore> {
        &self.store
    }

    /// All accounts, read with the given access mode
    pub fn accounts(&self, access: Access) -> Vec<Account> {
        self.store.get_many(&self.store.keys(), access)
    }

    /// A single account by store key
    pub fn account(&self, key: &str, access: Access) -> Result<Account, BankingError> {
        self.store.get(key, access)
    }

    /// Try-lock every key
    ///
    /// On the first failure every latch taken so far is released
    /// (best-effort, release failures are logged) and the original error is
    /// returned. On success the caller exclusively holds every key until
    /// [`commit`](Self::commit) or [`rollback`](Self::rollback).
    ///
    /// # Errors
    ///
    /// - `SameAccount` if a key is listed twice (nothing is locked)
    /// - `RecordNotFound` if a key is absent
    /// - `RowLocked` if a latch is held by someone else
    pub fn prepare(&self, keys: &[&str]) -> Result<(), BankingError> {
        for (index, key) in keys.iter().enumerate() {
            if keys[..index].contains(key) {
                return Err(BankingError::same_account(key));
            }
        }

        let mut ordered = keys.to_vec();
        if self.ordering == LockOrdering::Canonical {
            ordered.sort_unstable();
        }

        let mut acquired: Vec<&str> = Vec::with_capacity(ordered.len());
        for key in ordered {
            if let Err(err) = self.store.try_lock(key) {
                tracing::debug!(account = key, error = %err, "cannot lock account");
                self.release(&acquired);
                return Err(err);
            }
            acquired.push(key);
        }

        Ok(())
    }

    /// Apply a transfer whose keys are already held via `prepare`
    ///
    /// Both balances are validated and computed before either record is
    /// written, so a failure leaves both accounts untouched.
    ///
    /// # Returns
    ///
    /// The updated sender account.
    ///
    /// # Errors
    ///
    /// - `SameAccount` if sender and receiver are the same key
    /// - `RecordNotFound` if a held key has no record
    /// - `InvalidAmount` if the amount is not positive
    /// - `InsufficientFunds` if the amount exceeds the sender's live balance
    /// - `ArithmeticOverflow` if a new balance is out of range
    pub fn execute(&self, request: &TransferRequest) -> Result<Account, BankingError> {
        if request.sender == request.receiver {
            return Err(BankingError::same_account(&request.sender));
        }

        let mut sender = self.locked_account(&request.sender)?;
        let mut receiver = self.locked_account(&request.receiver)?;

        if let Err(err) = request.validate_amount(&sender) {
            tracing::debug!(
                sender = %request.sender,
                receiver = %request.receiver,
                amount = %request.amount,
                error = %err,
                "invalid amount"
            );
            return Err(err);
        }

        let sender_balance = precise_add(sender.balance, -request.amount)
            .ok_or_else(|| BankingError::arithmetic_overflow("debit", &request.sender))?;
        let receiver_balance = precise_add(receiver.balance, request.amount)
            .ok_or_else(|| BankingError::arithmetic_overflow("credit", &request.receiver))?;

        sender.balance = sender_balance;
        receiver.balance = receiver_balance;

        self.store
            .set(&request.sender, sender.clone(), Access::Unsynchronized);
        self.store
            .set(&request.receiver, receiver, Access::Unsynchronized);

        Ok(sender)
    }

    /// Release every key after a successful `execute`
    pub fn commit(&self, keys: &[&str]) {
        self.release(keys);
    }

    /// Release every key without reverting anything
    ///
    /// Identical to `commit`. Safe because `execute` either writes both
    /// records or neither.
    pub fn rollback(&self, keys: &[&str]) {
        self.release(keys);
    }

    /// One prepare/execute/commit attempt
    ///
    /// Rolls back when `execute` fails. Contention is returned as
    /// `RowLocked`, never retried here.
    pub fn transfer(&self, request: &TransferRequest) -> Result<Account, BankingError> {
        let keys = request.keys();
        self.prepare(&keys)?;

        match self.execute(request) {
            Ok(sender) => {
                self.commit(&keys);
                Ok(sender)
            }
            Err(err) => {
                self.rollback(&keys);
                Err(err)
            }
        }
    }

    fn locked_account(&self, key: &str) -> Result<Account, BankingError> {
        self.store.get(key, Access::Unsynchronized).map_err(|err| {
            tracing::error!(account = key, "account locked but doesn't exist");
            err
        })
    }

    fn release(&self, keys: &[&str]) {
        for key in keys {
            if let Err(err) = self.store.unlock(key) {
                tracing::warn!(account = *key, error = %err, "cannot unlock account");
            }
        }
    }
}
