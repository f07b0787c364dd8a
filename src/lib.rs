//! Rust Banking Engine Library
//! # Overview
//!
//! This library provides an in-memory account store with per-account
//! try-lock latches and a two-phase transfer protocol on top of it, served
//! over a small HTTP API.
//!
//! # Architecture
//!
//! The system is organized into several key components:
//!
//! - [`types`] - Core data types (Account, TransferRequest, BankingError)
//! - [`core`] - Business logic components:
//!   - [`core::record_store`] - Keyed records, each guarded by its own latch
//!   - [`core::transfer`] - Prepare/execute/commit transfer orchestration
//!   - [`core::calculator`] - Decimal balance arithmetic at 6 decimal places
//!   - [`core::retry`] - Caller-side retry with pluggable backoff
//! - [`io`] - Loading the initial accounts from a URL or file
//! - [`config`] - Server configuration
//! - [`cli`] - CLI arguments parsing
//! - [`api`] - axum router and handlers
//!
//! # Transfers
//!
//! A transfer moves a positive amount from a sender to a different receiver:
//!
//! - **Prepare**: try-lock both accounts, failing fast with `RowLocked`
//! - **Execute**: validate against the sender's balance, write both balances
//! - **Commit / Rollback**: release both latches
//!
//! The orchestrator never waits for a latch. Callers that want a transfer to
//! eventually go through use [`core::transfer_with_retry`].
//!
//! # Account State
//!
//! Each account maintains:
//! - `id`: Unique identifier, stored under the key `account-<id>`
//! - `name`: Display label
//! - `balance`: Decimal balance, never negative

pub mod api;
pub mod cli;
pub mod config;
pub mod core;
pub mod io;
pub mod types;

pub use config::ServerConfig;
pub use core::{AccountStore, LockOrdering, RecordStore, TransferOrchestrator};
pub use types::{Account, BankingError, TransferRequest};
