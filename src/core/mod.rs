//! Core business logic module
//!
//! This module contains the concurrency-sensitive components:
//! - `traits` - Record identity shared by everything the store holds
//! - `record_store` - Keyed record store with one try-lockable latch per record
//! - `calculator` - Decimal-safe balance arithmetic
//! - `transfer` - Two-phase prepare/execute/commit transfer orchestration
//! - `retry` - Caller-side retry loop with pluggable backoff

pub mod calculator;
pub mod record_store;
pub mod retry;
pub mod traits;
pub mod transfer;

pub use calculator::{fits_precision, precise_add, round_to_precision, PRECISION_DP};
pub use record_store::{Access, RecordStore};
pub use retry::{
    retry, retry_async, transfer_with_retry, transfer_with_retry_async, BackoffPolicy,
    ConstantBackoff, ExponentialBackoff, RetryConfig,
};
pub use traits::{IdentifiedRecord, Key};
pub use transfer::{AccountStore, LockOrdering, TransferOrchestrator};
