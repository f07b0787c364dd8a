//! Shared application state for the HTTP handlers

use crate::config::ServerConfig;
use crate::core::{AccountStore, ExponentialBackoff, RetryConfig, TransferOrchestrator};
use std::sync::Arc;

/// State shared by every request
#[derive(Debug, Clone)]
pub struct AppState {
    /// Transfer orchestrator over the seeded account store
    pub orchestrator: TransferOrchestrator,

    /// Backoff between prepare attempts
    pub backoff: ExponentialBackoff,

    /// Prepare attempts per request; a single attempt answers 423 on contention
    pub transfer_retry: RetryConfig,
}

impl AppState {
    pub fn new(store: Arc<AccountStore>, config: &ServerConfig) -> Self {
        Self {
            orchestrator: TransferOrchestrator::new(store)
                .with_lock_ordering(config.lock_ordering),
            backoff: ExponentialBackoff::default(),
            transfer_retry: config
                .transfer_retry()
                .unwrap_or_else(|| RetryConfig::contention_only(1)),
        }
    }
}
