//! Server configuration
//!
//! Centralized configuration with sensible defaults. Built from CLI
//! arguments by [`CliArgs::to_server_config`](crate::cli::CliArgs::to_server_config).

use crate::core::{LockOrdering, RetryConfig};
use crate::io::SeedSource;
use crate::types::BankingError;
use std::net::SocketAddr;

/// Default HTTP port when neither `--port` nor `PORT` is set
pub const DEFAULT_PORT: u16 = 8080;

/// Default bind host
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Runtime configuration for the HTTP server
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    /// `host:port` to bind
    pub listen_addr: String,

    /// Where the initial accounts come from
    pub seed: SeedSource,

    /// Tokio worker threads
    pub worker_threads: usize,

    /// Attempts per transfer request before answering 423 (1 = no retry)
    pub max_transfer_attempts: u32,

    /// Latch acquisition order for transfers
    pub lock_ordering: LockOrdering,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: format!("{}:{}", DEFAULT_HOST, DEFAULT_PORT),
            seed: SeedSource::default(),
            worker_threads: num_cpus::get(),
            max_transfer_attempts: 1,
            lock_ordering: LockOrdering::AsGiven,
        }
    }
}

impl ServerConfig {
    /// Create a ServerConfig, replacing zero counts with defaults
    pub fn new(
        listen_addr: String,
        seed: SeedSource,
        worker_threads: usize,
        max_transfer_attempts: u32,
        lock_ordering: LockOrdering,
    ) -> Self {
        let default = Self::default();

        let worker_threads = if worker_threads == 0 {
            tracing::warn!(
                "Invalid worker_threads ({}), using default ({})",
                worker_threads,
                default.worker_threads
            );
            default.worker_threads
        } else {
            worker_threads
        };

        let max_transfer_attempts = if max_transfer_attempts == 0 {
            tracing::warn!(
                "Invalid max_transfer_attempts ({}), using default ({})",
                max_transfer_attempts,
                default.max_transfer_attempts
            );
            default.max_transfer_attempts
        } else {
            max_transfer_attempts
        };

        Self {
            listen_addr,
            seed,
            worker_threads,
            max_transfer_attempts,
            lock_ordering,
        }
    }

    /// Parse the listen address
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the address is not a valid `host:port`.
    pub fn socket_addr(&self) -> Result<SocketAddr, BankingError> {
        self.listen_addr.parse().map_err(|e| {
            BankingError::config(format!("invalid listen address '{}': {}", self.listen_addr, e))
        })
    }

    /// Retry settings for transfer requests, if retrying is enabled
    pub fn transfer_retry(&self) -> Option<RetryConfig> {
        (self.max_transfer_attempts > 1)
            .then(|| RetryConfig::contention_only(self.max_transfer_attempts))
    }
}
