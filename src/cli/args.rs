use crate::config::{ServerConfig, DEFAULT_HOST, DEFAULT_PORT};
use crate::core::LockOrdering;
use crate::io::SeedSource;
use clap::Parser;

/// Serve in-memory account balances with concurrent two-phase transfers
#[derive(Parser, Debug)]
#[command(name = "banking-engine")]
#[command(about = "Serve in-memory account balances with concurrent two-phase transfers", long_about = None)]
pub struct CliArgs {
    /// Host to bind the HTTP server to
    #[arg(long, value_name = "HOST", default_value = DEFAULT_HOST)]
    pub host: String,

    /// Port to bind the HTTP server to
    #[arg(
        long,
        env = "PORT",
        value_name = "PORT",
        help = "HTTP port (default: 8080, also read from $PORT)"
    )]
    pub port: Option<u16>,

    /// Seed accounts source
    #[arg(
        long = "seed",
        value_name = "SOURCE",
        help = "URL or JSON file with the initial accounts (default: public mock list)"
    )]
    pub seed: Option<SeedSource>,

    /// Tokio worker threads
    #[arg(
        long = "worker-threads",
        value_name = "COUNT",
        help = "Number of runtime worker threads (default: CPU cores)"
    )]
    pub worker_threads: Option<usize>,

    /// Attempts per transfer request before reporting contention
    #[arg(
        long = "max-transfer-attempts",
        value_name = "COUNT",
        help = "Attempts per transfer before answering 423 (default: 1, no retry)"
    )]
    pub max_transfer_attempts: Option<u32>,

    /// Acquire transfer latches in lexicographic key order
    #[arg(long = "canonical-lock-order")]
    pub canonical_lock_order: bool,
}

impl CliArgs {
    /// Create a ServerConfig from CLI arguments, falling back to defaults
    pub fn to_server_config(&self) -> ServerConfig {
        let default = ServerConfig::default();
        let lock_ordering = if self.canonical_lock_order {
            LockOrdering::Canonical
        } else {
            LockOrdering::AsGiven
        };

        ServerConfig::new(
            format!("{}:{}", self.host, self.port.unwrap_or(DEFAULT_PORT)),
            self.seed.clone().unwrap_or(default.seed),
            self.worker_threads.unwrap_or(default.worker_threads),
            self.max_transfer_attempts
                .unwrap_or(default.max_transfer_attempts),
            lock_ordering,
        )
    }
}
