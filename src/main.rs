//! Rust Banking Engine server
//!
//! Seeds the account store and serves the HTTP API.
//!
//! # Usage
//!
//! ```bash
//! cargo run
//! cargo run -- --port 9000 --seed accounts.json
//! cargo run -- --max-transfer-attempts 5 --canonical-lock-order
//! RUST_LOG=debug cargo run
//! ```
//!
//! # Exit Codes
//!
//! - 0: Clean shutdown after Ctrl-C
//! - 1: Error (bad listen address, seed not loadable, port in use, etc.)

use rust_banking_engine::api::{self, AppState};
use rust_banking_engine::cli;
use rust_banking_engine::config::ServerConfig;
use rust_banking_engine::core::AccountStore;
use rust_banking_engine::io::{load_accounts, seed_store};
use rust_banking_engine::types::BankingError;
use std::process;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,rust_banking_engine=debug")),
        )
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let config = cli::parse_args().to_server_config();

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.worker_threads)
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            tracing::error!(error = %e, "cannot start runtime");
            process::exit(1);
        }
    };

    if let Err(e) = runtime.block_on(run(config)) {
        tracing::error!(error = %e, "server failed");
        process::exit(1);
    }
}

async fn run(config: ServerConfig) -> Result<(), BankingError> {
    let addr = config.socket_addr()?;
    tracing::info!(
        %addr,
        seed = %config.seed,
        worker_threads = config.worker_threads,
        max_transfer_attempts = config.max_transfer_attempts,
        "starting"
    );

    let store = Arc::new(AccountStore::new());
    let accounts = load_accounts(&config.seed).await?;
    seed_store(&store, accounts);

    let state = AppState::new(store, &config);
    tracing::info!(
        lock_ordering = ?state.orchestrator.lock_ordering(),
        max_attempts = ?state.transfer_retry.max_attempts,
        "transfers ready"
    );

    let listener = TcpListener::bind(addr).await?;
    api::serve(listener, state).await
}
