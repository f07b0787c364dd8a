//! HTTP boundary
//!
//! A thin axum layer over the transfer orchestrator:
//! - `GET /health`
//! - `GET /accounts?safe=true|false`
//! - `GET /accounts/{id}`
//! - `POST /accounts/{from}/transfer/{to}`

pub mod handlers;
pub mod response;
pub mod state;

pub use response::ApiError;
pub use state::AppState;

use crate::types::BankingError;
use axum::{
    routing::{get, post},
    Router,
};
use std::future::Future;
use tokio::net::TcpListener;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/accounts", get(handlers::list_accounts))
        .route("/accounts/{id}", get(handlers::get_account))
        .route("/accounts/{from}/transfer/{to}", post(handlers::transfer))
        .with_state(state)
}

/// Serve until Ctrl-C
pub async fn serve(listener: TcpListener, state: AppState) -> Result<(), BankingError> {
    serve_with_shutdown(listener, state, ctrl_c()).await
}

/// Serve until `shutdown` resolves, then drain in-flight requests
pub async fn serve_with_shutdown<F>(
    listener: TcpListener,
    state: AppState,
    shutdown: F,
) -> Result<(), BankingError>
where
    F: Future<Output = ()> + Send + 'static,
{
    tracing::info!(addr = %listener.local_addr()?, "listening");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await?;
    tracing::info!("server stopped");
    Ok(())
}

async fn ctrl_c() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("shutdown requested"),
        Err(err) => {
            tracing::error!(error = %err, "cannot listen for ctrl-c, serving until killed");
            std::future::pending::<()>().await;
        }
    }
}
