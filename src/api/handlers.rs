//! Request handlers

use super::response::ApiError;
use super::state::AppState;
use crate::core::{retry_async, Access};
use crate::types::{key_for_id, TransferRequest};
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    Json,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Debug, Deserialize)]
pub struct AccountsQuery {
    pub safe: Option<String>,
}

/// Body of a transfer request; `amount` may be a JSON number or string
#[derive(Debug, Deserialize)]
pub struct TransferBody {
    pub amount: Decimal,
}

pub async fn health() -> Json<Value> {
    Json(json!({ "message": "pong" }))
}

/// Run a read that may wait on latches on the blocking pool
async fn read_blocking<T, F>(read: F) -> Result<T, ApiError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(read).await.map_err(|err| {
        tracing::error!(error = %err, "blocking read failed");
        ApiError::internal()
    })
}

/// List every account; `?safe=true` waits for each account's latch
pub async fn list_accounts(
    State(state): State<AppState>,
    Query(query): Query<AccountsQuery>,
) -> Result<Json<Value>, ApiError> {
    let access = Access::from_safe(query.safe.as_deref() == Some("true"));
    let orchestrator = state.orchestrator;
    let accounts = match access {
        Access::Synchronized => read_blocking(move || orchestrator.accounts(access)).await?,
        Access::Unsynchronized => orchestrator.accounts(access),
    };
    Ok(Json(json!({ "accounts": accounts })))
}

pub async fn get_account(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let orchestrator = state.orchestrator;
    let key = key_for_id(&id);
    let account = read_blocking(move || orchestrator.account(&key, Access::Synchronized))
        .await?
        .map_err(|_| ApiError::not_found("account does not exist"))?;
    Ok(Json(json!({ "account": account })))
}

/// Move `amount` from `{from}` to `{to}`
///
/// Locking is retried according to the configured transfer retry; the
/// transfer itself is applied once on the held latches.
pub async fn transfer(
    State(state): State<AppState>,
    Path((from, to)): Path<(String, String)>,
    body: Result<Json<TransferBody>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(body) = body.map_err(|rejection| {
        tracing::debug!(error = %rejection, "rejected transfer body");
        ApiError::bad_request("invalid request")
    })?;

    let request = TransferRequest::new(key_for_id(&from), key_for_id(&to), body.amount);
    let keys = request.keys();
    let orchestrator = &state.orchestrator;

    retry_async(&state.backoff, &state.transfer_retry, || {
        orchestrator.prepare(&keys)
    })
    .await
    .map_err(ApiError::from_prepare)?;

    let outcome = orchestrator.execute(&request);
    match &outcome {
        Ok(_) => orchestrator.commit(&keys),
        Err(err) => {
            tracing::debug!(
                sender = %request.sender,
                receiver = %request.receiver,
                amount = %request.amount,
                error = %err,
                "transfer rejected"
            );
            orchestrator.rollback(&keys);
        }
    }

    let sender = outcome.map_err(ApiError::from_execute)?;
    Ok(Json(json!({ "balance": sender.balance })))
}
