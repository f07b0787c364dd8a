//! Error responses and the mapping from engine errors to status codes

use crate::types::BankingError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Error body `{"message": ...}` with a status code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn internal() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Something went wrong.")
    }

    /// Map a failure to lock the transfer's accounts
    pub fn from_prepare(err: BankingError) -> Self {
        if err.is_contention() {
            return Self::new(
                StatusCode::LOCKED,
                "account is busy with another transfer, try again",
            );
        }

        match err {
            BankingError::RecordNotFound { .. } => Self::bad_request("account does not exist"),
            BankingError::SameAccount { .. } => Self::bad_request(err.to_string()),
            other => {
                tracing::error!(error = %other, "unexpected prepare failure");
                Self::internal()
            }
        }
    }

    /// Map a failure while applying a transfer to already-locked accounts
    pub fn from_execute(err: BankingError) -> Self {
        match err {
            BankingError::InvalidAmount { .. }
            | BankingError::InsufficientFunds { .. }
            | BankingError::SameAccount { .. }
            | BankingError::ArithmeticOverflow { .. } => Self::bad_request(err.to_string()),
            other => {
                tracing::error!(error = %other, "transfer failed on locked accounts");
                Self::internal()
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "message": self.message }))).into_response()
    }
}
