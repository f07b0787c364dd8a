//! One-time seeding of the account store
//!
//! Loads a JSON array of accounts from a URL or a local file and inserts
//! them with `create_if_absent` before the store is shared with request
//! handlers.
//!
//! # Format
//!
//! ```json
//! [
//!   {"id": "3d253e29-8785-464f-8fa0-9e4b57699db9", "name": "Trupe", "balance": "87.11"}
//! ]
//! ```

use crate::core::{round_to_precision, AccountStore};
use crate::types::{Account, BankingError};
use std::convert::Infallible;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Public mock account list used when no seed source is given
pub const DEFAULT_SEED_URL: &str = "https://gist.githubusercontent.com/paytabs-engineering/c470210ebb19511a4e744aefc871974f/raw/6296df58428c89b8f852a6a83b0a5d0ac38289b6/accounts-mock.json";

/// Where seed accounts come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeedSource {
    /// HTTP(S) GET returning the JSON array
    Url(String),
    /// Local JSON file
    File(PathBuf),
}

impl Default for SeedSource {
    fn default() -> Self {
        SeedSource::Url(DEFAULT_SEED_URL.to_string())
    }
}

impl FromStr for SeedSource {
    type Err = Infallible;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if value.starts_with("http://") || value.starts_with("https://") {
            Ok(SeedSource::Url(value.to_string()))
        } else {
            Ok(SeedSource::File(PathBuf::from(value)))
        }
    }
}

impl fmt::Display for SeedSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeedSource::Url(url) => write!(f, "{}", url),
            SeedSource::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Decode a JSON array of accounts
pub fn parse_accounts(bytes: &[u8]) -> Result<Vec<Account>, BankingError> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Fetch and decode the seed accounts
///
/// # Errors
///
/// - `SeedError` if the request fails, the status is not 200, or the body
///   is not a valid account list
/// - `IoError` if the seed file cannot be read
pub async fn load_accounts(source: &SeedSource) -> Result<Vec<Account>, BankingError> {
    tracing::info!(source = %source, "loading accounts");

    let body = match source {
        SeedSource::Url(url) => fetch(url).await?,
        SeedSource::File(path) => tokio::fs::read(path).await.map_err(|e| {
            BankingError::IoError {
                message: format!("cannot read '{}': {}", path.display(), e),
            }
        })?,
    };

    parse_accounts(&body)
}

async fn fetch(url: &str) -> Result<Vec<u8>, BankingError> {
    let response = reqwest::get(url).await?;
    let status = response.status();
    if status != reqwest::StatusCode::OK {
        return Err(BankingError::SeedError {
            message: format!("unexpected http GET status {}", status),
        });
    }
    Ok(response.bytes().await?.to_vec())
}

/// Insert every account that is not already present
///
/// Balances are rounded to the balance precision first. Duplicates are
/// logged and skipped. Returns the number inserted.
pub fn seed_store(store: &AccountStore, accounts: Vec<Account>) -> usize {
    let mut inserted = 0;
    for mut account in accounts {
        let rounded = round_to_precision(account.balance);
        if rounded != account.balance {
            tracing::warn!(
                account = %account.id,
                balance = %account.balance,
                rounded = %rounded,
                "rounding seed balance"
            );
            account.balance = rounded;
        }

        match store.create(account) {
            Ok(()) => inserted += 1,
            Err(err) => tracing::warn!(error = %err, "skipping seed account"),
        }
    }

    tracing::info!(accounts = store.len(), inserted, "loaded accounts in memory");
    inserted
}
