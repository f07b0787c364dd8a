//! I/O module
//!
//! Loading of the initial account records. Everything here runs once at
//! startup, before the store is shared.

pub mod seed;

pub use seed::{load_accounts, parse_accounts, seed_store, SeedSource, DEFAULT_SEED_URL};
