//! Core traits for records held by the record store

/// Store key type
pub type Key = String;

/// A record that knows its own store key
///
/// Any type kept in a [`RecordStore`](super::RecordStore) implements this, so
/// seeding code can insert records without computing keys by hand.
pub trait IdentifiedRecord: Clone + Send + Sync {
    /// Key under which the record is stored
    fn record_key(&self) -> Key;
}
