use std::sync::{Arc, Mutex};

use thiserror::Error;

use super::violation_record::{StoredViolation, ViolationRecord};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("violation store error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("violation store lock poisoned")]
    Poisoned,
}

/// Append-only sink for violation records.
///
/// There is no update or delete operation: records are never
/// rewritten, merged or deduplicated.
pub trait ViolationStore: Send {
    /// Appends one record and returns its store-assigned id.
    fn append(&mut self, record: &ViolationRecord) -> Result<i64, StoreError>;

    /// Returns stored records newest first, at most `limit` of them.
    fn list_recent(&mut self, limit: Option<usize>) -> Result<Vec<StoredViolation>, StoreError>;
}

/// Store handle opened once at startup and shared by every writer and reader.
pub type SharedViolationStore = Arc<Mutex<Box<dyn ViolationStore>>>;

pub fn shared_store(store: impl ViolationStore + 'static) -> SharedViolationStore {
    Arc::new(Mutex::new(Box::new(store)))
}
