use chrono::Utc;

use crate::shared::constants::MAX_FACES_PER_FRAME;

use super::violation_record::ViolationRecord;
use super::violation_store::{SharedViolationStore, StoreError};

/// Appends timestamped violation records to the shared store.
///
/// Writes are fire-and-forget: each call is one independent append and no
/// state carries over between calls.
#[derive(Clone)]
pub struct ViolationLogger {
    store: SharedViolationStore,
}

impl ViolationLogger {
    pub fn new(store: SharedViolationStore) -> Self {
        Self { store }
    }

    /// Records a "Multiple Faces Detected" violation when `face_count`
    /// exceeds one face per frame. Returns the record written, if any.
    pub fn log_face_count(&self, face_count: usize) -> Result<Option<ViolationRecord>, StoreError> {
        if face_count <= MAX_FACES_PER_FRAME {
            return Ok(None);
        }
        let record = ViolationRecord::multiple_faces(Utc::now());
        self.append(&record)?;
        log::info!("Violation recorded: {} ({face_count} faces)", record.kind);
        Ok(Some(record))
    }

    /// Records a violation of arbitrary type, as reported by a client.
    pub fn log(&self, kind: &str) -> Result<ViolationRecord, StoreError> {
        let record = ViolationRecord::new(kind, Utc::now());
        self.append(&record)?;
        log::info!("Violation recorded: {}", record.kind);
        Ok(record)
    }

    fn append(&self, record: &ViolationRecord) -> Result<i64, StoreError> {
        let mut store = self.store.lock().map_err(|_| StoreError::Poisoned)?;
        store.append(record)
    }
}
