use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::shared::constants::MULTIPLE_FACES_VIOLATION;

/// One proctoring violation. Immutable once written.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ViolationRecord {
    #[serde(rename = "type")]
    pub kind: String,
    pub timestamp: DateTime<Utc>,
}

impl ViolationRecord {
    pub fn new(kind: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            kind: kind.into(),
            timestamp,
        }
    }

    pub fn multiple_faces(timestamp: DateTime<Utc>) -> Self {
        Self::new(MULTIPLE_FACES_VIOLATION, timestamp)
    }
}

/// A record as read back from the store, with its store-assigned id.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StoredViolation {
    pub id: i64,
    #[serde(flatten)]
    pub record: ViolationRecord,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_multiple_faces_type() {
        let ts = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let record = ViolationRecord::multiple_faces(ts);
        assert_eq!(record.kind, "Multiple Faces Detected");
        assert_eq!(record.timestamp, ts);
    }

    #[test]
    fn test_serializes_kind_as_type() {
        let ts = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let stored = StoredViolation {
            id: 4,
            record: ViolationRecord::new("Tab Switch Detected", ts),
        };
        let json = serde_json::to_value(&stored).unwrap();
        assert_eq!(json["id"], 4);
        assert_eq!(json["type"], "Tab Switch Detected");
        assert_eq!(json["timestamp"], "2024-05-01T12:00:00Z");
    }
}
