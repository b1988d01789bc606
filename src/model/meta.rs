//! Audit metadata embedded in every top-level document

use bson::DateTime;
use serde::{Deserialize, Serialize};

/// Audit fragment stored under the `meta` field.
///
/// `version` is an optimistic-concurrency hint maintained by writers; the
/// schema only types it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meta {
    pub created_at: DateTime,
    pub updated_at: DateTime,
    pub created_by: Option<String>,
    pub updated_by: Option<String>,
    pub source: Option<String>,
    pub version: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

impl Meta {
    /// Fresh metadata for a record created by `user` from `source` at `now`
    pub fn new(user: &str, source: &str, now: DateTime) -> Self {
        Self {
            created_at: now,
            updated_at: now,
            created_by: Some(user.to_string()),
            updated_by: Some(user.to_string()),
            source: Some(source.to_string()),
            version: Some(1),
            tags: None,
        }
    }

    /// Records an in-place modification by `user` at `now`
    pub fn touch(&mut self, user: &str, now: DateTime) {
        self.updated_at = now;
        self.updated_by = Some(user.to_string());
        self.version = Some(self.version.unwrap_or(0) + 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_meta_is_consistent() {
        let now = DateTime::now();
        let meta = Meta::new("seed", "triage-db", now);
        assert_eq!(meta.created_at, meta.updated_at);
        assert_eq!(meta.created_by, meta.updated_by);
        assert_eq!(meta.version, Some(1));
    }

    #[test]
    fn test_touch_bumps_version_and_keeps_creation() {
        let created = DateTime::from_millis(1_000);
        let mut meta = Meta::new("seed", "triage-db", created);

        meta.touch("nurse.beth", DateTime::from_millis(2_000));

        assert_eq!(meta.created_at, created);
        assert_eq!(meta.updated_at, DateTime::from_millis(2_000));
        assert_eq!(meta.updated_by.as_deref(), Some("nurse.beth"));
        assert_eq!(meta.version, Some(2));
    }

    #[test]
    fn test_serialized_field_names() {
        let doc = bson::to_document(&Meta::new("seed", "triage-db", DateTime::now())).unwrap();
        for key in ["createdAt", "updatedAt", "createdBy", "updatedBy", "source", "version"] {
            assert!(doc.contains_key(key), "missing {}", key);
        }
        assert!(!doc.contains_key("tags"));
    }
}
