//! System-level key/value entries (settings, audit records, seed statistics)

use bson::oid::ObjectId;
use bson::Bson;
use serde::{Deserialize, Serialize};

use super::meta::Meta;

/// Key under which seed statistics are recorded
pub const SEED_INFO_KEY: &str = "seed-info";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemMetadataEntry {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    /// Globally unique key
    pub key: String,
    /// Absent values decode as `Bson::Null`
    #[serde(default)]
    pub value: Bson,
    pub category: Option<String>,
    pub description: Option<String>,
    pub meta: Meta,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{system_metadata_schema, SchemaValidator};
    use bson::{doc, DateTime};

    #[test]
    fn test_decodes_entry_without_value() {
        let now = DateTime::now();
        let doc = doc! { "key": "maintenance", "meta": { "createdAt": now, "updatedAt": now } };
        assert!(SchemaValidator::new(&system_metadata_schema()).is_valid(&doc));

        let entry: SystemMetadataEntry = bson::from_document(doc).unwrap();
        assert_eq!(entry.key, "maintenance");
        assert_eq!(entry.value, Bson::Null);
        assert!(entry.category.is_none());
    }

    #[test]
    fn test_decodes_structured_value() {
        let now = DateTime::now();
        let doc = doc! {
            "key": SEED_INFO_KEY,
            "value": { "patients": 3_i64, "triages": 9_i64 },
            "category": "seed",
            "meta": { "createdAt": now, "updatedAt": now, "version": 2_i64 },
        };
        let entry: SystemMetadataEntry = bson::from_document(doc).unwrap();
        let value = entry.value.as_document().unwrap();
        assert_eq!(value.get_i64("triages").unwrap(), 9);
        assert_eq!(entry.meta.version, Some(2));
    }
}
