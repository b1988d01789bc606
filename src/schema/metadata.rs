//! Audit metadata fragment shared by every top-level entity

use bson::DateTime;

use super::types::{FieldSchema, ObjectSchema};
use crate::model::Meta;

/// Field under which every top-level document embeds its metadata
pub const META_FIELD: &str = "meta";

/// Origin tag written by this tool
pub const DEFAULT_SOURCE: &str = "triage-db";

/// Shape of the `meta` sub-document.
///
/// Only the timestamps are required; the remaining fields are nullable.
pub fn metadata_schema() -> ObjectSchema {
    ObjectSchema::new()
        .required_field("createdAt", FieldSchema::date().describe("Creation timestamp"))
        .required_field("updatedAt", FieldSchema::date().describe("Last update timestamp"))
        .field(
            "createdBy",
            FieldSchema::nullable_string().describe("User ID/email of creator"),
        )
        .field(
            "updatedBy",
            FieldSchema::nullable_string().describe("User ID/email of last updater"),
        )
        .field(
            "source",
            FieldSchema::nullable_string().describe("Origin of record (system/app)"),
        )
        .field(
            "version",
            FieldSchema::nullable_integer()
                .describe("Application-level version for optimistic concurrency"),
        )
        .field(
            "tags",
            FieldSchema::nullable_array(FieldSchema::string()).describe("Arbitrary tags"),
        )
}

/// Default metadata for a record written now by `user`.
pub fn build_default_meta(user: &str) -> Meta {
    Meta::new(user, DEFAULT_SOURCE, DateTime::now())
}
