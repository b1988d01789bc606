//! Typed documents for the three persisted collections
//!
//! Field names serialize to the camelCase names of the durable storage
//! contract; renaming any of them is a breaking change.

mod enums;
mod meta;
mod patient;
mod system_metadata;
mod triage;

pub use enums::{Priority, Sex, Status};
pub use meta::Meta;
pub use patient::{Address, Contact, EmergencyContact, Identifier, MedicalHistory, Patient};
pub use system_metadata::{SystemMetadataEntry, SEED_INFO_KEY};
pub use triage::{Attachment, TriageEntry, Vitals};

use bson::oid::ObjectId;

/// Parses a hex string identity, returning `None` when it is not a valid ObjectId.
pub fn parse_object_id(text: &str) -> Option<ObjectId> {
    ObjectId::parse_str(text).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_object_id() {
        let id = ObjectId::new();
        assert_eq!(parse_object_id(&id.to_hex()), Some(id));
        assert_eq!(parse_object_id("not-an-id"), None);
        assert_eq!(parse_object_id(""), None);
    }
}
