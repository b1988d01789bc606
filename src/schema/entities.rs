//! Entity schemas for the three persisted collections

use super::metadata::{metadata_schema, META_FIELD};
use super::types::{FieldSchema, ObjectSchema, Schema};
use crate::index::{catalog, IndexSpec};
use crate::model::{Priority, Sex, Status};

pub const PATIENTS: &str = "patients";
pub const TRIAGE_ENTRIES: &str = "triage_entries";
pub const SYSTEM_METADATA: &str = "system_metadata";

/// Top-level persisted record types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Entity {
    Patient,
    TriageEntry,
    SystemMetadata,
}

impl Entity {
    /// Every entity, in reconciliation order
    pub const ALL: [Entity; 3] = [Entity::Patient, Entity::TriageEntry, Entity::SystemMetadata];

    /// Backing collection name
    pub fn collection(&self) -> &'static str {
        match self {
            Entity::Patient => PATIENTS,
            Entity::TriageEntry => TRIAGE_ENTRIES,
            Entity::SystemMetadata => SYSTEM_METADATA,
        }
    }

    /// Human-readable name for progress output
    pub fn label(&self) -> &'static str {
        match self {
            Entity::Patient => "Patient",
            Entity::TriageEntry => "Triage",
            Entity::SystemMetadata => "System metadata",
        }
    }

    /// Validation schema
    pub fn schema(&self) -> Schema {
        match self {
            Entity::Patient => patient_schema(),
            Entity::TriageEntry => triage_entry_schema(),
            Entity::SystemMetadata => system_metadata_schema(),
        }
    }

    /// Indexes the collection must carry
    pub fn indexes(&self) -> Vec<IndexSpec> {
        match self {
            Entity::Patient => catalog::patient_indexes(),
            Entity::TriageEntry => catalog::triage_entry_indexes(),
            Entity::SystemMetadata => catalog::system_metadata_indexes(),
        }
    }

    /// Looks up the entity stored in `collection`
    pub fn from_collection(collection: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|e| e.collection() == collection)
    }
}

fn meta_field() -> FieldSchema {
    FieldSchema::object(metadata_schema())
}

fn string_list() -> FieldSchema {
    FieldSchema::nullable_array(FieldSchema::string())
}

/// Patient demographics and history used in triage workflows.
pub fn patient_schema() -> Schema {
    let address = ObjectSchema::new()
        .field("line1", FieldSchema::nullable_string())
        .field("line2", FieldSchema::nullable_string())
        .field("city", FieldSchema::nullable_string())
        .field("state", FieldSchema::nullable_string())
        .field("postalCode", FieldSchema::nullable_string())
        .field("country", FieldSchema::nullable_string());

    let contact = ObjectSchema::new()
        .required_field("phone", FieldSchema::string())
        .field("email", FieldSchema::nullable_string())
        .field("address", FieldSchema::nullable_object(address));

    let identifier = ObjectSchema::new()
        .required_field(
            "system",
            FieldSchema::string().describe("Identifier namespace (e.g., MRN)"),
        )
        .required_field("value", FieldSchema::string().describe("Identifier value"))
        .field("assigner", FieldSchema::nullable_string());

    let medical_history = ObjectSchema::new()
        .field("allergies", string_list())
        .field("conditions", string_list())
        .field("medications", string_list())
        .field("notes", FieldSchema::nullable_string());

    let emergency_contact = ObjectSchema::new()
        .field("name", FieldSchema::nullable_string())
        .field("relationship", FieldSchema::nullable_string())
        .field("phone", FieldSchema::nullable_string());

    let root = ObjectSchema::new()
        .field("_id", FieldSchema::any())
        .required_field("firstName", FieldSchema::string().describe("Given name"))
        .required_field("lastName", FieldSchema::string().describe("Family name"))
        .field(
            "dateOfBirth",
            FieldSchema::nullable_date().describe("Date of birth (prefer date, not age)"),
        )
        .field(
            "age",
            FieldSchema::nullable_integer().describe("Age in years (derived if DOB available)"),
        )
        .required_field(
            "sex",
            FieldSchema::string_enum(Sex::ALL.iter().map(Sex::as_str))
                .describe("Sex: M=Male, F=Female, O=Other, U=Unknown"),
        )
        .required_field("contact", FieldSchema::object(contact))
        .field(
            "identifiers",
            FieldSchema::nullable_array(FieldSchema::object(identifier)),
        )
        .field("medicalHistory", FieldSchema::nullable_object(medical_history))
        .field(
            "emergencyContact",
            FieldSchema::nullable_object(emergency_contact),
        )
        .required_field(META_FIELD, meta_field());

    Schema::new(PATIENTS, root)
        .with_description("Patient demographics and history used in triage workflows")
}

/// Triage interactions: time, priority, clinicians, status and notes.
pub fn triage_entry_schema() -> Schema {
    let vitals = ObjectSchema::new()
        .field("heartRate", FieldSchema::nullable_number())
        .field("bloodPressure", FieldSchema::nullable_string())
        .field("respiratoryRate", FieldSchema::nullable_number())
        .field("temperatureC", FieldSchema::nullable_number())
        .field("oxygenSaturation", FieldSchema::nullable_number());

    let attachment = ObjectSchema::new()
        .field("type", FieldSchema::nullable_string())
        .field("url", FieldSchema::nullable_string())
        .field("description", FieldSchema::nullable_string());

    let root = ObjectSchema::new()
        .field("_id", FieldSchema::any())
        .required_field(
            "patientId",
            FieldSchema::object_id().describe("Reference to patients._id"),
        )
        .required_field("triageTime", FieldSchema::date().describe("When triage occurred"))
        .required_field(
            "priority",
            FieldSchema::string_enum(Priority::ALL.iter().map(Priority::as_str))
                .describe("Triage priority/category"),
        )
        .required_field(
            "status",
            FieldSchema::string_enum(Status::ALL.iter().map(Status::as_str))
                .describe("Workflow status"),
        )
        .field("nurse", FieldSchema::nullable_string().describe("Nurse user ID/name"))
        .field("doctor", FieldSchema::nullable_string().describe("Doctor user ID/name"))
        .field("vitals", FieldSchema::nullable_object(vitals))
        .field("notes", FieldSchema::nullable_string().describe("Free-form notes"))
        .field(
            "attachments",
            FieldSchema::nullable_array(FieldSchema::object(attachment)),
        )
        .required_field(META_FIELD, meta_field());

    Schema::new(TRIAGE_ENTRIES, root).with_description(
        "Triage interactions including date, priority, clinician, status, and notes",
    )
}

/// Audit logs, system settings and general metadata entries.
pub fn system_metadata_schema() -> Schema {
    let root = ObjectSchema::new()
        .field("_id", FieldSchema::any())
        .required_field(
            "key",
            FieldSchema::string().describe("Unique key for metadata item"),
        )
        .field("value", FieldSchema::any())
        .field("category", FieldSchema::nullable_string().describe("Grouping category"))
        .field("description", FieldSchema::nullable_string())
        .required_field(META_FIELD, meta_field());

    Schema::new(SYSTEM_METADATA, root)
        .with_description("System settings, audit logs and general metadata entries")
}
