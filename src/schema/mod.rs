//! Document schema subsystem
//!
//! Schemas are declarative descriptions of the three persisted collections,
//! rendered to storage-level validators by the applier.
//!
//! # Design Principles
//!
//! - Required fields plus known-field typing; unknown fields always allowed
//! - Nullability expressed as a type union with `null`
//! - One metadata fragment embedded verbatim under `meta` in every entity
//! - Deterministic rendering (same schema, same validator document)

mod entities;
mod errors;
mod metadata;
mod types;
mod validator;

pub use entities::{
    patient_schema, system_metadata_schema, triage_entry_schema, Entity, PATIENTS,
    SYSTEM_METADATA, TRIAGE_ENTRIES,
};
pub use errors::{SchemaError, SchemaErrorCode, SchemaResult, Severity, ValidationDetails};
pub use metadata::{build_default_meta, metadata_schema, DEFAULT_SOURCE, META_FIELD};
pub use types::{BsonType, FieldSchema, ObjectSchema, Schema};
pub use validator::{SchemaValidator, ValidationLevel};
