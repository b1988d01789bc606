//! Schema validator for BSON documents
//!
//! Validation semantics:
//! - All required fields are present (at every object level)
//! - Declared fields that are present match one of their accepted types
//! - Enumerated fields hold one of the allowed values
//! - Undeclared fields are accepted unless the object is closed
//!
//! Nullability is part of the type union: a declared field holding `null` is
//! valid only when `null` is among its accepted types.

use bson::{Bson, Document};

use super::errors::{SchemaError, SchemaResult, ValidationDetails};
use super::types::{BsonType, FieldSchema, ObjectSchema, Schema};

/// When the storage engine applies a collection validator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationLevel {
    /// No validation
    Off,
    /// Inserts, and updates to documents that were already valid
    Moderate,
    /// All inserts and updates
    Strict,
}

impl ValidationLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationLevel::Off => "off",
            ValidationLevel::Moderate => "moderate",
            ValidationLevel::Strict => "strict",
        }
    }
}

/// Validator that enforces one schema on documents.
///
/// Validator does not mutate documents.
/// Validation is deterministic and stops at the first violation.
pub struct SchemaValidator<'a> {
    schema: &'a Schema,
}

impl<'a> SchemaValidator<'a> {
    /// Creates a validator for the given schema.
    pub fn new(schema: &'a Schema) -> Self {
        Self { schema }
    }

    /// Validates a document against the schema.
    ///
    /// # Errors
    ///
    /// Returns `TRIAGE_SCHEMA_VALIDATION_FAILED` with the offending field path.
    pub fn validate_document(&self, document: &Document) -> SchemaResult<()> {
        self.validate_object(document, &self.schema.root, "")
    }

    /// Returns whether the document passes validation.
    pub fn is_valid(&self, document: &Document) -> bool {
        self.validate_document(document).is_ok()
    }

    fn validate_object(
        &self,
        obj: &Document,
        shape: &ObjectSchema,
        path_prefix: &str,
    ) -> SchemaResult<()> {
        for name in &shape.required {
            if !obj.contains_key(name) {
                return Err(self.failure(ValidationDetails::missing_field(make_path(
                    path_prefix,
                    name,
                ))));
            }
        }

        for (key, value) in obj {
            let field_path = make_path(path_prefix, key);
            match shape.properties.get(key) {
                Some(field) => self.validate_value(value, field, &field_path)?,
                None if !shape.additional_properties => {
                    return Err(self.failure(ValidationDetails::extra_field(field_path)));
                }
                None => {}
            }
        }

        Ok(())
    }

    fn validate_value(&self, value: &Bson, field: &FieldSchema, field_path: &str) -> SchemaResult<()> {
        if field.is_any() {
            return Ok(());
        }

        let accepted = BsonType::of(value).is_some_and(|ty| field.accepts_type(ty));
        if !accepted {
            return Err(self.failure(ValidationDetails::type_mismatch(
                field_path,
                expected_types(field),
                bson_type_name(value),
            )));
        }

        if let (Some(allowed), Bson::String(s)) = (&field.enumeration, value) {
            if !allowed.iter().any(|a| a == s) {
                return Err(self.failure(ValidationDetails::not_in_enumeration(
                    field_path, allowed, s,
                )));
            }
        }

        match value {
            Bson::Document(inner) => {
                if let Some(shape) = &field.object {
                    self.validate_object(inner, shape, field_path)?;
                }
            }
            Bson::Array(elements) => {
                if let Some(items) = &field.items {
                    for (i, elem) in elements.iter().enumerate() {
                        let elem_path = format!("{}[{}]", field_path, i);
                        self.validate_value(elem, items, &elem_path)?;
                    }
                }
            }
            _ => {}
        }

        Ok(())
    }

    fn failure(&self, details: ValidationDetails) -> SchemaError {
        SchemaError::validation_failed(&self.schema.collection, details)
    }
}

fn expected_types(field: &FieldSchema) -> String {
    field
        .types
        .iter()
        .map(|t| t.alias())
        .collect::<Vec<_>>()
        .join("|")
}

/// Returns the BSON type name for error messages.
fn bson_type_name(value: &Bson) -> &'static str {
    match BsonType::of(value) {
        Some(ty) => ty.alias(),
        None => match value {
            Bson::Decimal128(_) => "decimal",
            Bson::Binary(_) => "binData",
            Bson::Timestamp(_) => "timestamp",
            Bson::RegularExpression(_) => "regex",
            _ => "unsupported",
        },
    }
}

/// Creates a field path from prefix and field name.
fn make_path(prefix: &str, field: &str) -> String {
    if prefix.is_empty() {
        field.to_string()
    } else {
        format!("{}.{}", prefix, field)
    }
}
