//! Schema type definitions
//!
//! A schema is a declarative description of a collection's documents:
//! - required field names per object level
//! - accepted BSON types per field (nullability is a union containing `null`,
//!   never field absence)
//! - closed string enumerations
//! - nested object and array element shapes
//!
//! Schemas render to MongoDB `$jsonSchema` validator documents and are also
//! interpreted directly by [`SchemaValidator`](super::SchemaValidator).

use std::collections::BTreeMap;

use bson::{doc, Bson, Document};

/// BSON types a field may hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BsonType {
    /// 64-bit floating point
    Double,
    /// UTF-8 string
    String,
    /// Embedded document
    Object,
    /// Array
    Array,
    /// 12-byte ObjectId
    ObjectId,
    /// Boolean
    Bool,
    /// UTC datetime
    Date,
    /// Explicit "no value"
    Null,
    /// 32-bit signed integer
    Int,
    /// 64-bit signed integer
    Long,
}

impl BsonType {
    /// Returns the `bsonType` alias used by `$jsonSchema`
    pub fn alias(&self) -> &'static str {
        match self {
            BsonType::Double => "double",
            BsonType::String => "string",
            BsonType::Object => "object",
            BsonType::Array => "array",
            BsonType::ObjectId => "objectId",
            BsonType::Bool => "bool",
            BsonType::Date => "date",
            BsonType::Null => "null",
            BsonType::Int => "int",
            BsonType::Long => "long",
        }
    }

    /// Returns the modelled type of a concrete value, if any
    pub fn of(value: &Bson) -> Option<BsonType> {
        match value {
            Bson::Double(_) => Some(BsonType::Double),
            Bson::String(_) => Some(BsonType::String),
            Bson::Document(_) => Some(BsonType::Object),
            Bson::Array(_) => Some(BsonType::Array),
            Bson::ObjectId(_) => Some(BsonType::ObjectId),
            Bson::Boolean(_) => Some(BsonType::Bool),
            Bson::DateTime(_) => Some(BsonType::Date),
            Bson::Null => Some(BsonType::Null),
            Bson::Int32(_) => Some(BsonType::Int),
            Bson::Int64(_) => Some(BsonType::Long),
            _ => None,
        }
    }
}

/// Schema of a single field.
///
/// An empty `types` list accepts any value (rendered as `{}`).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FieldSchema {
    /// Accepted types (union)
    pub types: Vec<BsonType>,
    /// Closed set of accepted string values
    pub enumeration: Option<Vec<String>>,
    /// Shape of the value when it is an embedded document
    pub object: Option<ObjectSchema>,
    /// Shape of each element when the value is an array
    pub items: Option<Box<FieldSchema>>,
    /// Human-readable description
    pub description: Option<String>,
}

impl FieldSchema {
    fn of_types(types: &[BsonType]) -> Self {
        Self {
            types: types.to_vec(),
            ..Default::default()
        }
    }

    /// Accepts any value
    pub fn any() -> Self {
        Self::default()
    }

    /// Non-null string
    pub fn string() -> Self {
        Self::of_types(&[BsonType::String])
    }

    /// String or null
    pub fn nullable_string() -> Self {
        Self::of_types(&[BsonType::String, BsonType::Null])
    }

    /// Non-null datetime
    pub fn date() -> Self {
        Self::of_types(&[BsonType::Date])
    }

    /// Datetime or null
    pub fn nullable_date() -> Self {
        Self::of_types(&[BsonType::Date, BsonType::Null])
    }

    /// 32/64-bit integer or null
    pub fn nullable_integer() -> Self {
        Self::of_types(&[BsonType::Int, BsonType::Long, BsonType::Null])
    }

    /// Any numeric type or null
    pub fn nullable_number() -> Self {
        Self::of_types(&[BsonType::Double, BsonType::Int, BsonType::Long, BsonType::Null])
    }

    /// Non-null ObjectId
    pub fn object_id() -> Self {
        Self::of_types(&[BsonType::ObjectId])
    }

    /// Non-null string restricted to `values`
    pub fn string_enum<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            enumeration: Some(values.into_iter().map(Into::into).collect()),
            ..Self::string()
        }
    }

    /// Non-null embedded document
    pub fn object(shape: ObjectSchema) -> Self {
        Self {
            object: Some(shape),
            ..Self::of_types(&[BsonType::Object])
        }
    }

    /// Embedded document or null
    pub fn nullable_object(shape: ObjectSchema) -> Self {
        Self {
            object: Some(shape),
            ..Self::of_types(&[BsonType::Object, BsonType::Null])
        }
    }

    /// Array of `items`, or null
    pub fn nullable_array(items: FieldSchema) -> Self {
        Self {
            items: Some(Box::new(items)),
            ..Self::of_types(&[BsonType::Array, BsonType::Null])
        }
    }

    /// Attach a description
    pub fn describe(mut self, text: impl Into<String>) -> Self {
        self.description = Some(text.into());
        self
    }

    /// Whether this field accepts every value
    pub fn is_any(&self) -> bool {
        self.types.is_empty()
    }

    /// Whether `ty` is one of the accepted types
    pub fn accepts_type(&self, ty: BsonType) -> bool {
        self.is_any() || self.types.contains(&ty)
    }

    /// Renders this field as a `$jsonSchema` fragment
    pub fn to_document(&self) -> Document {
        let mut out = Document::new();

        match self.types.as_slice() {
            [] => {}
            [single] => {
                out.insert("bsonType", single.alias());
            }
            many => {
                let aliases: Vec<Bson> = many.iter().map(|t| Bson::from(t.alias())).collect();
                out.insert("bsonType", aliases);
            }
        }

        if let Some(values) = &self.enumeration {
            out.insert("enum", values.clone());
        }

        if let Some(shape) = &self.object {
            shape.write_into(&mut out);
        }

        if let Some(items) = &self.items {
            out.insert("items", items.to_document());
        }

        if let Some(text) = &self.description {
            out.insert("description", text.as_str());
        }

        out
    }

    fn validate_structure(&self, path: &str) -> Result<(), String> {
        if self.enumeration.is_some() && !self.accepts_type(BsonType::String) {
            return Err(format!("'{}': enumeration requires a string type", path));
        }
        if let Some(values) = &self.enumeration {
            if values.is_empty() {
                return Err(format!("'{}': enumeration must not be empty", path));
            }
        }
        if let Some(shape) = &self.object {
            if !self.accepts_type(BsonType::Object) {
                return Err(format!("'{}': nested shape requires the object type", path));
            }
            shape.validate_structure(path)?;
        }
        if let Some(items) = &self.items {
            if !self.accepts_type(BsonType::Array) {
                return Err(format!("'{}': item shape requires the array type", path));
            }
            items.validate_structure(&format!("{}[]", path))?;
        }
        Ok(())
    }
}

/// Shape of an embedded document (or the document root)
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectSchema {
    /// Fields that must be present
    pub required: Vec<String>,
    /// Declared fields, ordered by name so rendering is deterministic
    pub properties: BTreeMap<String, FieldSchema>,
    /// Whether undeclared fields are accepted
    pub additional_properties: bool,
}

impl Default for ObjectSchema {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectSchema {
    /// Creates an empty, open shape
    pub fn new() -> Self {
        Self {
            required: Vec::new(),
            properties: BTreeMap::new(),
            additional_properties: true,
        }
    }

    /// Declares an optional field
    pub fn field(mut self, name: impl Into<String>, schema: FieldSchema) -> Self {
        self.properties.insert(name.into(), schema);
        self
    }

    /// Declares a field that must be present
    pub fn required_field(mut self, name: impl Into<String>, schema: FieldSchema) -> Self {
        let name = name.into();
        if !self.required.contains(&name) {
            self.required.push(name.clone());
        }
        self.properties.insert(name, schema);
        self
    }

    /// Rejects undeclared fields
    pub fn closed(mut self) -> Self {
        self.additional_properties = false;
        self
    }

    /// Whether `name` must be present
    pub fn is_required(&self, name: &str) -> bool {
        self.required.iter().any(|r| r == name)
    }

    /// Renders this shape as a `$jsonSchema` object node
    pub fn to_document(&self) -> Document {
        let mut out = doc! { "bsonType": BsonType::Object.alias() };
        self.write_into(&mut out);
        out
    }

    fn write_into(&self, out: &mut Document) {
        if !self.required.is_empty() {
            out.insert("required", self.required.clone());
        }
        out.insert("additionalProperties", self.additional_properties);

        let mut properties = Document::new();
        for (name, schema) in &self.properties {
            properties.insert(name.clone(), schema.to_document());
        }
        out.insert("properties", properties);
    }

    fn validate_structure(&self, path: &str) -> Result<(), String> {
        for name in &self.required {
            if !self.properties.contains_key(name) {
                return Err(format!(
                    "'{}': required field '{}' is not declared",
                    display_path(path),
                    name
                ));
            }
        }
        for (name, schema) in &self.properties {
            schema.validate_structure(&join_path(path, name))?;
        }
        Ok(())
    }
}

/// Complete collection schema
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    /// Collection the schema governs
    pub collection: String,
    /// Optional description
    pub description: Option<String>,
    /// Root document shape
    pub root: ObjectSchema,
}

impl Schema {
    /// Create a new schema
    pub fn new(collection: impl Into<String>, root: ObjectSchema) -> Self {
        Self {
            collection: collection.into(),
            description: None,
            root,
        }
    }

    /// Attach a description
    pub fn with_description(mut self, text: impl Into<String>) -> Self {
        self.description = Some(text.into());
        self
    }

    /// Renders the `{ $jsonSchema: ... }` validator document
    pub fn to_validator(&self) -> Document {
        doc! { "$jsonSchema": self.root.to_document() }
    }

    /// Validates the schema structure itself (not a document)
    pub fn validate_structure(&self) -> Result<(), String> {
        if !self.root.properties.contains_key("_id") {
            return Err("Schema must declare an '_id' field".into());
        }
        self.root.validate_structure("")
    }
}

fn join_path(prefix: &str, field: &str) -> String {
    if prefix.is_empty() {
        field.to_string()
    } else {
        format!("{}.{}", prefix, field)
    }
}

fn display_path(path: &str) -> &str {
    if path.is_empty() {
        "$root"
    } else {
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_schema() -> Schema {
        let root = ObjectSchema::new()
            .field("_id", FieldSchema::any())
            .required_field("name", FieldSchema::string())
            .field("age", FieldSchema::nullable_integer());

        Schema::new("users", root)
    }

    #[test]
    fn test_schema_structure_valid() {
        assert!(sample_schema().validate_structure().is_ok());
    }

    #[test]
    fn test_schema_missing_id_field() {
        let root = ObjectSchema::new().required_field("name", FieldSchema::string());
        let schema = Schema::new("users", root);
        assert!(schema.validate_structure().is_err());
    }

    #[test]
    fn test_required_field_must_be_declared() {
        let mut root = ObjectSchema::new().field("_id", FieldSchema::any());
        root.required.push("ghost".into());

        let err = Schema::new("users", root).validate_structure().unwrap_err();
        assert!(err.contains("ghost"));
    }

    #[test]
    fn test_enumeration_requires_string_type() {
        let mut bad = FieldSchema::string_enum(["A", "B"]);
        bad.types = vec![BsonType::Int];
        let root = ObjectSchema::new()
            .field("_id", FieldSchema::any())
            .field("kind", bad);

        let err = Schema::new("things", root).validate_structure().unwrap_err();
        assert!(err.contains("kind"));
    }

    #[test]
    fn test_nested_structure_errors_carry_path() {
        let mut inner = ObjectSchema::new();
        inner.required.push("zip".into());
        let root = ObjectSchema::new()
            .field("_id", FieldSchema::any())
            .field("address", FieldSchema::nullable_object(inner));

        let err = Schema::new("users", root).validate_structure().unwrap_err();
        assert!(err.contains("address"));
        assert!(err.contains("zip"));
    }

    #[test]
    fn test_single_type_renders_as_string() {
        let rendered = FieldSchema::string().to_document();
        assert_eq!(rendered.get_str("bsonType").unwrap(), "string");
    }

    #[test]
    fn test_union_type_renders_as_array() {
        let rendered = FieldSchema::nullable_integer().to_document();
        let aliases = rendered.get_array("bsonType").unwrap();
        assert_eq!(
            aliases,
            &vec![Bson::from("int"), Bson::from("long"), Bson::from("null")]
        );
    }

    #[test]
    fn test_any_renders_empty() {
        assert!(FieldSchema::any().to_document().is_empty());
    }

    #[test]
    fn test_validator_document_shape() {
        let validator = sample_schema().to_validator();
        let root = validator.get_document("$jsonSchema").unwrap();

        assert_eq!(root.get_str("bsonType").unwrap(), "object");
        assert!(root.get_bool("additionalProperties").unwrap());
        assert_eq!(root.get_array("required").unwrap(), &vec![Bson::from("name")]);

        let properties = root.get_document("properties").unwrap();
        assert!(properties.contains_key("_id"));
        assert!(properties.contains_key("age"));
    }

    #[test]
    fn test_rendering_is_deterministic() {
        assert_eq!(sample_schema().to_validator(), sample_schema().to_validator());
    }

    #[test]
    fn test_type_aliases() {
        assert_eq!(BsonType::ObjectId.alias(), "objectId");
        assert_eq!(BsonType::Date.alias(), "date");
        assert_eq!(BsonType::Long.alias(), "long");
        assert_eq!(BsonType::of(&Bson::Int32(3)), Some(BsonType::Int));
        assert_eq!(BsonType::of(&Bson::Null), Some(BsonType::Null));
    }
}
