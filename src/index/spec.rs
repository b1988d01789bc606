//! Index specifications
//!
//! An index is identified by a stable name. Two specs with the same name are
//! the same index only if their keys (fields, order, directions) and
//! uniqueness match; anything else is a conflict that cannot be reconciled in
//! place.

use std::fmt;

use bson::{Bson, Document};

use super::errors::{IndexError, IndexResult};

/// Per-field index direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexDirection {
    Ascending,
    Descending,
    /// Full-text
    Text,
}

impl IndexDirection {
    /// Value used in a key document
    pub fn to_bson(&self) -> Bson {
        match self {
            IndexDirection::Ascending => Bson::Int32(1),
            IndexDirection::Descending => Bson::Int32(-1),
            IndexDirection::Text => Bson::String("text".into()),
        }
    }

    /// Parses a key document value; numeric values of any width are accepted.
    pub fn from_bson(value: &Bson) -> Option<Self> {
        match value {
            Bson::String(s) if s == "text" => Some(IndexDirection::Text),
            Bson::Int32(1) | Bson::Int64(1) => Some(IndexDirection::Ascending),
            Bson::Int32(-1) | Bson::Int64(-1) => Some(IndexDirection::Descending),
            Bson::Double(d) if *d == 1.0 => Some(IndexDirection::Ascending),
            Bson::Double(d) if *d == -1.0 => Some(IndexDirection::Descending),
            _ => None,
        }
    }
}

impl fmt::Display for IndexDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexDirection::Ascending => write!(f, "asc"),
            IndexDirection::Descending => write!(f, "desc"),
            IndexDirection::Text => write!(f, "text"),
        }
    }
}

/// Declarative index definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSpec {
    /// Stable name used for idempotent re-creation
    pub name: String,
    /// Ordered key fields (dotted paths allowed)
    pub keys: Vec<(String, IndexDirection)>,
    /// Whether the key tuple must be unique across the collection
    pub unique: bool,
}

impl IndexSpec {
    /// Starts a spec with no keys
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            keys: Vec::new(),
            unique: false,
        }
    }

    /// Appends an ascending key
    pub fn asc(self, field: impl Into<String>) -> Self {
        self.key(field, IndexDirection::Ascending)
    }

    /// Appends a descending key
    pub fn desc(self, field: impl Into<String>) -> Self {
        self.key(field, IndexDirection::Descending)
    }

    /// Appends a full-text key
    pub fn text(self, field: impl Into<String>) -> Self {
        self.key(field, IndexDirection::Text)
    }

    /// Appends a key
    pub fn key(mut self, field: impl Into<String>, direction: IndexDirection) -> Self {
        self.keys.push((field.into(), direction));
        self
    }

    /// Marks the index unique
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Whether any key is full-text
    pub fn is_text(&self) -> bool {
        self.keys.iter().any(|(_, d)| *d == IndexDirection::Text)
    }

    /// Key field paths in declaration order
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(|(f, _)| f.as_str())
    }

    /// Renders the key document, e.g. `{ lastName: 1, firstName: 1 }`
    pub fn key_document(&self) -> Document {
        let mut out = Document::new();
        for (field, direction) in &self.keys {
            out.insert(field.clone(), direction.to_bson());
        }
        out
    }

    /// Whether `other` describes the same physical index.
    ///
    /// Text keys are compared as a set, because the storage engine does not
    /// preserve their declaration order.
    pub fn same_definition(&self, other: &IndexSpec) -> bool {
        if self.unique != other.unique || self.keys.len() != other.keys.len() {
            return false;
        }
        if self.is_text() || other.is_text() {
            let contains_all = |a: &IndexSpec, b: &IndexSpec| a.keys.iter().all(|k| b.keys.contains(k));
            return contains_all(self, other) && contains_all(other, self);
        }
        self.keys == other.keys
    }

    /// Whether both specs index the same keys, ignoring name and uniqueness
    pub fn same_keys(&self, other: &IndexSpec) -> bool {
        let mut a = self.clone();
        let mut b = other.clone();
        a.unique = false;
        b.unique = false;
        a.same_definition(&b)
    }

    /// Describes why `existing` cannot stand in for `self`, if it cannot.
    ///
    /// Returns `None` when the two are unrelated or identical.
    pub fn conflict_with(&self, existing: &IndexSpec) -> Option<String> {
        if self.name == existing.name {
            if self.same_definition(existing) {
                return None;
            }
            return Some(format!(
                "index '{}' already exists as {} but is declared as {}",
                self.name, existing, self
            ));
        }
        if self.same_keys(existing) {
            return Some(format!(
                "index {} is declared as '{}' but already exists as '{}'",
                self.describe_keys(),
                self.name,
                existing.name
            ));
        }
        None
    }

    /// Parses a storage listing entry.
    ///
    /// Full-text indexes are listed with internal `_fts`/`_ftsx` keys; the
    /// indexed fields are then recovered from `weights`.
    pub fn from_listing(
        name: impl Into<String>,
        key: &Document,
        unique: bool,
        weights: Option<&Document>,
    ) -> Option<Self> {
        let mut spec = IndexSpec::named(name);
        spec.unique = unique;

        for (field, value) in key {
            match field.as_str() {
                "_fts" => {
                    for text_field in weights?.keys() {
                        spec.keys.push((text_field.clone(), IndexDirection::Text));
                    }
                }
                "_ftsx" => {}
                _ => spec.keys.push((field.clone(), IndexDirection::from_bson(value)?)),
            }
        }

        Some(spec)
    }

    /// Checks that the spec can be created.
    pub fn validate(&self) -> IndexResult<()> {
        if self.name.trim().is_empty() {
            return Err(IndexError::invalid_spec(&self.name, "index name must not be empty"));
        }
        if self.keys.is_empty() {
            return Err(IndexError::invalid_spec(&self.name, "index must declare at least one key"));
        }
        for (i, (field, _)) in self.keys.iter().enumerate() {
            if field.is_empty() {
                return Err(IndexError::invalid_spec(&self.name, "key field must not be empty"));
            }
            if self.keys[..i].iter().any(|(f, _)| f == field) {
                return Err(IndexError::invalid_spec(
                    &self.name,
                    format!("field '{}' appears twice", field),
                ));
            }
        }
        if self.unique && self.is_text() {
            return Err(IndexError::invalid_spec(&self.name, "full-text indexes cannot be unique"));
        }
        Ok(())
    }

    fn describe_keys(&self) -> String {
        let parts: Vec<String> = self
            .keys
            .iter()
            .map(|(f, d)| format!("{} {}", f, d))
            .collect();
        format!("({})", parts.join(", "))
    }
}

impl fmt::Display for IndexSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.describe_keys())?;
        if self.unique {
            write!(f, " unique")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    #[test]
    fn test_key_document_preserves_order() {
        let spec = IndexSpec::named("by_patient_time").asc("patientId").desc("triageTime");
        let key_doc = spec.key_document();
        let keys: Vec<&String> = key_doc.keys().collect();
        assert_eq!(keys, vec!["patientId", "triageTime"]);
        assert_eq!(spec.key_document(), doc! { "patientId": 1, "triageTime": -1 });
    }

    #[test]
    fn test_identical_specs_do_not_conflict() {
        let a = IndexSpec::named("key_unique").asc("key").unique();
        assert_eq!(a.conflict_with(&a.clone()), None);
    }

    #[test]
    fn test_same_name_different_keys_conflicts() {
        let declared = IndexSpec::named("key_unique").asc("key").unique();
        let existing = IndexSpec::named("key_unique").asc("category").unique();
        assert!(declared.conflict_with(&existing).is_some());
    }

    #[test]
    fn test_same_name_different_uniqueness_conflicts() {
        let declared = IndexSpec::named("key_unique").asc("key").unique();
        let existing = IndexSpec::named("key_unique").asc("key");
        assert!(declared.conflict_with(&existing).is_some());
    }

    #[test]
    fn test_same_keys_different_name_conflicts() {
        let declared = IndexSpec::named("by_category").asc("category");
        let existing = IndexSpec::named("category_1").asc("category");
        let reason = declared.conflict_with(&existing).unwrap();
        assert!(reason.contains("category_1"));
    }

    #[test]
    fn test_direction_matters() {
        let declared = IndexSpec::named("a").asc("x");
        let existing = IndexSpec::named("b").desc("x");
        assert_eq!(declared.conflict_with(&existing), None);
    }

    #[test]
    fn test_text_keys_compare_as_set() {
        let a = IndexSpec::named("t").text("firstName").text("lastName");
        let b = IndexSpec::named("t").text("lastName").text("firstName");
        assert!(a.same_definition(&b));
    }

    #[test]
    fn test_from_listing_plain() {
        let key = doc! { "lastName": 1, "firstName": 1 };
        let spec = IndexSpec::from_listing("name_compound", &key, false, None).unwrap();
        assert_eq!(spec, IndexSpec::named("name_compound").asc("lastName").asc("firstName"));
    }

    #[test]
    fn test_from_listing_text_uses_weights() {
        let key = doc! { "_fts": "text", "_ftsx": 1 };
        let weights = doc! { "firstName": 1, "lastName": 1 };
        let spec = IndexSpec::from_listing("patient_text_search", &key, false, Some(&weights)).unwrap();

        let expected = IndexSpec::named("patient_text_search").text("firstName").text("lastName");
        assert!(spec.same_definition(&expected));
    }

    #[test]
    fn test_from_listing_rejects_unknown_direction() {
        let key = doc! { "location": "2dsphere" };
        assert!(IndexSpec::from_listing("geo", &key, false, None).is_none());
    }

    #[test]
    fn test_validate() {
        assert!(IndexSpec::named("ok").asc("a").validate().is_ok());
        assert!(IndexSpec::named("").asc("a").validate().is_err());
        assert!(IndexSpec::named("empty").validate().is_err());
        assert!(IndexSpec::named("dup").asc("a").desc("a").validate().is_err());
        assert!(IndexSpec::named("t").text("a").unique().validate().is_err());
    }
}
