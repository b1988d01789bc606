//! Index catalog
//!
//! Every index mirrors a query access pattern the system is optimised for.
//! A new query path gets its matching index here.

use super::errors::{IndexError, IndexResult};
use super::spec::IndexSpec;

/// Patients: lookup by name, phone and external identifier; free-text search.
pub fn patient_indexes() -> Vec<IndexSpec> {
    vec![
        IndexSpec::named("name_compound").asc("lastName").asc("firstName"),
        IndexSpec::named("contact_phone").asc("contact.phone"),
        IndexSpec::named("identifier_system_value")
            .asc("identifiers.system")
            .asc("identifiers.value"),
        IndexSpec::named("patient_text_search")
            .text("firstName")
            .text("lastName")
            .text("medicalHistory.allergies")
            .text("medicalHistory.conditions")
            .text("medicalHistory.medications"),
    ]
}

/// Triage entries: most recent first per patient, priority and status.
pub fn triage_entry_indexes() -> Vec<IndexSpec> {
    vec![
        IndexSpec::named("by_patient_time").asc("patientId").desc("triageTime"),
        IndexSpec::named("by_priority_time").asc("priority").desc("triageTime"),
        IndexSpec::named("by_status_time").asc("status").desc("triageTime"),
    ]
}

/// System metadata: unique settings keys, grouping by category.
pub fn system_metadata_indexes() -> Vec<IndexSpec> {
    vec![
        IndexSpec::named("key_unique").asc("key").unique(),
        IndexSpec::named("by_category").asc("category"),
    ]
}

/// Checks one collection's index list before it is applied.
///
/// Every spec must be valid on its own, names and key sets must be distinct,
/// and at most one full-text index may exist per collection.
pub fn validate_catalog(collection: &str, specs: &[IndexSpec]) -> IndexResult<()> {
    for (i, spec) in specs.iter().enumerate() {
        spec.validate()?;

        for earlier in &specs[..i] {
            if earlier.name == spec.name {
                return Err(IndexError::catalog_conflict(
                    collection,
                    format!("name '{}' is declared twice", spec.name),
                ));
            }
            if earlier.same_keys(spec) {
                return Err(IndexError::catalog_conflict(
                    collection,
                    format!("'{}' and '{}' index the same keys", earlier.name, spec.name),
                ));
            }
        }
    }

    if specs.iter().filter(|s| s.is_text()).count() > 1 {
        return Err(IndexError::catalog_conflict(
            collection,
            "more than one full-text index",
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::IndexDirection;

    fn find<'a>(specs: &'a [IndexSpec], name: &str) -> &'a IndexSpec {
        specs.iter().find(|s| s.name == name).unwrap()
    }

    #[test]
    fn test_catalogs_are_consistent() {
        assert!(validate_catalog("patients", &patient_indexes()).is_ok());
        assert!(validate_catalog("triage_entries", &triage_entry_indexes()).is_ok());
        assert!(validate_catalog("system_metadata", &system_metadata_indexes()).is_ok());
    }

    #[test]
    fn test_patient_name_compound() {
        let specs = patient_indexes();
        let spec = find(&specs, "name_compound");
        assert_eq!(
            spec.keys,
            vec![
                ("lastName".to_string(), IndexDirection::Ascending),
                ("firstName".to_string(), IndexDirection::Ascending),
            ]
        );
        assert!(!spec.unique);
    }

    #[test]
    fn test_patient_text_search_fields() {
        let specs = patient_indexes();
        let spec = find(&specs, "patient_text_search");
        assert!(spec.is_text());
        let fields: Vec<&str> = spec.fields().collect();
        assert_eq!(
            fields,
            vec![
                "firstName",
                "lastName",
                "medicalHistory.allergies",
                "medicalHistory.conditions",
                "medicalHistory.medications",
            ]
        );
    }

    #[test]
    fn test_triage_indexes_are_recency_ordered() {
        for spec in triage_entry_indexes() {
            assert_eq!(
                spec.keys.last(),
                Some(&("triageTime".to_string(), IndexDirection::Descending))
            );
        }
    }

    #[test]
    fn test_only_settings_key_is_unique() {
        let unique: Vec<String> = patient_indexes()
            .into_iter()
            .chain(triage_entry_indexes())
            .chain(system_metadata_indexes())
            .filter(|s| s.unique)
            .map(|s| s.name)
            .collect();
        assert_eq!(unique, vec!["key_unique"]);
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let specs = vec![
            IndexSpec::named("a").asc("x"),
            IndexSpec::named("a").asc("y"),
        ];
        let err = validate_catalog("c", &specs).unwrap_err();
        assert!(err.message().contains("twice"));
    }

    #[test]
    fn test_duplicate_keys_rejected() {
        let specs = vec![
            IndexSpec::named("a").asc("x"),
            IndexSpec::named("b").asc("x").unique(),
        ];
        assert!(validate_catalog("c", &specs).is_err());
    }

    #[test]
    fn test_second_text_index_rejected() {
        let specs = vec![
            IndexSpec::named("a").text("x"),
            IndexSpec::named("b").text("y"),
        ];
        assert!(validate_catalog("c", &specs).is_err());
    }
}
