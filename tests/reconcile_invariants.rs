//! Reconciliation invariants
//!
//! Validators and indexes converge on the declared state, repeated passes
//! are no-ops, conflicts abort, and interrupted passes resume.

use bson::doc;
use triage_db::applier::{reconcile, CollectionAction, ReconcileError};
use triage_db::index::IndexSpec;
use triage_db::schema::{Entity, PATIENTS, SYSTEM_METADATA, TRIAGE_ENTRIES};
use triage_db::store::{DocumentStore, MemoryStore, Operation, StoreError};

async fn index_set(store: &MemoryStore, collection: &str) -> Vec<IndexSpec> {
    store.list_indexes(collection).await.unwrap()
}

fn find<'a>(indexes: &'a [IndexSpec], name: &str) -> &'a IndexSpec {
    indexes
        .iter()
        .find(|ix| ix.name == name)
        .unwrap_or_else(|| panic!("index '{}' missing", name))
}

#[tokio::test]
async fn test_reconcile_twice_matches_once() {
    let once = MemoryStore::new("triage");
    reconcile(&once).await.unwrap();

    let twice = MemoryStore::new("triage");
    reconcile(&twice).await.unwrap();
    let second = reconcile(&twice).await.unwrap();

    assert!(second
        .collections
        .iter()
        .all(|c| c.action == CollectionAction::Updated));

    for entity in Entity::ALL {
        let collection = entity.collection();
        assert_eq!(
            index_set(&once, collection).await,
            index_set(&twice, collection).await
        );
        assert_eq!(
            once.collection_validator(collection).await.unwrap(),
            twice.collection_validator(collection).await.unwrap()
        );
    }
}

#[tokio::test]
async fn test_catalog_indexes_present_by_name() {
    let store = MemoryStore::new("triage");
    reconcile(&store).await.unwrap();

    for entity in Entity::ALL {
        let present = index_set(&store, entity.collection()).await;
        for declared in entity.indexes() {
            let found = find(&present, &declared.name);
            assert!(found.same_definition(&declared), "{} differs", declared.name);
        }
    }

    let patients = index_set(&store, PATIENTS).await;
    let name_compound = find(&patients, "name_compound");
    assert_eq!(name_compound.fields().collect::<Vec<_>>(), vec!["lastName", "firstName"]);
    assert!(!name_compound.unique);

    let metadata = index_set(&store, SYSTEM_METADATA).await;
    let key_unique = find(&metadata, "key_unique");
    assert!(key_unique.unique);
    assert_eq!(key_unique.fields().collect::<Vec<_>>(), vec!["key"]);
}

#[tokio::test]
async fn test_validators_attached_in_moderate_mode() {
    let store = MemoryStore::new("triage");
    reconcile(&store).await.unwrap();

    for entity in Entity::ALL {
        let validator = store
            .collection_validator(entity.collection())
            .await
            .unwrap()
            .expect("validator attached");
        assert_eq!(validator, entity.schema().to_validator());
        assert_eq!(
            store.validation_level(entity.collection()),
            Some(triage_db::schema::ValidationLevel::Moderate)
        );
    }
}

#[tokio::test]
async fn test_conflicting_index_aborts() {
    let store = MemoryStore::new("triage");
    // Same name as the catalog entry, but not unique
    store
        .create_indexes(SYSTEM_METADATA, &[IndexSpec::named("key_unique").asc("key")])
        .await
        .unwrap();

    let err = reconcile(&store).await.unwrap_err();
    match err {
        ReconcileError::Store(StoreError::ValidationConflict { collection, .. }) => {
            assert_eq!(collection, SYSTEM_METADATA);
        }
        other => panic!("unexpected error: {:?}", other),
    }

    // Not silently overwritten
    let present = index_set(&store, SYSTEM_METADATA).await;
    assert!(!find(&present, "key_unique").unique);
}

#[tokio::test]
async fn test_same_keys_under_other_name_aborts() {
    let store = MemoryStore::new("triage");
    store
        .create_indexes(
            TRIAGE_ENTRIES,
            &[IndexSpec::named("patientId_1_triageTime_-1")
                .asc("patientId")
                .desc("triageTime")],
        )
        .await
        .unwrap();

    let err = reconcile(&store).await.unwrap_err();
    assert!(matches!(
        err,
        ReconcileError::Store(StoreError::ValidationConflict { .. })
    ));
}

#[tokio::test]
async fn test_interrupted_pass_resumes() {
    let store = MemoryStore::new("triage");
    store.fail_next(
        Operation::CreateIndexes,
        Some(TRIAGE_ENTRIES),
        StoreError::Transient("primary stepped down".into()),
    );

    let err = reconcile(&store).await.unwrap_err();
    assert!(matches!(err, ReconcileError::Store(StoreError::Transient(_))));

    // Patients finished, triage entries only have the implicit identity index
    assert_eq!(index_set(&store, PATIENTS).await.len(), 5);
    assert_eq!(index_set(&store, TRIAGE_ENTRIES).await.len(), 1);

    let report = reconcile(&store).await.unwrap();
    assert_eq!(report.created().count(), 0);
    for entity in Entity::ALL {
        let present = index_set(&store, entity.collection()).await;
        for declared in entity.indexes() {
            find(&present, &declared.name);
        }
    }
}

#[tokio::test]
async fn test_interrupted_creation_resumes() {
    let store = MemoryStore::new("triage");
    store.fail_next(
        Operation::CreateCollection,
        Some(SYSTEM_METADATA),
        StoreError::Connection("connection reset".into()),
    );

    assert!(reconcile(&store).await.is_err());
    let names = store.list_collection_names().await.unwrap();
    assert!(names.contains(&PATIENTS.to_string()));
    assert!(!names.contains(&SYSTEM_METADATA.to_string()));

    let report = reconcile(&store).await.unwrap();
    let created: Vec<Entity> = report.created().collect();
    assert_eq!(created, vec![Entity::SystemMetadata]);
}

#[tokio::test]
async fn test_existing_collection_gains_validator_without_touching_data() {
    let store = MemoryStore::new("triage");
    store
        .insert_many(PATIENTS, vec![doc! { "legacy": true }])
        .await
        .unwrap();

    let report = reconcile(&store).await.unwrap();

    let updated: Vec<Entity> = report.updated().collect();
    assert_eq!(updated, vec![Entity::Patient]);
    assert!(store.collection_validator(PATIENTS).await.unwrap().is_some());
    assert_eq!(store.documents(PATIENTS).len(), 1);
    assert_eq!(
        store
            .count_documents(PATIENTS, doc! { "legacy": true })
            .await
            .unwrap(),
        1
    );
}
