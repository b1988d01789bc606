//! End-to-end seed scenario against reconciled storage

use std::collections::HashSet;

use bson::{doc, Bson};
use rand::rngs::StdRng;
use rand::SeedableRng;
use triage_db::applier::reconcile;
use triage_db::model::{Patient, SystemMetadataEntry, TriageEntry, SEED_INFO_KEY};
use triage_db::schema::{PATIENTS, SYSTEM_METADATA, TRIAGE_ENTRIES};
use triage_db::seed::{seed, SeedOptions};
use triage_db::store::{DocumentStore, MemoryStore};

async fn seed_info(store: &MemoryStore) -> SystemMetadataEntry {
    let document = store
        .find_one(SYSTEM_METADATA, doc! { "key": SEED_INFO_KEY })
        .await
        .unwrap()
        .expect("seed-info recorded");
    bson::from_document(document).unwrap()
}

#[tokio::test]
async fn test_seed_counts_and_statistics() {
    let store = MemoryStore::new("triage");
    reconcile(&store).await.unwrap();

    let mut rng = StdRng::seed_from_u64(2024);
    let report = seed(&store, SeedOptions::default(), &mut rng).await.unwrap();

    let patients = store.count_documents(PATIENTS, doc! {}).await.unwrap();
    let triages = store.count_documents(TRIAGE_ENTRIES, doc! {}).await.unwrap();
    assert_eq!(patients, 3);
    assert!((6..=12).contains(&triages));
    assert_eq!(triages, report.triages as u64);

    let info = seed_info(&store).await;
    assert_eq!(
        info.value,
        Bson::Document(doc! { "patients": 3_i64, "triages": triages as i64 })
    );
    assert_eq!(info.category.as_deref(), Some("system"));
    assert_eq!(info.description.as_deref(), Some("Seed data statistics"));
    assert_eq!(info.meta.created_by.as_deref(), Some("seed"));
    assert_eq!(info.meta.source.as_deref(), Some("triage-db"));
}

#[tokio::test]
async fn test_seeded_triages_reference_seeded_patients() {
    let store = MemoryStore::new("triage");
    reconcile(&store).await.unwrap();
    seed(&store, SeedOptions::default(), &mut StdRng::seed_from_u64(9))
        .await
        .unwrap();

    let patient_ids: HashSet<_> = store
        .documents(PATIENTS)
        .into_iter()
        .map(|d| bson::from_document::<Patient>(d).unwrap().id.unwrap())
        .collect();

    let entries: Vec<TriageEntry> = store
        .documents(TRIAGE_ENTRIES)
        .into_iter()
        .map(|d| bson::from_document(d).unwrap())
        .collect();

    for id in &patient_ids {
        let count = entries.iter().filter(|e| e.patient_id == *id).count();
        assert!((2..=4).contains(&count));
    }
    assert!(entries.iter().all(|e| patient_ids.contains(&e.patient_id)));
}

#[tokio::test]
async fn test_reseed_keeps_creation_metadata() {
    let store = MemoryStore::new("triage");
    reconcile(&store).await.unwrap();
    let mut rng = StdRng::seed_from_u64(5);

    seed(&store, SeedOptions::default(), &mut rng).await.unwrap();
    let first = seed_info(&store).await;

    let report = seed(&store, SeedOptions::default(), &mut rng).await.unwrap();
    let second = seed_info(&store).await;

    assert_eq!(second.id, first.id);
    assert_eq!(second.meta.created_at, first.meta.created_at);
    assert!(second.meta.updated_at >= first.meta.updated_at);
    assert_eq!(second.meta.version, Some(2));
    assert_eq!(report.seed_info_version, Some(2));
    // Without --drop, documents accumulate
    assert_eq!(store.count_documents(PATIENTS, doc! {}).await.unwrap(), 6);
}

#[tokio::test]
async fn test_seed_with_drop_replaces_data() {
    let store = MemoryStore::new("triage");
    reconcile(&store).await.unwrap();
    let mut rng = StdRng::seed_from_u64(11);

    seed(&store, SeedOptions::default(), &mut rng).await.unwrap();
    seed(&store, SeedOptions::default(), &mut rng).await.unwrap();
    let report = seed(&store, SeedOptions { drop: true }, &mut rng).await.unwrap();

    assert!(report.dropped);
    assert_eq!(store.count_documents(PATIENTS, doc! {}).await.unwrap(), 3);
    assert_eq!(
        store.count_documents(TRIAGE_ENTRIES, doc! {}).await.unwrap(),
        report.triages as u64
    );
    assert_eq!(seed_info(&store).await.meta.version, Some(1));

    // Indexes survive a drop
    let indexes = store.list_indexes(SYSTEM_METADATA).await.unwrap();
    assert!(indexes.iter().any(|ix| ix.name == "key_unique"));
}
