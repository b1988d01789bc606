//! Seed generator
//!
//! Inserts a small, representative data set: three patients, two to four
//! triage entries each, and a `seed-info` system entry recording the counts.
//! Optionally clears all three collections first.

mod sample;

pub use sample::{approximate_dob, random_phone, sample_patients, sample_triages, SEED_USER};

use std::fmt;

use bson::oid::ObjectId;
use bson::{doc, Bson, DateTime, Document};
use chrono::Utc;
use rand::Rng;
use tracing::{info, warn};

use crate::model::{SystemMetadataEntry, SEED_INFO_KEY};
use crate::schema::{DEFAULT_SOURCE, PATIENTS, SYSTEM_METADATA, TRIAGE_ENTRIES};
use crate::store::{DocumentStore, StoreError, StoreResult};

/// Collections cleared by `--drop`, dependants first
pub const DROP_ORDER: [&str; 3] = [TRIAGE_ENTRIES, PATIENTS, SYSTEM_METADATA];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedOptions {
    /// Delete existing documents before inserting
    pub drop: bool,
}

/// Outcome of a seed run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedReport {
    pub dropped: bool,
    pub patients: usize,
    pub triages: usize,
    /// `meta.version` of the `seed-info` entry after this run
    pub seed_info_version: Option<i64>,
}

impl fmt::Display for SeedReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.dropped {
            writeln!(f, "Dropped existing data")?;
        }
        write!(
            f,
            "Seed complete: {} patients, {} triage entries.",
            self.patients, self.triages
        )
    }
}

fn to_documents<T: serde::Serialize>(items: &[T]) -> StoreResult<Vec<Document>> {
    items
        .iter()
        .map(|item| bson::to_document(item).map_err(StoreError::from))
        .collect()
}

fn object_ids(ids: &[Bson]) -> StoreResult<Vec<ObjectId>> {
    ids.iter()
        .map(|id| {
            id.as_object_id()
                .ok_or_else(|| StoreError::Encoding(format!("expected an ObjectId identity, got {}", id)))
        })
        .collect()
}

/// Runs one seed pass.
///
/// Storage errors abort the run; documents inserted before the failure are
/// kept.
pub async fn seed<S, R>(store: &S, options: SeedOptions, rng: &mut R) -> StoreResult<SeedReport>
where
    S: DocumentStore,
    R: Rng + ?Sized,
{
    if options.drop {
        warn!(database = store.database_name(), "dropping existing data");
        for collection in DROP_ORDER {
            let removed = store.delete_many(collection, doc! {}).await?;
            info!(collection, removed, "cleared collection");
        }
    }

    let now = Utc::now();

    let patients = sample_patients(rng, now);
    let inserted = store.insert_many(PATIENTS, to_documents(&patients)?).await?;
    let patient_ids = object_ids(&inserted)?;

    let visible = store
        .count_documents(PATIENTS, doc! { "_id": { "$in": inserted.clone() } })
        .await?;
    if visible != patient_ids.len() as u64 {
        return Err(StoreError::Storage(format!(
            "inserted {} patients but {} are visible",
            patient_ids.len(),
            visible
        )));
    }
    info!(count = patient_ids.len(), "inserted patients");

    let triages = sample_triages(rng, &patient_ids, now);
    store
        .insert_many(TRIAGE_ENTRIES, to_documents(&triages)?)
        .await?;
    info!(count = triages.len(), "inserted triage entries");

    record_seed_info(store, patients.len(), triages.len(), DateTime::from_chrono(now)).await?;

    let seed_info = match store
        .find_one(SYSTEM_METADATA, doc! { "key": SEED_INFO_KEY })
        .await?
    {
        Some(document) => Some(bson::from_document::<SystemMetadataEntry>(document)?),
        None => None,
    };

    let report = SeedReport {
        dropped: options.drop,
        patients: patients.len(),
        triages: triages.len(),
        seed_info_version: seed_info.and_then(|entry| entry.meta.version),
    };
    info!(patients = report.patients, triages = report.triages, "seed complete");
    Ok(report)
}

/// Upserts the `seed-info` entry.
///
/// Creation fields are written only when the entry is new; `updatedAt` is
/// stamped by the server and `version` is bumped on every run.
async fn record_seed_info<S: DocumentStore>(
    store: &S,
    patients: usize,
    triages: usize,
    now: DateTime,
) -> StoreResult<()> {
    let update = doc! {
        "$set": {
            "key": SEED_INFO_KEY,
            "value": { "patients": patients as i64, "triages": triages as i64 },
            "category": "system",
            "description": "Seed data statistics",
            "meta.updatedBy": SEED_USER,
        },
        "$setOnInsert": {
            "meta.createdAt": now,
            "meta.createdBy": SEED_USER,
            "meta.source": DEFAULT_SOURCE,
        },
        "$currentDate": { "meta.updatedAt": true },
        "$inc": { "meta.version": 1_i64 },
    };
    store
        .update_one(SYSTEM_METADATA, doc! { "key": SEED_INFO_KEY }, update, true)
        .await?;
    Ok(())
}
