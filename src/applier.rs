//! Schema applier
//!
//! Brings live collections into agreement with the declared entity schemas
//! and the index catalog. The pass is one-way and convergent: missing
//! collections are created with a moderate validator, existing ones have
//! their validator replaced, and every catalog index is declared by name.
//! No documents are read or written.
//!
//! Entities are reconciled one after another and nothing is rolled back. A
//! failure part-way leaves earlier entities reconciled; running the pass
//! again completes the rest.

use std::fmt;

use thiserror::Error;
use tracing::{debug, info};

use crate::index::{validate_catalog, IndexError};
use crate::schema::{Entity, SchemaError};
use crate::store::{CollectionValidator, DocumentStore, StoreError};

/// Reconciliation errors
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("{0}")]
    Schema(#[from] SchemaError),

    #[error("{0}")]
    Index(#[from] IndexError),

    #[error("{0}")]
    Store(#[from] StoreError),
}

/// What happened to a collection's validator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionAction {
    Created,
    Updated,
}

/// Per-entity result of a reconciliation pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionOutcome {
    pub entity: Entity,
    pub action: CollectionAction,
    /// Catalog index names declared on the collection
    pub indexes: Vec<String>,
}

/// Summary of a full reconciliation pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub database: String,
    pub collections: Vec<CollectionOutcome>,
}

impl ReconcileReport {
    /// Entities whose collection was created by this pass
    pub fn created(&self) -> impl Iterator<Item = Entity> + '_ {
        self.with_action(CollectionAction::Created)
    }

    /// Entities whose existing validator was replaced by this pass
    pub fn updated(&self) -> impl Iterator<Item = Entity> + '_ {
        self.with_action(CollectionAction::Updated)
    }

    /// Total catalog indexes ensured
    pub fn index_count(&self) -> usize {
        self.collections.iter().map(|c| c.indexes.len()).sum()
    }

    fn with_action(&self, action: CollectionAction) -> impl Iterator<Item = Entity> + '_ {
        self.collections
            .iter()
            .filter(move |c| c.action == action)
            .map(|c| c.entity)
    }
}

impl fmt::Display for ReconcileReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Initialized database \"{}\"", self.database)?;
        for outcome in &self.collections {
            let collection = outcome.entity.collection();
            match outcome.action {
                CollectionAction::Created => writeln!(f, "  created collection: {}", collection)?,
                CollectionAction::Updated => {
                    writeln!(f, "  updated validator for: {}", collection)?
                }
            }
            writeln!(
                f,
                "  {} indexes ensured ({})",
                outcome.entity.label(),
                outcome.indexes.join(", ")
            )?;
        }
        write!(
            f,
            "{} collections, {} indexes",
            self.collections.len(),
            self.index_count()
        )
    }
}

/// Checks every declared schema and index list before storage is touched.
pub fn check_declarations() -> Result<(), ReconcileError> {
    for entity in Entity::ALL {
        let schema = entity.schema();
        schema
            .validate_structure()
            .map_err(|reason| SchemaError::malformed(&schema.collection, reason))?;
        validate_catalog(entity.collection(), &entity.indexes())?;
    }
    Ok(())
}

/// Reconciles validators and indexes for every entity.
///
/// # Errors
///
/// The first storage error aborts the pass and is returned unchanged; a
/// conflicting index definition surfaces as [`StoreError::ValidationConflict`].
pub async fn reconcile<S: DocumentStore>(store: &S) -> Result<ReconcileReport, ReconcileError> {
    check_declarations()?;

    info!(database = store.database_name(), "reconciling collections");
    let existing = store.list_collection_names().await?;

    let mut report = ReconcileReport {
        database: store.database_name().to_string(),
        collections: Vec::with_capacity(Entity::ALL.len()),
    };

    for entity in Entity::ALL {
        let collection = entity.collection();
        let validator = CollectionValidator::moderate(entity.schema());

        let action = if existing.iter().any(|name| name == collection) {
            store.modify_validator(collection, &validator).await?;
            info!(collection, "updated validator");
            CollectionAction::Updated
        } else {
            store.create_collection(collection, &validator).await?;
            info!(collection, "created collection");
            CollectionAction::Created
        };

        report.collections.push(CollectionOutcome {
            entity,
            action,
            indexes: Vec::new(),
        });
    }

    for (entity, outcome) in Entity::ALL.into_iter().zip(report.collections.iter_mut()) {
        let indexes = entity.indexes();
        store.create_indexes(entity.collection(), &indexes).await?;
        for spec in &indexes {
            debug!(collection = entity.collection(), index = %spec.name, keys = %spec, "index ensured");
        }
        info!(collection = entity.collection(), count = indexes.len(), "indexes ensured");
        outcome.indexes = indexes.into_iter().map(|spec| spec.name).collect();
    }

    info!(database = store.database_name(), "database initialization complete");
    Ok(report)
}
