//! MongoDB-backed document store

use bson::{doc, Bson, Document};
use futures_util::TryStreamExt;
use mongodb::error::{
    Error as DriverError, ErrorKind, WriteFailure, RETRYABLE_WRITE_ERROR,
    TRANSIENT_TRANSACTION_ERROR,
};
use mongodb::options::{
    ClientOptions, IndexOptions, ValidationAction, ValidationLevel as DriverValidationLevel,
};
use mongodb::{Client, Collection, Database, IndexModel};
use tracing::{debug, info};

use super::backend::{CollectionValidator, DocumentStore, UpdateOutcome};
use super::errors::{StoreError, StoreResult};
use crate::config::Config;
use crate::index::IndexSpec;
use crate::schema::ValidationLevel;

const APP_NAME: &str = "triage-db";

// Server error codes
const UNAUTHORIZED: i32 = 13;
const AUTHENTICATION_FAILED: i32 = 18;
const NAMESPACE_NOT_FOUND: i32 = 26;
const NAMESPACE_EXISTS: i32 = 48;
const INDEX_OPTIONS_CONFLICT: i32 = 85;
const INDEX_KEY_SPECS_CONFLICT: i32 = 86;
const SHUTDOWN_IN_PROGRESS: i32 = 91;
const WRITE_CONFLICT: i32 = 112;
const DOCUMENT_VALIDATION_FAILURE: i32 = 121;
const PRIMARY_STEPPED_DOWN: i32 = 189;
const DUPLICATE_KEY: i32 = 11000;
const INTERRUPTED_AT_SHUTDOWN: i32 = 11600;
const INTERRUPTED_DUE_TO_REPL_STATE_CHANGE: i32 = 11602;

/// Document store backed by a MongoDB connection pool
#[derive(Debug, Clone)]
pub struct MongoStore {
    client: Client,
    db: Database,
}

impl MongoStore {
    /// Connects and verifies the server is reachable.
    ///
    /// The driver connects lazily, so a `ping` is issued up front to surface
    /// unreachable or unauthenticated servers before any work starts.
    pub async fn connect(config: &Config) -> StoreResult<Self> {
        let mut options = ClientOptions::parse(&config.url)
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;
        options.app_name = Some(APP_NAME.to_string());
        options.max_pool_size = Some(config.max_pool_size);
        options.min_pool_size = Some(config.min_pool_size);

        let client =
            Client::with_options(options).map_err(|e| StoreError::Connection(e.to_string()))?;
        let db = client.database(&config.database);

        if let Err(e) = db.run_command(doc! { "ping": 1 }).await {
            client.shutdown().await;
            return Err(match classify(e, "") {
                err @ StoreError::Transient(_) => err,
                other => StoreError::Connection(other.to_string()),
            });
        }

        info!(database = %config.database, "connected to MongoDB");
        Ok(Self { client, db })
    }

    fn collection(&self, name: &str) -> Collection<Document> {
        self.db.collection::<Document>(name)
    }
}

impl DocumentStore for MongoStore {
    fn database_name(&self) -> &str {
        self.db.name()
    }

    async fn list_collection_names(&self) -> StoreResult<Vec<String>> {
        self.db
            .list_collection_names()
            .await
            .map_err(|e| classify(e, ""))
    }

    async fn create_collection(&self, name: &str, validator: &CollectionValidator) -> StoreResult<()> {
        self.db
            .create_collection(name)
            .validator(validator.document())
            .validation_level(driver_level(validator.level))
            .validation_action(ValidationAction::Error)
            .await
            .map_err(|e| classify(e, name))
    }

    async fn modify_validator(&self, name: &str, validator: &CollectionValidator) -> StoreResult<()> {
        let command = doc! {
            "collMod": name,
            "validator": validator.document(),
            "validationLevel": validator.level.as_str(),
            "validationAction": "error",
        };
        self.db
            .run_command(command)
            .await
            .map(|_| ())
            .map_err(|e| classify(e, name))
    }

    async fn collection_validator(&self, name: &str) -> StoreResult<Option<Document>> {
        let mut cursor = self
            .db
            .list_collections()
            .filter(doc! { "name": name })
            .await
            .map_err(|e| classify(e, name))?;
        let spec = cursor.try_next().await.map_err(|e| classify(e, name))?;
        Ok(spec.and_then(|s| s.options.validator))
    }

    async fn create_indexes(&self, collection: &str, indexes: &[IndexSpec]) -> StoreResult<()> {
        if indexes.is_empty() {
            return Ok(());
        }
        let models: Vec<IndexModel> = indexes.iter().map(index_model).collect();
        self.collection(collection)
            .create_indexes(models)
            .await
            .map(|_| ())
            .map_err(|e| classify(e, collection))
    }

    async fn list_indexes(&self, collection: &str) -> StoreResult<Vec<IndexSpec>> {
        let models: Vec<IndexModel> = self
            .collection(collection)
            .list_indexes()
            .await
            .map_err(|e| classify(e, collection))?
            .try_collect()
            .await
            .map_err(|e| classify(e, collection))?;

        let mut specs = Vec::with_capacity(models.len());
        for model in models {
            let options = model.options.unwrap_or_default();
            let name = options.name.unwrap_or_default();
            let unique = options.unique.unwrap_or(false);
            match IndexSpec::from_listing(&name, &model.keys, unique, options.weights.as_ref()) {
                Some(spec) => specs.push(spec),
                None => debug!(collection, index = %name, "skipping index with unsupported key type"),
            }
        }
        Ok(specs)
    }

    async fn insert_many(&self, collection: &str, documents: Vec<Document>) -> StoreResult<Vec<Bson>> {
        if documents.is_empty() {
            return Ok(Vec::new());
        }
        let result = self
            .collection(collection)
            .insert_many(documents)
            .await
            .map_err(|e| classify(e, collection))?;

        let mut ids: Vec<(usize, Bson)> = result.inserted_ids.into_iter().collect();
        ids.sort_by_key(|(position, _)| *position);
        Ok(ids.into_iter().map(|(_, id)| id).collect())
    }

    async fn find_one(&self, collection: &str, filter: Document) -> StoreResult<Option<Document>> {
        self.collection(collection)
            .find_one(filter)
            .await
            .map_err(|e| classify(e, collection))
    }

    async fn update_one(
        &self,
        collection: &str,
        filter: Document,
        update: Document,
        upsert: bool,
    ) -> StoreResult<UpdateOutcome> {
        let result = self
            .collection(collection)
            .update_one(filter, update)
            .upsert(upsert)
            .await
            .map_err(|e| classify(e, collection))?;
        Ok(UpdateOutcome {
            matched: result.matched_count,
            modified: result.modified_count,
            upserted_id: result.upserted_id,
        })
    }

    async fn delete_many(&self, collection: &str, filter: Document) -> StoreResult<u64> {
        self.collection(collection)
            .delete_many(filter)
            .await
            .map(|r| r.deleted_count)
            .map_err(|e| classify(e, collection))
    }

    async fn count_documents(&self, collection: &str, filter: Document) -> StoreResult<u64> {
        self.collection(collection)
            .count_documents(filter)
            .await
            .map_err(|e| classify(e, collection))
    }

    async fn close(self) {
        self.client.shutdown().await;
        debug!("MongoDB client shut down");
    }
}

fn driver_level(level: ValidationLevel) -> DriverValidationLevel {
    match level {
        ValidationLevel::Off => DriverValidationLevel::Off,
        ValidationLevel::Moderate => DriverValidationLevel::Moderate,
        ValidationLevel::Strict => DriverValidationLevel::Strict,
    }
}

fn index_model(spec: &IndexSpec) -> IndexModel {
    let mut options = IndexOptions::default();
    options.name = Some(spec.name.clone());
    if spec.unique {
        options.unique = Some(true);
    }
    IndexModel::builder()
        .keys(spec.key_document())
        .options(options)
        .build()
}

/// Maps a driver error onto the store taxonomy
fn classify(err: DriverError, collection: &str) -> StoreError {
    let message = err.to_string();

    if err.contains_label(TRANSIENT_TRANSACTION_ERROR) || err.contains_label(RETRYABLE_WRITE_ERROR) {
        return StoreError::Transient(message);
    }

    let code = match err.kind.as_ref() {
        ErrorKind::Command(command) => Some(command.code),
        ErrorKind::Write(WriteFailure::WriteError(write)) => Some(write.code),
        ErrorKind::Write(WriteFailure::WriteConcernError(concern)) => Some(concern.code),
        ErrorKind::InsertMany(insert) => insert
            .write_errors
            .as_ref()
            .and_then(|errors| errors.first())
            .map(|write| write.code),
        ErrorKind::ServerSelection { .. }
        | ErrorKind::Authentication { .. }
        | ErrorKind::DnsResolve { .. }
        | ErrorKind::Io(_)
        | ErrorKind::ConnectionPoolCleared { .. } => {
            return StoreError::Connection(message);
        }
        _ => None,
    };

    match code {
        Some(UNAUTHORIZED | AUTHENTICATION_FAILED) => StoreError::Connection(message),
        Some(INDEX_OPTIONS_CONFLICT | INDEX_KEY_SPECS_CONFLICT) => StoreError::ValidationConflict {
            collection: collection.to_string(),
            message,
        },
        Some(
            WRITE_CONFLICT
            | SHUTDOWN_IN_PROGRESS
            | PRIMARY_STEPPED_DOWN
            | INTERRUPTED_AT_SHUTDOWN
            | INTERRUPTED_DUE_TO_REPL_STATE_CHANGE,
        ) => StoreError::Transient(message),
        Some(DOCUMENT_VALIDATION_FAILURE) => StoreError::DocumentValidation {
            collection: collection.to_string(),
            reason: message,
        },
        Some(DUPLICATE_KEY) => StoreError::DuplicateKey {
            collection: collection.to_string(),
            index: duplicate_index_name(&message).unwrap_or("unknown").to_string(),
        },
        Some(NAMESPACE_NOT_FOUND) => StoreError::NamespaceNotFound(collection.to_string()),
        Some(NAMESPACE_EXISTS) => StoreError::NamespaceExists(collection.to_string()),
        _ => StoreError::Storage(message),
    }
}

/// Index name from an `E11000 ... index: <name> dup key: ...` message
fn duplicate_index_name(message: &str) -> Option<&str> {
    let (_, rest) = message.split_once("index: ")?;
    rest.split_whitespace().next()
}
