//! # Document Store Trait

use std::future::Future;

use bson::{Bson, Document};

use super::errors::StoreResult;
use crate::index::IndexSpec;
use crate::schema::{Schema, ValidationLevel};

/// Validator attached to a collection
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionValidator {
    pub schema: Schema,
    pub level: ValidationLevel,
}

impl CollectionValidator {
    /// Rejects only type/required violations of declared fields, on inserts
    /// and on updates to documents that were already valid
    pub fn moderate(schema: Schema) -> Self {
        Self {
            schema,
            level: ValidationLevel::Moderate,
        }
    }

    /// The `{ $jsonSchema: ... }` document the storage engine enforces
    pub fn document(&self) -> Document {
        self.schema.to_validator()
    }
}

/// Result of a single-document update
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateOutcome {
    pub matched: u64,
    pub modified: u64,
    /// Identity of the inserted document when the update upserted
    pub upserted_id: Option<Bson>,
}

/// Backend trait for document storage.
///
/// One value is one acquired connection/session; `close` releases it.
pub trait DocumentStore: Send + Sync {
    /// Target database name
    fn database_name(&self) -> &str;

    /// Names of existing collections
    fn list_collection_names(&self) -> impl Future<Output = StoreResult<Vec<String>>> + Send;

    /// Create a collection with a validator attached
    fn create_collection(
        &self,
        name: &str,
        validator: &CollectionValidator,
    ) -> impl Future<Output = StoreResult<()>> + Send;

    /// Replace the validator of an existing collection
    fn modify_validator(
        &self,
        name: &str,
        validator: &CollectionValidator,
    ) -> impl Future<Output = StoreResult<()>> + Send;

    /// The validator document currently enforced, if any
    fn collection_validator(
        &self,
        name: &str,
    ) -> impl Future<Output = StoreResult<Option<Document>>> + Send;

    /// Declare indexes; existing identical indexes are left untouched
    fn create_indexes(
        &self,
        collection: &str,
        indexes: &[IndexSpec],
    ) -> impl Future<Output = StoreResult<()>> + Send;

    /// Indexes present on a collection
    fn list_indexes(
        &self,
        collection: &str,
    ) -> impl Future<Output = StoreResult<Vec<IndexSpec>>> + Send;

    /// Insert documents in order; returns their identities in input order
    fn insert_many(
        &self,
        collection: &str,
        documents: Vec<Document>,
    ) -> impl Future<Output = StoreResult<Vec<Bson>>> + Send;

    /// First document matching `filter`
    fn find_one(
        &self,
        collection: &str,
        filter: Document,
    ) -> impl Future<Output = StoreResult<Option<Document>>> + Send;

    /// Apply an operator update to the first match, optionally upserting
    fn update_one(
        &self,
        collection: &str,
        filter: Document,
        update: Document,
        upsert: bool,
    ) -> impl Future<Output = StoreResult<UpdateOutcome>> + Send;

    /// Delete every match; returns the number removed
    fn delete_many(
        &self,
        collection: &str,
        filter: Document,
    ) -> impl Future<Output = StoreResult<u64>> + Send;

    /// Number of matching documents
    fn count_documents(
        &self,
        collection: &str,
        filter: Document,
    ) -> impl Future<Output = StoreResult<u64>> + Send;

    /// Release the connection
    fn close(self) -> impl Future<Output = ()> + Send
    where
        Self: Sized;
}
