//! In-process document store
//!
//! Reproduces the storage-engine behaviour the bootstrap utilities rely on:
//! moderate validation, unique indexes (the implicit `_id_` included),
//! idempotent named index creation and the update operators the seeder
//! issues. Handles obtained through [`MemoryStore::connect`] share state, so
//! a later invocation observes what an earlier one wrote.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bson::oid::ObjectId;
use bson::{doc, Bson, DateTime, Document};
use tracing::debug;

use super::backend::{CollectionValidator, DocumentStore, UpdateOutcome};
use super::errors::{StoreError, StoreResult};
use crate::index::IndexSpec;
use crate::schema::{SchemaValidator, ValidationLevel};

const ID_INDEX: &str = "_id_";

/// Store operation, used to target injected failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    ListCollections,
    CreateCollection,
    ModifyValidator,
    CreateIndexes,
    ListIndexes,
    Insert,
    Find,
    Update,
    Delete,
    Count,
}

#[derive(Debug)]
struct MemoryCollection {
    validator: Option<CollectionValidator>,
    indexes: Vec<IndexSpec>,
    documents: Vec<Document>,
}

impl MemoryCollection {
    fn new(validator: Option<CollectionValidator>) -> Self {
        Self {
            validator,
            indexes: vec![IndexSpec::named(ID_INDEX).asc("_id")],
            documents: Vec::new(),
        }
    }
}

#[derive(Debug)]
struct InjectedFailure {
    operation: Operation,
    collection: Option<String>,
    error: StoreError,
}

#[derive(Debug, Default)]
struct State {
    collections: BTreeMap<String, MemoryCollection>,
    failures: Vec<InjectedFailure>,
}

impl State {
    /// Consumes the first injected failure targeting this call, if any
    fn take_failure(&mut self, operation: Operation, collection: &str) -> StoreResult<()> {
        let position = self.failures.iter().position(|f| {
            f.operation == operation && f.collection.as_deref().map_or(true, |c| c == collection)
        });
        match position {
            Some(i) => Err(self.failures.remove(i).error),
            None => Ok(()),
        }
    }

    fn collection_mut(&mut self, name: &str) -> &mut MemoryCollection {
        self.collections
            .entry(name.to_string())
            .or_insert_with(|| MemoryCollection::new(None))
    }
}

/// Document store held in process memory
#[derive(Debug)]
pub struct MemoryStore {
    database: String,
    state: Arc<Mutex<State>>,
    open: Arc<AtomicUsize>,
}

impl MemoryStore {
    /// Creates an empty database and returns the first handle to it
    pub fn new(database: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            state: Arc::new(Mutex::new(State::default())),
            open: Arc::new(AtomicUsize::new(1)),
        }
    }

    /// Opens another handle on the same database
    pub fn connect(&self) -> Self {
        self.open.fetch_add(1, Ordering::SeqCst);
        Self {
            database: self.database.clone(),
            state: Arc::clone(&self.state),
            open: Arc::clone(&self.open),
        }
    }

    /// Number of handles not yet closed
    pub fn open_connections(&self) -> usize {
        self.open.load(Ordering::SeqCst)
    }

    /// Makes the next matching call fail with `error`.
    ///
    /// `collection: None` matches the operation on any collection.
    pub fn fail_next(&self, operation: Operation, collection: Option<&str>, error: StoreError) {
        self.state().failures.push(InjectedFailure {
            operation,
            collection: collection.map(str::to_string),
            error,
        });
    }

    /// Snapshot of a collection's documents in insertion order
    pub fn documents(&self, collection: &str) -> Vec<Document> {
        self.state()
            .collections
            .get(collection)
            .map(|c| c.documents.clone())
            .unwrap_or_default()
    }

    /// Validation level of a collection's validator
    pub fn validation_level(&self, collection: &str) -> Option<ValidationLevel> {
        self.state()
            .collections
            .get(collection)
            .and_then(|c| c.validator.as_ref())
            .map(|v| v.level)
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl DocumentStore for MemoryStore {
    fn database_name(&self) -> &str {
        &self.database
    }

    async fn list_collection_names(&self) -> StoreResult<Vec<String>> {
        let mut state = self.state();
        state.take_failure(Operation::ListCollections, "")?;
        Ok(state.collections.keys().cloned().collect())
    }

    async fn create_collection(&self, name: &str, validator: &CollectionValidator) -> StoreResult<()> {
        let mut state = self.state();
        state.take_failure(Operation::CreateCollection, name)?;
        if state.collections.contains_key(name) {
            return Err(StoreError::NamespaceExists(name.to_string()));
        }
        state
            .collections
            .insert(name.to_string(), MemoryCollection::new(Some(validator.clone())));
        debug!(collection = name, "created collection");
        Ok(())
    }

    async fn modify_validator(&self, name: &str, validator: &CollectionValidator) -> StoreResult<()> {
        let mut state = self.state();
        state.take_failure(Operation::ModifyValidator, name)?;
        let coll = state
            .collections
            .get_mut(name)
            .ok_or_else(|| StoreError::NamespaceNotFound(name.to_string()))?;
        // Existing documents are not re-validated
        coll.validator = Some(validator.clone());
        Ok(())
    }

    async fn collection_validator(&self, name: &str) -> StoreResult<Option<Document>> {
        let state = self.state();
        Ok(state
            .collections
            .get(name)
            .and_then(|c| c.validator.as_ref())
            .map(CollectionValidator::document))
    }

    async fn create_indexes(&self, collection: &str, indexes: &[IndexSpec]) -> StoreResult<()> {
        let mut state = self.state();
        state.take_failure(Operation::CreateIndexes, collection)?;
        let coll = state.collection_mut(collection);

        let conflict = |message: String| StoreError::ValidationConflict {
            collection: collection.to_string(),
            message,
        };

        let mut pending: Vec<IndexSpec> = Vec::new();
        for spec in indexes {
            spec.validate()
                .map_err(|e| StoreError::Storage(e.message().to_string()))?;

            let mut present = coll.indexes.iter().chain(pending.iter());
            if let Some(message) = present.clone().find_map(|existing| spec.conflict_with(existing)) {
                return Err(conflict(message));
            }
            if present.clone().any(|existing| existing.name == spec.name) {
                continue;
            }
            if spec.is_text() {
                if let Some(other) = present.find(|existing| existing.is_text()) {
                    return Err(conflict(format!(
                        "only one full-text index is allowed; '{}' already exists",
                        other.name
                    )));
                }
            }
            if spec.unique && has_duplicate_keys(&coll.documents, spec) {
                return Err(StoreError::DuplicateKey {
                    collection: collection.to_string(),
                    index: spec.name.clone(),
                });
            }
            pending.push(spec.clone());
        }

        for spec in &pending {
            debug!(collection, index = %spec.name, "created index");
        }
        coll.indexes.extend(pending);
        Ok(())
    }

    async fn list_indexes(&self, collection: &str) -> StoreResult<Vec<IndexSpec>> {
        let mut state = self.state();
        state.take_failure(Operation::ListIndexes, collection)?;
        state
            .collections
            .get(collection)
            .map(|c| c.indexes.clone())
            .ok_or_else(|| StoreError::NamespaceNotFound(collection.to_string()))
    }

    async fn insert_many(&self, collection: &str, documents: Vec<Document>) -> StoreResult<Vec<Bson>> {
        let mut state = self.state();
        state.take_failure(Operation::Insert, collection)?;
        let coll = state.collection_mut(collection);

        // Ordered: a failure leaves earlier documents in place
        let mut ids = Vec::with_capacity(documents.len());
        for document in documents {
            let document = with_id(document);
            validate(collection, coll.validator.as_ref(), &document)?;
            check_unique(collection, coll, &document, None)?;
            ids.push(document.get("_id").cloned().unwrap_or(Bson::Null));
            coll.documents.push(document);
        }
        Ok(ids)
    }

    async fn find_one(&self, collection: &str, filter: Document) -> StoreResult<Option<Document>> {
        check_filter(&filter)?;
        let mut state = self.state();
        state.take_failure(Operation::Find, collection)?;
        Ok(state
            .collections
            .get(collection)
            .and_then(|c| c.documents.iter().find(|d| matches(d, &filter)))
            .cloned())
    }

    async fn update_one(
        &self,
        collection: &str,
        filter: Document,
        update: Document,
        upsert: bool,
    ) -> StoreResult<UpdateOutcome> {
        check_filter(&filter)?;
        check_update(&update)?;
        let mut state = self.state();
        state.take_failure(Operation::Update, collection)?;
        if !upsert && !state.collections.contains_key(collection) {
            return Ok(UpdateOutcome::default());
        }
        let coll = state.collection_mut(collection);

        match coll.documents.iter().position(|d| matches(d, &filter)) {
            Some(i) => {
                let before = &coll.documents[i];
                let mut after = before.clone();
                apply_update(&mut after, &update, false)?;
                if after.get("_id") != before.get("_id") {
                    return Err(StoreError::Storage("the '_id' field is immutable".into()));
                }

                let enforce = match coll.validator.as_ref().map(|v| v.level) {
                    Some(ValidationLevel::Strict) => true,
                    Some(ValidationLevel::Moderate) => {
                        validate(collection, coll.validator.as_ref(), before).is_ok()
                    }
                    Some(ValidationLevel::Off) | None => false,
                };
                if enforce {
                    validate(collection, coll.validator.as_ref(), &after)?;
                }
                check_unique(collection, coll, &after, Some(i))?;

                let modified = after != *before;
                coll.documents[i] = after;
                Ok(UpdateOutcome {
                    matched: 1,
                    modified: u64::from(modified),
                    upserted_id: None,
                })
            }
            None if upsert => {
                let mut document = upsert_base(&filter)?;
                apply_update(&mut document, &update, true)?;
                let document = with_id(document);
                validate(collection, coll.validator.as_ref(), &document)?;
                check_unique(collection, coll, &document, None)?;

                let id = document.get("_id").cloned();
                coll.documents.push(document);
                Ok(UpdateOutcome {
                    matched: 0,
                    modified: 0,
                    upserted_id: id,
                })
            }
            None => Ok(UpdateOutcome::default()),
        }
    }

    async fn delete_many(&self, collection: &str, filter: Document) -> StoreResult<u64> {
        check_filter(&filter)?;
        let mut state = self.state();
        state.take_failure(Operation::Delete, collection)?;
        let Some(coll) = state.collections.get_mut(collection) else {
            return Ok(0);
        };
        let before = coll.documents.len();
        coll.documents.retain(|d| !matches(d, &filter));
        Ok((before - coll.documents.len()) as u64)
    }

    async fn count_documents(&self, collection: &str, filter: Document) -> StoreResult<u64> {
        check_filter(&filter)?;
        let mut state = self.state();
        state.take_failure(Operation::Count, collection)?;
        Ok(state
            .collections
            .get(collection)
            .map(|c| c.documents.iter().filter(|d| matches(d, &filter)).count())
            .unwrap_or(0) as u64)
    }

    async fn close(self) {
        self.open.fetch_sub(1, Ordering::SeqCst);
        debug!(database = %self.database, "memory store handle closed");
    }
}

fn with_id(document: Document) -> Document {
    if document.contains_key("_id") {
        return document;
    }
    let mut out = doc! { "_id": ObjectId::new() };
    for (key, value) in document {
        out.insert(key, value);
    }
    out
}

fn validate(
    collection: &str,
    validator: Option<&CollectionValidator>,
    document: &Document,
) -> StoreResult<()> {
    let Some(validator) = validator else {
        return Ok(());
    };
    if validator.level == ValidationLevel::Off {
        return Ok(());
    }
    SchemaValidator::new(&validator.schema)
        .validate_document(document)
        .map_err(|e| StoreError::DocumentValidation {
            collection: collection.to_string(),
            reason: e.message().to_string(),
        })
}

fn check_unique(
    collection: &str,
    coll: &MemoryCollection,
    document: &Document,
    skip: Option<usize>,
) -> StoreResult<()> {
    let duplicate = |index: &str| StoreError::DuplicateKey {
        collection: collection.to_string(),
        index: index.to_string(),
    };
    let id = document.get("_id");

    for (i, other) in coll.documents.iter().enumerate() {
        if Some(i) == skip {
            continue;
        }
        if other.get("_id") == id {
            return Err(duplicate(ID_INDEX));
        }
        for index in coll.indexes.iter().filter(|ix| ix.unique) {
            if index_key(index, other) == index_key(index, document) {
                return Err(duplicate(&index.name));
            }
        }
    }
    Ok(())
}

/// Key tuple of a document under an index; missing fields index as null
fn index_key(index: &IndexSpec, document: &Document) -> Vec<Bson> {
    index
        .fields()
        .map(|field| lookup(document, field).unwrap_or(Bson::Null))
        .collect()
}

fn has_duplicate_keys(documents: &[Document], index: &IndexSpec) -> bool {
    let mut seen: Vec<Vec<Bson>> = Vec::with_capacity(documents.len());
    for document in documents {
        let key = index_key(index, document);
        if seen.contains(&key) {
            return true;
        }
        seen.push(key);
    }
    false
}

/// Resolves a dotted path; traversing an array collects the matches.
fn lookup(document: &Document, path: &str) -> Option<Bson> {
    let (head, rest) = match path.split_once('.') {
        Some((head, rest)) => (head, Some(rest)),
        None => (path, None),
    };
    let value = document.get(head)?;
    let Some(rest) = rest else {
        return Some(value.clone());
    };
    match value {
        Bson::Document(inner) => lookup(inner, rest),
        Bson::Array(items) => {
            let found: Vec<Bson> = items
                .iter()
                .filter_map(|item| match item {
                    Bson::Document(inner) => lookup(inner, rest),
                    _ => None,
                })
                .collect();
            (!found.is_empty()).then_some(Bson::Array(found))
        }
        _ => None,
    }
}

fn is_operator_document(document: &Document) -> bool {
    document.keys().next().is_some_and(|k| k.starts_with('$'))
}

const QUERY_OPERATORS: [&str; 4] = ["$eq", "$ne", "$in", "$exists"];

fn check_filter(filter: &Document) -> StoreResult<()> {
    for (path, condition) in filter {
        if path.starts_with('$') {
            return Err(StoreError::Storage(format!("unsupported top-level operator '{}'", path)));
        }
        let Bson::Document(ops) = condition else {
            continue;
        };
        if !is_operator_document(ops) {
            continue;
        }
        for (op, arg) in ops {
            if !QUERY_OPERATORS.contains(&op.as_str()) {
                return Err(StoreError::Storage(format!("unsupported query operator '{}'", op)));
            }
            if op == "$in" && !matches!(arg, Bson::Array(_)) {
                return Err(StoreError::Storage("$in needs an array".into()));
            }
        }
    }
    Ok(())
}

fn matches(document: &Document, filter: &Document) -> bool {
    filter.iter().all(|(path, condition)| {
        let value = lookup(document, path);
        match condition {
            Bson::Document(ops) if is_operator_document(ops) => {
                ops.iter().all(|(op, arg)| match op.as_str() {
                    "$eq" => equals(value.as_ref(), arg),
                    "$ne" => !equals(value.as_ref(), arg),
                    "$in" => match arg {
                        Bson::Array(candidates) => {
                            candidates.iter().any(|c| equals(value.as_ref(), c))
                        }
                        _ => false,
                    },
                    "$exists" => value.is_some() == truthy(arg),
                    _ => false,
                })
            }
            expected => equals(value.as_ref(), expected),
        }
    })
}

fn equals(value: Option<&Bson>, expected: &Bson) -> bool {
    match value {
        None => matches!(expected, Bson::Null),
        Some(Bson::Array(items)) if !matches!(expected, Bson::Array(_)) => {
            items.iter().any(|item| same_value(item, expected))
        }
        Some(actual) => same_value(actual, expected),
    }
}

fn same_value(a: &Bson, b: &Bson) -> bool {
    match (as_f64(a), as_f64(b)) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}

fn as_f64(value: &Bson) -> Option<f64> {
    match value {
        Bson::Int32(v) => Some(f64::from(*v)),
        Bson::Int64(v) => Some(*v as f64),
        Bson::Double(v) => Some(*v),
        _ => None,
    }
}

fn truthy(value: &Bson) -> bool {
    match value {
        Bson::Boolean(b) => *b,
        Bson::Null => false,
        other => as_f64(other).map_or(true, |v| v != 0.0),
    }
}

const UPDATE_OPERATORS: [&str; 5] = ["$set", "$setOnInsert", "$unset", "$inc", "$currentDate"];

/// Rejects replacement documents, unknown operators and overlapping paths.
fn check_update(update: &Document) -> StoreResult<()> {
    if update.is_empty() || !is_operator_document(update) {
        return Err(StoreError::Storage("update document must use update operators".into()));
    }

    let mut paths: Vec<&str> = Vec::new();
    for (op, fields) in update {
        if !UPDATE_OPERATORS.contains(&op.as_str()) {
            return Err(StoreError::Storage(format!("unsupported update operator '{}'", op)));
        }
        let Bson::Document(fields) = fields else {
            return Err(StoreError::Storage(format!("'{}' expects a document", op)));
        };
        for path in fields.keys() {
            if let Some(other) = paths.iter().find(|p| paths_overlap(p, path)) {
                return Err(StoreError::Storage(format!(
                    "updating the path '{}' would create a conflict at '{}'",
                    path, other
                )));
            }
            paths.push(path);
        }
    }
    Ok(())
}

fn paths_overlap(a: &str, b: &str) -> bool {
    let nested = |outer: &str, inner: &str| {
        inner
            .strip_prefix(outer)
            .is_some_and(|rest| rest.starts_with('.'))
    };
    a == b || nested(a, b) || nested(b, a)
}

fn apply_update(target: &mut Document, update: &Document, inserting: bool) -> StoreResult<()> {
    let now = DateTime::now();
    for (op, fields) in update {
        let Bson::Document(fields) = fields else {
            continue;
        };
        for (path, value) in fields {
            match op.as_str() {
                "$set" => set_path(target, path, value.clone())?,
                "$setOnInsert" if inserting => set_path(target, path, value.clone())?,
                "$setOnInsert" => {}
                "$unset" => remove_path(target, path),
                "$inc" => {
                    let next = increment(lookup(target, path), value, path)?;
                    set_path(target, path, next)?;
                }
                "$currentDate" => set_path(target, path, Bson::DateTime(now))?,
                other => {
                    return Err(StoreError::Storage(format!("unsupported update operator '{}'", other)))
                }
            }
        }
    }
    Ok(())
}

/// Seeds an upserted document with the filter's equality conditions
fn upsert_base(filter: &Document) -> StoreResult<Document> {
    let mut base = Document::new();
    for (path, condition) in filter {
        match condition {
            Bson::Document(ops) if is_operator_document(ops) => {
                if let Some(value) = ops.get("$eq") {
                    set_path(&mut base, path, value.clone())?;
                }
            }
            value => set_path(&mut base, path, value.clone())?,
        }
    }
    Ok(base)
}

fn set_path(target: &mut Document, path: &str, value: Bson) -> StoreResult<()> {
    let Some((head, rest)) = path.split_once('.') else {
        target.insert(path, value);
        return Ok(());
    };
    let child = target
        .entry(head.to_string())
        .or_insert_with(|| Bson::Document(Document::new()));
    match child {
        Bson::Document(inner) => set_path(inner, rest, value),
        _ => Err(StoreError::Storage(format!(
            "cannot create field '{}' in non-document '{}'",
            rest, head
        ))),
    }
}

fn remove_path(target: &mut Document, path: &str) {
    match path.split_once('.') {
        None => {
            target.remove(path);
        }
        Some((head, rest)) => {
            if let Some(Bson::Document(inner)) = target.get_mut(head) {
                remove_path(inner, rest);
            }
        }
    }
}

fn checked_long(a: i64, b: i64, path: &str) -> StoreResult<i64> {
    a.checked_add(b).ok_or_else(|| {
        StoreError::Storage(format!("$inc on field '{}' overflows a 64-bit integer", path))
    })
}

fn increment(current: Option<Bson>, by: &Bson, path: &str) -> StoreResult<Bson> {
    let current = current.unwrap_or(Bson::Int32(0));
    let sum = match (&current, by) {
        (Bson::Int32(a), Bson::Int32(b)) => a
            .checked_add(*b)
            .map(Bson::Int32)
            .unwrap_or(Bson::Int64(i64::from(*a) + i64::from(*b))),
        (Bson::Int32(a), Bson::Int64(b)) => Bson::Int64(checked_long(i64::from(*a), *b, path)?),
        (Bson::Int64(a), Bson::Int32(b)) => Bson::Int64(checked_long(*a, i64::from(*b), path)?),
        (Bson::Int64(a), Bson::Int64(b)) => Bson::Int64(checked_long(*a, *b, path)?),
        (a, b) => match (as_f64(a), as_f64(b)) {
            (Some(x), Some(y)) => Bson::Double(x + y),
            _ => {
                return Err(StoreError::Storage(format!(
                    "cannot apply $inc to non-numeric field '{}'",
                    path
                )))
            }
        },
    };
    Ok(sum)
}
