//! Document storage seam
//!
//! The applier and seeder are written against [`DocumentStore`]; production
//! runs use [`MongoStore`], tests use [`MemoryStore`].

mod backend;
mod errors;
mod memory;
mod mongo;

pub use backend::{CollectionValidator, DocumentStore, UpdateOutcome};
pub use errors::{StoreError, StoreResult};
pub use memory::{MemoryStore, Operation};
pub use mongo::MongoStore;
