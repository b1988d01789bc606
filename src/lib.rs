//! triage-db - bootstrap utilities for the clinical triage document store
//!
//! Declares the persisted collections (`patients`, `triage_entries`,
//! `system_metadata`), their validators and indexes, reconciles them against
//! a live MongoDB database, and seeds sample data.

pub mod applier;
pub mod cli;
pub mod config;
pub mod index;
pub mod model;
pub mod schema;
pub mod seed;
pub mod store;
