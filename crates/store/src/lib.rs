//! Document-store persistence for Buildtrack.
//!
//! The external store is a document database: collections of documents
//! addressed by slash-separated paths, with merge-style partial updates.
//! This crate owns the wire codec (date strings, literal status names,
//! composite department keys), the path layout, a process-local in-memory
//! store used by tests and single-node deployments, and the repositories
//! that drive the core business logic against the store.

pub mod codec;
pub mod document;
pub mod error;
pub mod ledgers;
pub mod memory;
pub mod paths;
pub mod repositories;
pub mod store;

pub use document::{Document, FieldValue, Fields};
pub use error::StoreError;
pub use memory::MemoryStore;
pub use store::DocumentStore;
