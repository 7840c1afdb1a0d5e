//! The document-store interface.

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::document::{Document, Fields};
use crate::error::StoreError;

/// A change notification for one document path.
#[derive(Debug, Clone)]
pub struct StoreEvent {
    /// Path of the document that changed.
    pub path: String,
    /// Kind of change.
    pub kind: StoreEventKind,
}

/// What happened to the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreEventKind {
    /// Created or updated.
    Written,
    /// Deleted.
    Deleted,
}

/// Backend-agnostic document store.
///
/// Documents live at slash-separated paths; a collection is a path prefix
/// one segment above its documents. Writes are merges: present fields are
/// replaced, absent fields are untouched, and the `Delete` sentinel
/// removes a field.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Reads the document at `path`, or `None` if it does not exist.
    async fn get(&self, path: &str) -> Result<Option<Document>, StoreError>;

    /// Lists all documents directly under `collection`.
    async fn list(&self, collection: &str) -> Result<Vec<Document>, StoreError>;

    /// Creates the document at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::AlreadyExists`] if a document is already
    /// there.
    async fn create(&self, path: &str, fields: Fields) -> Result<(), StoreError>;

    /// Merges `fields` into the document at `path`, creating it if absent.
    async fn merge(&self, path: &str, fields: Fields) -> Result<(), StoreError>;

    /// Deletes the document at `path`. Deleting an absent document is not
    /// an error.
    async fn delete(&self, path: &str) -> Result<(), StoreError>;

    /// Subscribes to change notifications for all paths.
    fn watch(&self) -> broadcast::Receiver<StoreEvent>;
}
