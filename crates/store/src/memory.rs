//! Process-local in-memory document store.

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::sync::broadcast;

use crate::document::{Document, FieldValue, Fields};
use crate::error::StoreError;
use crate::store::{DocumentStore, StoreEvent, StoreEventKind};

const WATCH_CHANNEL_CAPACITY: usize = 256;

/// In-memory [`DocumentStore`] backed by a concurrent map, used by tests
/// and single-node deployments.
pub struct MemoryStore {
    documents: DashMap<String, Fields>,
    events: broadcast::Sender<StoreEvent>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(WATCH_CHANNEL_CAPACITY);
        Self {
            documents: DashMap::new(),
            events,
        }
    }

    fn notify(&self, path: &str, kind: StoreEventKind) {
        // Dropped silently when nobody watches.
        let _ = self.events.send(StoreEvent {
            path: path.to_string(),
            kind,
        });
    }

    fn document_id(path: &str) -> String {
        path.rsplit('/').next().unwrap_or(path).to_string()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, path: &str) -> Result<Option<Document>, StoreError> {
        Ok(self.documents.get(path).map(|entry| Document {
            id: Self::document_id(path),
            fields: entry.value().clone(),
        }))
    }

    async fn list(&self, collection: &str) -> Result<Vec<Document>, StoreError> {
        let prefix = format!("{collection}/");
        let mut documents: Vec<Document> = self
            .documents
            .iter()
            .filter(|entry| {
                entry
                    .key()
                    .strip_prefix(&prefix)
                    .is_some_and(|rest| !rest.contains('/'))
            })
            .map(|entry| Document {
                id: Self::document_id(entry.key()),
                fields: entry.value().clone(),
            })
            .collect();
        documents.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(documents)
    }

    async fn create(&self, path: &str, fields: Fields) -> Result<(), StoreError> {
        match self.documents.entry(path.to_string()) {
            Entry::Occupied(_) => return Err(StoreError::AlreadyExists(path.to_string())),
            Entry::Vacant(slot) => {
                // Delete sentinels mark cleared fields; storing them
                // verbatim would corrupt later reads.
                slot.insert(
                    fields
                        .into_iter()
                        .filter(|(_, value)| !matches!(value, FieldValue::Delete))
                        .collect(),
                );
            }
        }
        self.notify(path, StoreEventKind::Written);
        Ok(())
    }

    async fn merge(&self, path: &str, fields: Fields) -> Result<(), StoreError> {
        {
            let mut entry = self.documents.entry(path.to_string()).or_default();
            for (name, value) in fields {
                if matches!(value, FieldValue::Delete) {
                    entry.remove(&name);
                } else {
                    entry.insert(name, value);
                }
            }
        }
        self.notify(path, StoreEventKind::Written);
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<(), StoreError> {
        if self.documents.remove(path).is_some() {
            self.notify(path, StoreEventKind::Deleted);
        }
        Ok(())
    }

    fn watch(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn fields(pairs: &[(&str, FieldValue)]) -> Fields {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect::<BTreeMap<_, _>>()
    }

    #[tokio::test]
    async fn test_create_then_get_round_trip() {
        let store = MemoryStore::new();
        store
            .create("customers/c1/projects/p1", fields(&[("name", "Plant A".into())]))
            .await
            .unwrap();

        let doc = store.get("customers/c1/projects/p1").await.unwrap().unwrap();
        assert_eq!(doc.id, "p1");
        assert_eq!(doc.get("name").and_then(FieldValue::as_str), Some("Plant A"));
    }

    #[tokio::test]
    async fn test_create_strips_delete_sentinels() {
        let store = MemoryStore::new();
        store
            .create(
                "a/b",
                fields(&[("keep", "x".into()), ("cleared", FieldValue::Delete)]),
            )
            .await
            .unwrap();

        let doc = store.get("a/b").await.unwrap().unwrap();
        assert_eq!(doc.get("keep").and_then(FieldValue::as_str), Some("x"));
        assert!(doc.get("cleared").is_none());
    }

    #[tokio::test]
    async fn test_create_rejects_existing_document() {
        let store = MemoryStore::new();
        store.create("a/b", Fields::new()).await.unwrap();
        assert!(matches!(
            store.create("a/b", Fields::new()).await,
            Err(StoreError::AlreadyExists(_))
        ));
    }

    #[tokio::test]
    async fn test_merge_updates_and_deletes_fields() {
        let store = MemoryStore::new();
        store
            .create(
                "a/b",
                fields(&[("keep", "x".into()), ("drop", "y".into())]),
            )
            .await
            .unwrap();
        store
            .merge(
                "a/b",
                fields(&[("keep", "z".into()), ("drop", FieldValue::Delete)]),
            )
            .await
            .unwrap();

        let doc = store.get("a/b").await.unwrap().unwrap();
        assert_eq!(doc.get("keep").and_then(FieldValue::as_str), Some("z"));
        assert!(doc.get("drop").is_none());
    }

    #[tokio::test]
    async fn test_list_returns_only_direct_children() {
        let store = MemoryStore::new();
        store
            .create("customers/c1/projects/p1", Fields::new())
            .await
            .unwrap();
        store
            .create("customers/c1/projects/p2", Fields::new())
            .await
            .unwrap();
        store
            .create("customers/c1/projects/p1/phases/ph1", Fields::new())
            .await
            .unwrap();

        let docs = store.list("customers/c1/projects").await.unwrap();
        let ids: Vec<&str> = docs.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, ["p1", "p2"]);
    }

    #[tokio::test]
    async fn test_watch_sees_writes_and_deletes() {
        let store = MemoryStore::new();
        let mut watcher = store.watch();

        store.create("a/b", Fields::new()).await.unwrap();
        store.delete("a/b").await.unwrap();
        // Deleting again is a no-op and emits nothing.
        store.delete("a/b").await.unwrap();

        let first = watcher.recv().await.unwrap();
        assert_eq!(first.kind, StoreEventKind::Written);
        let second = watcher.recv().await.unwrap();
        assert_eq!(second.kind, StoreEventKind::Deleted);
        assert!(watcher.try_recv().is_err());
    }
}
