//! Per-project writer serialization and snapshot publication.
//!
//! All core mutations are single-writer per project: a transition's
//! multi-field mutation set and a concurrent expense decision must never
//! interleave partially. Ownership is explicit via a sharded lock keyed by
//! project id rather than ambient main-thread semantics.

use std::sync::{Arc, RwLock};

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

use buildtrack_shared::types::ProjectId;

/// Sharded per-project mutation locks.
///
/// Acquiring the lock for a project serializes all writers targeting it;
/// writers for different projects proceed independently.
#[derive(Debug, Default)]
pub struct ProjectLocks {
    locks: DashMap<ProjectId, Arc<Mutex<()>>>,
}

impl ProjectLocks {
    /// Creates an empty lock registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquires the writer lock for a project, creating it on first use.
    pub async fn acquire(&self, project_id: &ProjectId) -> OwnedMutexGuard<()> {
        let lock = self
            .locks
            .entry(project_id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        lock.lock_owned().await
    }
}

/// Copy-on-write published state.
///
/// Writers build a complete replacement value and swap it in; readers take
/// a cheap `Arc` snapshot and see either the pre- or post-mutation state,
/// never a partial one.
#[derive(Debug)]
pub struct Published<T> {
    inner: RwLock<Arc<T>>,
}

impl<T> Published<T> {
    /// Publishes an initial value.
    #[must_use]
    pub fn new(value: T) -> Self {
        Self {
            inner: RwLock::new(Arc::new(value)),
        }
    }

    /// Returns the currently published snapshot.
    ///
    /// # Panics
    ///
    /// Panics if the lock was poisoned by a panicking writer.
    #[must_use]
    pub fn load(&self) -> Arc<T> {
        Arc::clone(&self.inner.read().expect("published state poisoned"))
    }

    /// Atomically replaces the published value.
    ///
    /// # Panics
    ///
    /// Panics if the lock was poisoned by a panicking writer.
    pub fn store(&self, value: T) {
        *self.inner.write().expect("published state poisoned") = Arc::new(value);
    }
}

impl<T: Default> Default for Published<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}
