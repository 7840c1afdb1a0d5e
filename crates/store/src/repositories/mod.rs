//! Store-backed repositories driving the core business logic.
//!
//! Every mutation acquires the project's writer lock first, so at most
//! one mutation per project is in flight at a time. Reads are lock-free.

use std::sync::Arc;

use buildtrack_core::events::EventBus;
use buildtrack_core::sync::ProjectLocks;

use crate::ledgers::ProjectLedgers;
use crate::store::DocumentStore;

pub mod expense;
pub mod phase;
pub mod project;
pub mod snapshot;

pub use expense::{ExpenseRepository, NewExpense};
pub use phase::PhaseRepository;
pub use project::{ProjectRepository, StatusChangeOutcome};
pub use snapshot::SnapshotLoader;

/// Shared state behind all repositories: the store handle, the customer
/// scope, per-project writer locks, live ledgers, and the event bus.
pub struct StoreContext {
    /// Backend document store.
    pub store: Arc<dyn DocumentStore>,
    /// Customer workspace all paths are scoped under.
    pub customer_id: String,
    /// Per-project writer locks.
    pub locks: ProjectLocks,
    /// Live per-project ledgers.
    pub ledgers: ProjectLedgers,
    /// Domain event bus.
    pub events: EventBus,
}

impl StoreContext {
    /// Creates a context over a store for one customer workspace.
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>, customer_id: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            store,
            customer_id: customer_id.into(),
            locks: ProjectLocks::new(),
            ledgers: ProjectLedgers::new(),
            events: EventBus::new(),
        })
    }
}
