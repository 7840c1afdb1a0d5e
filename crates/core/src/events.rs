//! Typed domain events.
//!
//! Mutations emit typed events over a broadcast bus; subscribers (the
//! analytics engine, snapshot caches) apply deltas or invalidate on receipt
//! instead of relying on implicit property-change propagation.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tokio::sync::broadcast;

use buildtrack_shared::types::{ExpenseId, PhaseId, ProjectId};

use crate::model::{DeptKey, ExpenseStatus, ProjectStatus};

/// Default capacity of the event channel. Slow subscribers lag rather than
/// block publishers.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// A domain mutation event.
#[derive(Debug, Clone)]
pub enum DomainEvent {
    /// A project's status changed (including suspension transitions).
    StatusChanged {
        /// The project that changed.
        project_id: ProjectId,
        /// Status before the change.
        from: ProjectStatus,
        /// Status after the change.
        to: ProjectStatus,
    },
    /// An expense was decided or its decision was reversed.
    ExpenseDecided {
        /// The expense that was decided.
        expense_id: ExpenseId,
        /// The project the expense belongs to.
        project_id: ProjectId,
        /// Decision state before.
        from: ExpenseStatus,
        /// Decision state after.
        to: ExpenseStatus,
        /// Expense amount.
        amount: Decimal,
    },
    /// A department budget was created or edited.
    BudgetEdited {
        /// The project whose budget changed.
        project_id: ProjectId,
        /// The department key that changed.
        key: DeptKey,
        /// The new budget amount.
        amount: Decimal,
    },
    /// A phase was removed along with its ledger entries.
    PhaseRemoved {
        /// The project the phase belonged to.
        project_id: ProjectId,
        /// The removed phase.
        phase_id: PhaseId,
    },
    /// A phase extension request was accepted.
    ExtensionAccepted {
        /// The project the phase belongs to.
        project_id: ProjectId,
        /// The extended phase.
        phase_id: PhaseId,
        /// The accepted new end date.
        new_end_date: NaiveDate,
    },
}

impl DomainEvent {
    /// The project this event concerns.
    #[must_use]
    pub const fn project_id(&self) -> &ProjectId {
        match self {
            Self::StatusChanged { project_id, .. }
            | Self::ExpenseDecided { project_id, .. }
            | Self::BudgetEdited { project_id, .. }
            | Self::PhaseRemoved { project_id, .. }
            | Self::ExtensionAccepted { project_id, .. } => project_id,
        }
    }
}

/// Broadcast bus for domain events.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<DomainEvent>,
}

impl EventBus {
    /// Creates a bus with the default channel capacity.
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self { sender }
    }

    /// Subscribes to all future events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<DomainEvent> {
        self.sender.subscribe()
    }

    /// Publishes an event. Events published with no live subscribers are
    /// dropped silently.
    pub fn publish(&self, event: DomainEvent) {
        let _ = self.sender.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
