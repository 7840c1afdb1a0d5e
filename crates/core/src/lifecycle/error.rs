//! Lifecycle error types.

use thiserror::Error;

use crate::model::ProjectStatus;

/// Lifecycle-related errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LifecycleError {
    /// Suspension requires a non-empty trimmed reason.
    #[error("Suspension requires a non-empty reason")]
    EmptySuspensionReason,

    /// The project is already suspended.
    #[error("Project is already suspended")]
    AlreadySuspended,

    /// The project is not suspended.
    #[error("Project is not suspended")]
    NotSuspended,

    /// The status is not reachable as a manual choice from the current one.
    #[error("Status {to} cannot be chosen manually from {from}")]
    ManualTargetNotAllowed {
        /// Current status.
        from: ProjectStatus,
        /// Requested status.
        to: ProjectStatus,
    },

    /// Suspension goes through the dedicated suspend action, never a plain
    /// status change.
    #[error("Suspension must use the dedicated suspend action")]
    SuspendViaStatusChange,

    /// The months-from-handover shortcut needs a handover date.
    #[error("Project has no handover date to offset from")]
    NoHandoverDate,

    /// Projects in this status cannot be deleted.
    #[error("Projects in status {0} cannot be deleted")]
    DeletionBlockedByStatus(ProjectStatus),

    /// Projects with open (approved or pending) expenses cannot be deleted.
    #[error("Project still has {0} open expense(s)")]
    DeletionBlockedByExpenses(usize),
}
