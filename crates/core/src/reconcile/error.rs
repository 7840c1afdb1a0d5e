//! Reconciliation error types.

use thiserror::Error;

use buildtrack_shared::types::ExpenseId;

use crate::model::ExpenseStatus;

/// Expense reconciliation errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReconcileError {
    /// Decisions apply only to pending expenses; reversals go through the
    /// dedicated reversal path.
    #[error("Expense {expense_id} is not pending (currently {status:?})")]
    NotPending {
        /// The expense that was targeted.
        expense_id: ExpenseId,
        /// Its current status.
        status: ExpenseStatus,
    },

    /// Pending is not a decision target.
    #[error("Expense {0} cannot be decided back to pending")]
    PendingNotADecision(ExpenseId),

    /// A batch item referenced an expense that could not be loaded.
    #[error("Expense {0} was not found")]
    Missing(ExpenseId),

    /// Reversals only move between decided states.
    #[error("Expense {expense_id} cannot be reversed from {from:?} to {to:?}")]
    InvalidReversal {
        /// The expense that was targeted.
        expense_id: ExpenseId,
        /// Status before.
        from: ExpenseStatus,
        /// Requested status.
        to: ExpenseStatus,
    },
}
