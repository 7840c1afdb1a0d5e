//! Expense decision reconciliation.
//!
//! Applies expense status transitions as signed deltas into the budget
//! ledger instead of recomputing from the full expense set. Reversals are
//! compensating pairs, never overwrites, so a partial failure leaves the
//! ledger in a recoverable intermediate state.

pub mod error;
pub mod service;
pub mod types;

#[cfg(test)]
mod tests;

pub use error::ReconcileError;
pub use service::ExpenseReconciler;
pub use types::{BatchItemOutcome, BatchOutcome, DecisionOutcome};
