//! Reconciliation outcome types.

use std::collections::BTreeMap;

use buildtrack_shared::types::ExpenseId;

use crate::ledger::{ReconciliationWarning, Totals};
use crate::model::ExpenseStatus;

use super::error::ReconcileError;

/// Outcome of a single expense decision or reversal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecisionOutcome {
    /// The expense that was decided.
    pub expense_id: ExpenseId,
    /// Status before.
    pub from: ExpenseStatus,
    /// Status after.
    pub to: ExpenseStatus,
    /// True when the delta went to the synthetic Other Expenses bucket
    /// (anonymous expense or no matching live department).
    pub routed_to_other: bool,
    /// Clamp warnings raised while applying the deltas.
    pub warnings: Vec<ReconciliationWarning>,
}

/// Per-item result of a batch decision. One item's failure never rolls
/// back its siblings.
#[derive(Debug, Clone)]
pub struct BatchItemOutcome {
    /// The expense the item targeted.
    pub expense_id: ExpenseId,
    /// The item's individual result.
    pub result: Result<DecisionOutcome, ReconcileError>,
}

/// Aggregate result of a batch decision.
///
/// The totals are recalculated exactly once after the whole batch has been
/// applied, not once per item.
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    /// Per-item outcomes, in input order.
    pub items: Vec<BatchItemOutcome>,
    /// Project totals after the batch.
    pub project_totals: Totals,
    /// Department totals across phases after the batch.
    pub department_totals: BTreeMap<String, Totals>,
}

impl BatchOutcome {
    /// Number of items that applied successfully.
    #[must_use]
    pub fn applied_count(&self) -> usize {
        self.items.iter().filter(|i| i.result.is_ok()).count()
    }

    /// Number of items that failed.
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.items.len() - self.applied_count()
    }
}
