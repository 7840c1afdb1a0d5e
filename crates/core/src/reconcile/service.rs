//! The expense reconciler.

use chrono::{DateTime, Utc};
use tracing::debug;

use buildtrack_shared::types::UserId;

use crate::ledger::{BudgetLedger, ReconciliationWarning};
use crate::model::{Expense, ExpenseStatus};

use super::error::ReconcileError;
use super::types::{BatchItemOutcome, BatchOutcome, DecisionOutcome};

/// Stateless service applying expense status transitions into the ledger.
pub struct ExpenseReconciler;

impl ExpenseReconciler {
    /// Decides a pending expense.
    ///
    /// Approval applies `+amount` at the expense's (phase, department);
    /// rejection has no ledger effect (pending never contributed).
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError::NotPending`] unless the expense is
    /// pending, and [`ReconcileError::PendingNotADecision`] for a pending
    /// target. Reversals go through [`Self::reverse`].
    pub fn decide(
        ledger: &mut BudgetLedger,
        expense: &mut Expense,
        to: ExpenseStatus,
        decided_by: Option<UserId>,
        now: DateTime<Utc>,
    ) -> Result<DecisionOutcome, ReconcileError> {
        if to == ExpenseStatus::Pending {
            return Err(ReconcileError::PendingNotADecision(expense.id.clone()));
        }
        if expense.status != ExpenseStatus::Pending {
            return Err(ReconcileError::NotPending {
                expense_id: expense.id.clone(),
                status: expense.status,
            });
        }

        let mut warnings = Vec::new();
        let mut routed_to_other = false;
        if to == ExpenseStatus::Approved {
            let (routed, warning) = Self::apply_effect(ledger, expense, expense.amount);
            routed_to_other = routed;
            warnings.extend(warning);
        }

        let from = expense.status;
        expense.status = to;
        expense.decided_at = Some(now);
        expense.decided_by = decided_by;

        debug!(expense = %expense.id, ?from, ?to, routed_to_other, "expense decided");
        Ok(DecisionOutcome {
            expense_id: expense.id.clone(),
            from,
            to,
            routed_to_other,
            warnings,
        })
    }

    /// Reverses a decided expense (approved -> rejected or vice versa).
    ///
    /// Expressed as a compensating pair: the old status's effect is undone
    /// first, then the new status's effect is applied. Never a direct
    /// overwrite, so a partial failure leaves the ledger recoverable
    /// rather than double-counted.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError::InvalidReversal`] unless both sides are
    /// decided states and differ.
    pub fn reverse(
        ledger: &mut BudgetLedger,
        expense: &mut Expense,
        to: ExpenseStatus,
        decided_by: Option<UserId>,
        now: DateTime<Utc>,
    ) -> Result<DecisionOutcome, ReconcileError> {
        let from = expense.status;
        let decided = |s: ExpenseStatus| {
            matches!(s, ExpenseStatus::Approved | ExpenseStatus::Rejected)
        };
        if !decided(from) || !decided(to) || from == to {
            return Err(ReconcileError::InvalidReversal {
                expense_id: expense.id.clone(),
                from,
                to,
            });
        }

        let mut warnings = Vec::new();
        let mut routed_to_other = false;

        // Compensating leg: undo what the old status contributed.
        if from == ExpenseStatus::Approved {
            let (routed, warning) = Self::apply_effect(ledger, expense, -expense.amount);
            routed_to_other |= routed;
            warnings.extend(warning);
        }
        // Forward leg: apply what the new status contributes.
        if to == ExpenseStatus::Approved {
            let (routed, warning) = Self::apply_effect(ledger, expense, expense.amount);
            routed_to_other |= routed;
            warnings.extend(warning);
        }

        expense.status = to;
        expense.decided_at = Some(now);
        expense.decided_by = decided_by;

        debug!(expense = %expense.id, ?from, ?to, "expense decision reversed");
        Ok(DecisionOutcome {
            expense_id: expense.id.clone(),
            from,
            to,
            routed_to_other,
            warnings,
        })
    }

    /// Decides a batch of pending expenses.
    ///
    /// Items apply independently: one failure never rolls back siblings.
    /// The project and department totals are recalculated exactly once
    /// after the full batch, not per item.
    pub fn decide_batch(
        ledger: &mut BudgetLedger,
        expenses: &mut [Expense],
        to: ExpenseStatus,
        decided_by: Option<UserId>,
        now: DateTime<Utc>,
    ) -> BatchOutcome {
        let items = expenses
            .iter_mut()
            .map(|expense| BatchItemOutcome {
                expense_id: expense.id.clone(),
                result: Self::decide(ledger, expense, to, decided_by.clone(), now),
            })
            .collect();

        // Single aggregate pass for the whole batch.
        BatchOutcome {
            items,
            project_totals: ledger.project_totals(),
            department_totals: ledger.department_totals_across_phases(),
        }
    }

    /// Routes a signed delta into the ledger: the expense's (phase,
    /// department) when it matches a live department, otherwise the
    /// synthetic Other Expenses bucket.
    fn apply_effect(
        ledger: &mut BudgetLedger,
        expense: &Expense,
        delta: rust_decimal::Decimal,
    ) -> (bool, Option<ReconciliationWarning>) {
        let target = expense.phase_id.as_ref().filter(|phase_id| {
            !expense.is_anonymous && ledger.has_department(phase_id, &expense.department)
        });

        match target {
            Some(phase_id) => {
                let phase_id = phase_id.clone();
                (
                    false,
                    ledger.apply_expense_delta(&phase_id, &expense.department, delta),
                )
            }
            None => (true, ledger.apply_other_delta(delta)),
        }
    }
}
