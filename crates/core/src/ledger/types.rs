//! Ledger aggregate types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use buildtrack_shared::types::{PhaseId, ProjectId};

/// Budget and spent totals at some granularity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
    /// Allocated budget.
    pub budget: Decimal,
    /// Approved spend.
    pub spent: Decimal,
}

impl Totals {
    /// Creates totals from budget and spent amounts.
    #[must_use]
    pub const fn new(budget: Decimal, spent: Decimal) -> Self {
        Self { budget, spent }
    }

    /// Budget remaining after spend. Negative when over budget.
    #[must_use]
    pub fn remaining(&self) -> Decimal {
        self.budget - self.spent
    }

    /// Utilization percentage (spent / budget * 100), zero when there is
    /// no budget.
    #[must_use]
    pub fn utilization_percent(&self) -> Decimal {
        if self.budget.is_zero() {
            Decimal::ZERO
        } else {
            (self.spent / self.budget * Decimal::ONE_HUNDRED).round_dp(2)
        }
    }
}

impl std::ops::Add for Totals {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            budget: self.budget + rhs.budget,
            spent: self.spent + rhs.spent,
        }
    }
}

impl std::ops::AddAssign for Totals {
    fn add_assign(&mut self, rhs: Self) {
        self.budget += rhs.budget;
        self.spent += rhs.spent;
    }
}

/// Raised when a signed delta would have driven a spent total below zero.
///
/// The total is clamped at zero instead of failing the operation; the
/// warning flags a decision replay or lost update for reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationWarning {
    /// Project the clamped total belongs to.
    pub project_id: ProjectId,
    /// Phase, absent for the Other Expenses bucket.
    pub phase_id: Option<PhaseId>,
    /// Department name, absent for the Other Expenses bucket.
    pub department: Option<String>,
    /// The delta that crossed zero.
    pub attempted_delta: Decimal,
    /// Spent total before the delta was applied.
    pub prior_spent: Decimal,
}

impl std::fmt::Display for ReconciliationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "spent clamped at zero for project {} (phase {:?}, department {:?}): delta {} against prior spent {}",
            self.project_id, self.phase_id, self.department, self.attempted_delta, self.prior_spent
        )
    }
}
