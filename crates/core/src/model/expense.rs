//! Expense entity.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use buildtrack_shared::types::{ExpenseId, PhaseId, ProjectId, UserId};

/// Decision state of an expense.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpenseStatus {
    /// Submitted, not yet decided. Contributes nothing to spent totals.
    Pending,
    /// Approved; counted into the ledger.
    Approved,
    /// Rejected; no ledger effect.
    Rejected,
}

impl ExpenseStatus {
    /// Returns the wire name of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    /// Parses a status from its wire name.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }
}

/// A submitted expense against a project.
///
/// `department` carries the raw wire key (composite or legacy bare name).
/// Expenses that are anonymous or whose department does not match any live
/// department are aggregated under the synthetic "Other Expenses" bucket
/// and excluded from per-department totals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Expense {
    /// Unique identifier.
    pub id: ExpenseId,
    /// Owning project.
    pub project_id: ProjectId,
    /// Phase the expense is booked against, if any.
    pub phase_id: Option<PhaseId>,
    /// Raw department wire key (composite or bare name).
    pub department: String,
    /// Expense amount, strictly positive.
    pub amount: Decimal,
    /// Decision state.
    pub status: ExpenseStatus,
    /// Anonymous submissions bypass department attribution.
    pub is_anonymous: bool,
    /// Business date the cost belongs to (not the creation timestamp).
    pub business_date: NaiveDate,
    /// User who submitted the expense.
    pub submitted_by: Option<UserId>,
    /// Store-native creation timestamp.
    pub created_at: DateTime<Utc>,
    /// When the expense was decided.
    pub decided_at: Option<DateTime<Utc>>,
    /// Who decided the expense.
    pub decided_by: Option<UserId>,
}

impl Expense {
    /// Returns true while the expense awaits a decision.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        matches!(self.status, ExpenseStatus::Pending)
    }

    /// Returns true if the expense counts toward spent totals.
    #[must_use]
    pub const fn is_approved(&self) -> bool {
        matches!(self.status, ExpenseStatus::Approved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_wire_names() {
        assert_eq!(ExpenseStatus::Pending.as_str(), "pending");
        assert_eq!(ExpenseStatus::parse("approved"), Some(ExpenseStatus::Approved));
        assert_eq!(ExpenseStatus::parse("void"), None);
    }
}
