//! Phase, department, and phase-extension types.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use buildtrack_shared::types::{ChangeId, DepartmentId, PhaseId, ProjectId, RequestId};

use super::key::DeptKey;

/// A time-boxed sub-division of a project carrying its own department
/// budgets and date range.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Phase {
    /// Unique identifier.
    pub id: PhaseId,
    /// Owning project.
    pub project_id: ProjectId,
    /// Phase (stage) name, e.g. "Foundation".
    pub name: String,
    /// Ordering within the project.
    pub sequence: u32,
    /// Scheduled start.
    pub start_date: Option<NaiveDate>,
    /// Scheduled end.
    pub end_date: Option<NaiveDate>,
    /// Department budgets keyed by department name.
    pub department_budgets: BTreeMap<String, Decimal>,
    /// Store-native creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Phase {
    /// Sum of all department budgets in this phase.
    #[must_use]
    pub fn total_budget(&self) -> Decimal {
        self.department_budgets.values().copied().sum()
    }

    /// Returns the budget for a department, accepting composite or bare
    /// wire keys.
    #[must_use]
    pub fn department_budget(&self, raw_key: &str) -> Option<Decimal> {
        let key = DeptKey::parse_in_phase(raw_key, &self.id);
        self.department_budgets.get(&key.name).copied()
    }
}

/// A budget category scoped to one phase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Department {
    /// Unique identifier.
    pub id: DepartmentId,
    /// Owning phase.
    pub phase_id: PhaseId,
    /// Department name, unique within the phase.
    pub name: String,
    /// Allocated budget.
    pub total_budget: Decimal,
    /// Contractor-mode flag (externally managed spend).
    pub is_contractor: bool,
}

/// Decision state of a phase extension request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtensionStatus {
    /// Awaiting a decision.
    Pending,
    /// Accepted; the phase end date was moved.
    Approved,
    /// Rejected; no schedule effect.
    Rejected,
}

/// A request to extend a phase's end date.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtensionRequest {
    /// Unique identifier.
    pub id: RequestId,
    /// Phase the extension applies to.
    pub phase_id: PhaseId,
    /// Requested new end date.
    pub requested_end_date: NaiveDate,
    /// Decision state.
    pub status: ExtensionStatus,
    /// Store-native creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl ExtensionRequest {
    /// True once the request has been accepted.
    #[must_use]
    pub const fn is_approved(&self) -> bool {
        matches!(self.status, ExtensionStatus::Approved)
    }
}

/// An immutable change-log entry recording one accepted extension.
///
/// The log is append-only and keyed by request id. `previous_end_date` is
/// the end date recorded immediately prior to that specific request, never
/// the current end date (which may already reflect later extensions).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseChange {
    /// Unique identifier.
    pub id: ChangeId,
    /// Request that produced this change.
    pub request_id: RequestId,
    /// Phase the change applies to.
    pub phase_id: PhaseId,
    /// End date in force immediately before the request was accepted.
    pub previous_end_date: NaiveDate,
    /// End date accepted by the request.
    pub new_end_date: NaiveDate,
    /// Store-native timestamp the change was recorded at.
    pub recorded_at: DateTime<Utc>,
}

impl PhaseChange {
    /// Days this change extended the phase by.
    #[must_use]
    pub fn extended_days(&self) -> i64 {
        (self.new_end_date - self.previous_end_date).num_days()
    }
}
