//! Lifecycle transition types.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use buildtrack_shared::types::{PhaseId, ProjectId};

use crate::model::ProjectStatus;

/// A project or phase date field touched by a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateField {
    /// Planned start date.
    Planned,
    /// Handover date.
    Handover,
    /// Maintenance window end.
    Maintenance,
    /// A phase start date.
    PhaseStart,
    /// A phase end date.
    PhaseEnd,
}

impl DateField {
    /// Human-readable field name, presented to the caller when asking for
    /// confirmation.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Planned => "planned date",
            Self::Handover => "handover date",
            Self::Maintenance => "maintenance date",
            Self::PhaseStart => "phase start date",
            Self::PhaseEnd => "phase end date",
        }
    }
}

/// A project-level date mutation a transition would apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateChange {
    /// The field being changed.
    pub field: DateField,
    /// Current value, if any.
    pub from: Option<NaiveDate>,
    /// Value after the transition.
    pub to: NaiveDate,
}

/// A phase-level date mutation from the COMPLETED cascade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseDateChange {
    /// The phase being adjusted.
    pub phase_id: PhaseId,
    /// The field being changed.
    pub field: DateField,
    /// Current value.
    pub from: NaiveDate,
    /// Value after the transition.
    pub to: NaiveDate,
}

/// A planned status transition and the date mutations that accompany it.
///
/// The plan is applied atomically: status write and every listed mutation
/// land together or not at all. A plan with any date change must be
/// confirmed by the caller before application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionPlan {
    /// The project being transitioned.
    pub project_id: ProjectId,
    /// Status before.
    pub from: ProjectStatus,
    /// Status after.
    pub to: ProjectStatus,
    /// Project-level date mutations.
    pub date_changes: Vec<DateChange>,
    /// Phase-level date mutations (COMPLETED cascade).
    pub phase_changes: Vec<PhaseDateChange>,
}

impl TransitionPlan {
    /// True when the caller must confirm before the plan may be applied.
    #[must_use]
    pub fn requires_confirmation(&self) -> bool {
        !self.date_changes.is_empty() || !self.phase_changes.is_empty()
    }

    /// Deduplicated display names of the fields the plan would change,
    /// presented to the caller for confirmation.
    #[must_use]
    pub fn changed_field_names(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self
            .date_changes
            .iter()
            .map(|c| c.field.display_name())
            .chain(self.phase_changes.iter().map(|c| c.field.display_name()))
            .collect();
        names.sort_unstable();
        names.dedup();
        names
    }
}

/// Whether a field setter may write the status it derives.
///
/// The planned-date rule computes a status candidate; some call sites
/// intentionally suppress the assignment, so this is a policy hook rather
/// than a hard rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusPolicy {
    /// Write the derived status to the project.
    Apply,
    /// Compute the candidate but leave the status untouched.
    Suppress,
}

/// Summary of the side effects of a handover-date write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HandoverEffect {
    /// Status the write promoted the project to, if any.
    pub new_status: Option<ProjectStatus>,
    /// Maintenance date pushed to handover + 1 month, if it was passed.
    pub maintenance_pushed_to: Option<NaiveDate>,
    /// True when the baseline mirrored the write (pre-active states only).
    pub baseline_mirrored: bool,
}
