//! Project entity and status definitions.

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use buildtrack_shared::types::{CustomerId, ProjectId, UserId};

/// Project lifecycle status.
///
/// Persisted as the literal variant name (`ACTIVE`, `LOCKED`, ...).
/// `Suspended` is an overlay: a suspended project displays this status while
/// `is_suspended` is set, independent of the status it would otherwise carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProjectStatus {
    /// Planned start date is in the future.
    Locked,
    /// Work in progress.
    Active,
    /// Awaiting review before activation.
    InReview,
    /// Rejected during review.
    Declined,
    /// Handed over.
    Completed,
    /// In the post-handover maintenance window.
    Maintenance,
    /// Suspended overlay status.
    Suspended,
    /// Archived.
    Archive,
    /// Parked without a schedule.
    Standby,
}

impl ProjectStatus {
    /// Returns the literal wire name of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Locked => "LOCKED",
            Self::Active => "ACTIVE",
            Self::InReview => "IN_REVIEW",
            Self::Declined => "DECLINED",
            Self::Completed => "COMPLETED",
            Self::Maintenance => "MAINTENANCE",
            Self::Suspended => "SUSPENDED",
            Self::Archive => "ARCHIVE",
            Self::Standby => "STANDBY",
        }
    }

    /// Parses a status from its literal wire name.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "LOCKED" => Some(Self::Locked),
            "ACTIVE" => Some(Self::Active),
            "IN_REVIEW" => Some(Self::InReview),
            "DECLINED" => Some(Self::Declined),
            "COMPLETED" => Some(Self::Completed),
            "MAINTENANCE" => Some(Self::Maintenance),
            "SUSPENDED" => Some(Self::Suspended),
            "ARCHIVE" => Some(Self::Archive),
            "STANDBY" => Some(Self::Standby),
            _ => None,
        }
    }

    /// Returns true for the pre-active states during which the handover
    /// baseline still tracks the handover date.
    #[must_use]
    pub const fn is_pre_active(self) -> bool {
        matches!(self, Self::Locked | Self::InReview)
    }
}

impl std::fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Origin of the initial handover date baseline.
///
/// The baseline records the original handover commitment. It tracks the
/// handover date only while the project is pre-active (`LOCKED`/`IN_REVIEW`)
/// and is frozen once the project leaves those states, so the inheritance
/// rule is auditable instead of implicit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HandoverBaseline {
    /// No baseline recorded yet.
    Unset,
    /// Mirrored from the handover date while the project was pre-active.
    Inherited {
        /// The handover date the baseline was copied from.
        from: NaiveDate,
    },
    /// Set directly, independent of the handover date.
    Explicit(NaiveDate),
}

impl HandoverBaseline {
    /// Returns the baseline date, if any.
    #[must_use]
    pub const fn date(self) -> Option<NaiveDate> {
        match self {
            Self::Unset => None,
            Self::Inherited { from } => Some(from),
            Self::Explicit(d) => Some(d),
        }
    }
}

/// A production/construction project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    /// Unique identifier.
    pub id: ProjectId,
    /// Customer workspace the project belongs to.
    pub customer_id: CustomerId,
    /// Project name.
    pub name: String,
    /// Current status.
    pub status: ProjectStatus,
    /// Planned start date.
    pub planned_date: Option<NaiveDate>,
    /// Agreed handover date.
    pub handover_date: Option<NaiveDate>,
    /// Original handover commitment baseline.
    pub handover_baseline: HandoverBaseline,
    /// End of the maintenance window.
    pub maintenance_date: Option<NaiveDate>,
    /// Suspension overlay flag. Implies `status == Suspended` and a
    /// non-empty suspension reason.
    pub is_suspended: bool,
    /// Date the project was suspended.
    pub suspended_date: Option<NaiveDate>,
    /// Reason given at suspension time.
    pub suspension_reason: Option<String>,
    /// Status the project carried before suspension, restored on unsuspend.
    /// Absent on legacy records.
    pub status_before_suspension: Option<ProjectStatus>,
    /// Assigned manager, at most one.
    pub manager_id: Option<UserId>,
    /// Team members.
    pub team_member_ids: BTreeSet<UserId>,
    /// Temporary approver standing in for the manager.
    pub temp_approver_id: Option<UserId>,
    /// Estimated total budget at signing, used by delay correlation.
    pub estimated_budget: Decimal,
    /// Store-native creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Store-native last-update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Project {
    /// Creates a new project in `LOCKED` status.
    #[must_use]
    pub fn new(customer_id: CustomerId, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: ProjectId::new(),
            customer_id,
            name: name.into(),
            status: ProjectStatus::Locked,
            planned_date: None,
            handover_date: None,
            handover_baseline: HandoverBaseline::Unset,
            maintenance_date: None,
            is_suspended: false,
            suspended_date: None,
            suspension_reason: None,
            status_before_suspension: None,
            manager_id: None,
            team_member_ids: BTreeSet::new(),
            temp_approver_id: None,
            estimated_budget: Decimal::ZERO,
            created_at: now,
            updated_at: now,
        }
    }

    /// The status shown to users: the suspension overlay wins while set.
    #[must_use]
    pub const fn display_status(&self) -> ProjectStatus {
        if self.is_suspended {
            ProjectStatus::Suspended
        } else {
            self.status
        }
    }

    /// Checks the suspension invariant: `is_suspended` implies suspended
    /// status and a non-empty trimmed reason.
    #[must_use]
    pub fn suspension_invariant_holds(&self) -> bool {
        if !self.is_suspended {
            return true;
        }
        self.status == ProjectStatus::Suspended
            && self
                .suspension_reason
                .as_deref()
                .is_some_and(|r| !r.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_wire_names_round_trip() {
        for status in [
            ProjectStatus::Locked,
            ProjectStatus::Active,
            ProjectStatus::InReview,
            ProjectStatus::Declined,
            ProjectStatus::Completed,
            ProjectStatus::Maintenance,
            ProjectStatus::Suspended,
            ProjectStatus::Archive,
            ProjectStatus::Standby,
        ] {
            assert_eq!(ProjectStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(ProjectStatus::parse("UNKNOWN"), None);
    }

    #[test]
    fn test_in_review_wire_name() {
        assert_eq!(ProjectStatus::InReview.as_str(), "IN_REVIEW");
    }

    #[test]
    fn test_display_status_overlay() {
        let mut project = Project::new(CustomerId::from("c1"), "Plant A");
        project.status = ProjectStatus::Suspended;
        project.is_suspended = true;
        project.suspension_reason = Some("funding hold".into());
        assert_eq!(project.display_status(), ProjectStatus::Suspended);
        assert!(project.suspension_invariant_holds());
    }

    #[test]
    fn test_suspension_invariant_requires_reason() {
        let mut project = Project::new(CustomerId::from("c1"), "Plant A");
        project.is_suspended = true;
        project.status = ProjectStatus::Suspended;
        project.suspension_reason = Some("   ".into());
        assert!(!project.suspension_invariant_holds());
    }
}
