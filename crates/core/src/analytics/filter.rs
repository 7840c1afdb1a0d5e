//! Analytics filter set.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use buildtrack_shared::types::ProjectId;

use crate::model::{Project, ProjectStatus};

/// Inclusive business-date window the aggregation runs over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    /// First day included.
    pub start: NaiveDate,
    /// Last day included.
    pub end: NaiveDate,
}

impl DateRange {
    /// Creates a range; `start` and `end` are both inclusive.
    #[must_use]
    pub const fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// True when `date` falls inside the range.
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Stable cache key for snapshots loaded over this range.
    #[must_use]
    pub fn cache_key(&self) -> String {
        format!("{}..{}", self.start, self.end)
    }
}

/// The filter set driving one aggregation pass.
///
/// `None` on a dimension means "no restriction". Changing only the date
/// range invalidates the snapshot (the underlying expense query changes);
/// every other dimension is applied in memory over the cached snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyticsFilter {
    /// Restrict to these projects.
    pub project_ids: Option<BTreeSet<ProjectId>>,
    /// Restrict to phases with these names.
    pub stage_names: Option<BTreeSet<String>>,
    /// Restrict expenses to these department names (bare names).
    pub department_names: Option<BTreeSet<String>>,
    /// Restrict to projects displaying these statuses.
    pub statuses: Option<BTreeSet<ProjectStatus>>,
    /// Business-date window.
    pub date_range: DateRange,
}

impl AnalyticsFilter {
    /// Creates an unrestricted filter over `range`.
    #[must_use]
    pub const fn new(range: DateRange) -> Self {
        Self {
            project_ids: None,
            stage_names: None,
            department_names: None,
            statuses: None,
            date_range: range,
        }
    }

    /// True when `project` passes the project-id and status dimensions.
    /// Status is matched against the display status, so suspended projects
    /// match `SUSPENDED` regardless of the status they would otherwise carry.
    #[must_use]
    pub fn matches_project(&self, project: &Project) -> bool {
        if let Some(ids) = &self.project_ids
            && !ids.contains(&project.id)
        {
            return false;
        }
        if let Some(statuses) = &self.statuses
            && !statuses.contains(&project.display_status())
        {
            return false;
        }
        true
    }

    /// True when a phase with this name passes the stage dimension.
    #[must_use]
    pub fn matches_stage(&self, name: &str) -> bool {
        self.stage_names
            .as_ref()
            .is_none_or(|names| names.contains(name))
    }

    /// True when a bare department name passes the department dimension.
    #[must_use]
    pub fn matches_department(&self, name: &str) -> bool {
        self.department_names
            .as_ref()
            .is_none_or(|names| names.contains(name))
    }

    /// True when `other` differs from `self` only in the date range.
    /// Such a change needs a snapshot reload; any other change recomputes
    /// over the cached snapshot.
    #[must_use]
    pub fn is_pure_date_range_change(&self, other: &Self) -> bool {
        self.date_range != other.date_range
            && self.project_ids == other.project_ids
            && self.stage_names == other.stage_names
            && self.department_names == other.department_names
            && self.statuses == other.statuses
    }
}
