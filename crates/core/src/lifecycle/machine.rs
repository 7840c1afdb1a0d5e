//! Transition rules for the project lifecycle.

use chrono::{Days, NaiveDate};

use buildtrack_shared::types::date::{months_after, yesterday};

use crate::model::{HandoverBaseline, Phase, Project, ProjectStatus};

use super::error::LifecycleError;
use super::types::{
    DateChange, DateField, HandoverEffect, PhaseDateChange, StatusPolicy, TransitionPlan,
};

/// Stateless engine for planning and applying lifecycle transitions.
///
/// All rules take `today` as a parameter; the machine never reads the wall
/// clock itself.
pub struct LifecycleMachine;

impl LifecycleMachine {
    /// Plans a status transition, listing every date mutation the rules
    /// would apply. A plan with any mutation must be confirmed by the
    /// caller before [`Self::apply_transition`]; nothing is mutated here.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::SuspendViaStatusChange`] for a SUSPENDED
    /// target; suspension has a dedicated action.
    pub fn plan_transition(
        project: &Project,
        phases: &[Phase],
        target: ProjectStatus,
        today: NaiveDate,
    ) -> Result<TransitionPlan, LifecycleError> {
        if target == ProjectStatus::Suspended {
            return Err(LifecycleError::SuspendViaStatusChange);
        }

        let from = project.status;
        let mut date_changes = Vec::new();
        let mut phase_changes = Vec::new();

        match target {
            ProjectStatus::Active => {
                // Pull a future planned date back so the change is visible
                // immediately.
                if from == ProjectStatus::Locked
                    && let Some(planned) = project.planned_date
                    && planned > today
                {
                    date_changes.push(DateChange {
                        field: DateField::Planned,
                        from: Some(planned),
                        to: yesterday(today),
                    });
                }
            }
            ProjectStatus::Maintenance => {
                if from == ProjectStatus::Completed {
                    // A fresh maintenance window starts.
                    date_changes.push(DateChange {
                        field: DateField::Maintenance,
                        from: project.maintenance_date,
                        to: months_after(today, 1),
                    });
                } else if let Some(handover) = project.handover_date
                    && handover > today
                {
                    date_changes.push(DateChange {
                        field: DateField::Handover,
                        from: Some(handover),
                        to: yesterday(today),
                    });
                }
            }
            ProjectStatus::Completed => {
                if let Some(handover) = project.handover_date
                    && handover > today
                {
                    date_changes.push(DateChange {
                        field: DateField::Handover,
                        from: Some(handover),
                        to: yesterday(today),
                    });
                }
                if let Some(maintenance) = project.maintenance_date
                    && maintenance > today
                {
                    date_changes.push(DateChange {
                        field: DateField::Maintenance,
                        from: Some(maintenance),
                        to: yesterday(today),
                    });
                }
                // The phase cascade runs for ALL paths into COMPLETED.
                for phase in phases {
                    if let Some(end) = phase.end_date
                        && end > today
                    {
                        phase_changes.push(PhaseDateChange {
                            phase_id: phase.id.clone(),
                            field: DateField::PhaseEnd,
                            from: end,
                            to: yesterday(today),
                        });
                    }
                    if let Some(start) = phase.start_date
                        && start > today
                    {
                        phase_changes.push(PhaseDateChange {
                            phase_id: phase.id.clone(),
                            field: DateField::PhaseStart,
                            from: start,
                            to: today - Days::new(2),
                        });
                    }
                }
            }
            _ => {}
        }

        Ok(TransitionPlan {
            project_id: project.id.clone(),
            from,
            to: target,
            date_changes,
            phase_changes,
        })
    }

    /// Applies a confirmed plan: the status write and every date mutation
    /// land together.
    pub fn apply_transition(project: &mut Project, phases: &mut [Phase], plan: &TransitionPlan) {
        for change in &plan.date_changes {
            match change.field {
                DateField::Planned => project.planned_date = Some(change.to),
                DateField::Handover => project.handover_date = Some(change.to),
                DateField::Maintenance => project.maintenance_date = Some(change.to),
                DateField::PhaseStart | DateField::PhaseEnd => {}
            }
        }
        for change in &plan.phase_changes {
            if let Some(phase) = phases.iter_mut().find(|p| p.id == change.phase_id) {
                match change.field {
                    DateField::PhaseStart => phase.start_date = Some(change.to),
                    DateField::PhaseEnd => phase.end_date = Some(change.to),
                    _ => {}
                }
            }
        }
        project.status = plan.to;
    }

    /// Derives the status candidate for a planned date and writes both,
    /// unless the policy suppresses the status assignment.
    pub fn set_planned_date(
        project: &mut Project,
        date: NaiveDate,
        today: NaiveDate,
        policy: StatusPolicy,
    ) -> ProjectStatus {
        project.planned_date = Some(date);
        let candidate = Self::status_from_planned_date(Some(date), today);
        if policy == StatusPolicy::Apply {
            project.status = candidate;
        }
        candidate
    }

    /// Writes the handover date and applies its cascades.
    ///
    /// While the project is pre-active (`LOCKED`/`IN_REVIEW`) the baseline
    /// mirrors the write and no status change happens. Afterwards the
    /// baseline is frozen; a handover date not in the past promotes the
    /// project to ACTIVE. In both cases a handover passing the maintenance
    /// date pushes maintenance to handover + 1 month.
    pub fn set_handover_date(
        project: &mut Project,
        date: NaiveDate,
        today: NaiveDate,
    ) -> HandoverEffect {
        let mut effect = HandoverEffect::default();
        project.handover_date = Some(date);

        if project.status.is_pre_active() {
            project.handover_baseline = HandoverBaseline::Inherited { from: date };
            effect.baseline_mirrored = true;
        } else if date >= today {
            project.status = ProjectStatus::Active;
            effect.new_status = Some(ProjectStatus::Active);
        }

        if let Some(maintenance) = project.maintenance_date
            && date > maintenance
        {
            let pushed = months_after(date, 1);
            project.maintenance_date = Some(pushed);
            effect.maintenance_pushed_to = Some(pushed);
        }

        effect
    }

    /// Writes the maintenance date and applies the status promotion rule.
    pub fn set_maintenance_date(
        project: &mut Project,
        date: NaiveDate,
        today: NaiveDate,
    ) -> Option<ProjectStatus> {
        project.maintenance_date = Some(date);

        if !project.status.is_pre_active() && date >= today {
            let status = if project.handover_date.is_some_and(|h| h < today) {
                ProjectStatus::Maintenance
            } else {
                ProjectStatus::Active
            };
            project.status = status;
            return Some(status);
        }
        None
    }

    /// Shortcut: set the maintenance date N months after the handover date.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::NoHandoverDate`] when there is no handover
    /// date to offset from.
    pub fn set_maintenance_months_from_handover(
        project: &mut Project,
        months: u32,
        today: NaiveDate,
    ) -> Result<Option<ProjectStatus>, LifecycleError> {
        let handover = project
            .handover_date
            .ok_or(LifecycleError::NoHandoverDate)?;
        Ok(Self::set_maintenance_date(
            project,
            months_after(handover, months),
            today,
        ))
    }

    /// Suspends the project, recording the prior status for restoration.
    ///
    /// # Errors
    ///
    /// Rejects an empty trimmed reason before anything is mutated, and
    /// double suspension.
    pub fn suspend(
        project: &mut Project,
        reason: &str,
        today: NaiveDate,
    ) -> Result<(), LifecycleError> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(LifecycleError::EmptySuspensionReason);
        }
        if project.is_suspended {
            return Err(LifecycleError::AlreadySuspended);
        }

        project.status_before_suspension = Some(project.status);
        project.status = ProjectStatus::Suspended;
        project.is_suspended = true;
        project.suspended_date = Some(today);
        project.suspension_reason = Some(reason.to_string());
        Ok(())
    }

    /// Lifts a suspension.
    ///
    /// Restores the recorded pre-suspension status when present; legacy
    /// records without one fall back to the planned-date rule.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::NotSuspended`] if the project is not
    /// suspended.
    pub fn unsuspend(project: &mut Project, today: NaiveDate) -> Result<ProjectStatus, LifecycleError> {
        if !project.is_suspended {
            return Err(LifecycleError::NotSuspended);
        }

        project.is_suspended = false;
        project.suspended_date = None;
        project.suspension_reason = None;
        let restored = project
            .status_before_suspension
            .take()
            .unwrap_or_else(|| Self::status_from_planned_date(project.planned_date, today));
        project.status = restored;
        Ok(restored)
    }

    /// Manual status choices offered from the current status. Statuses
    /// reached only by automatic rules or dedicated actions are never
    /// offered.
    #[must_use]
    pub fn manual_status_targets(project: &Project) -> Vec<ProjectStatus> {
        let current = project.status;
        let mut targets = vec![
            ProjectStatus::Active,
            ProjectStatus::Completed,
            ProjectStatus::Maintenance,
        ];

        if matches!(
            current,
            ProjectStatus::Completed | ProjectStatus::Maintenance
        ) {
            targets.retain(|s| *s != ProjectStatus::Active);
        }
        if current == ProjectStatus::Locked {
            targets.retain(|s| !matches!(s, ProjectStatus::Completed | ProjectStatus::Maintenance));
        }
        targets.retain(|s| *s != current);
        targets
    }

    /// Ensures a manual status change is allowed from the current status.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::ManualTargetNotAllowed`] otherwise.
    pub fn ensure_manual_target(
        project: &Project,
        target: ProjectStatus,
    ) -> Result<(), LifecycleError> {
        if Self::manual_status_targets(project).contains(&target) {
            Ok(())
        } else {
            Err(LifecycleError::ManualTargetNotAllowed {
                from: project.status,
                to: target,
            })
        }
    }

    /// Checks the deletion precondition: deletable status and no approved
    /// or pending expenses.
    ///
    /// # Errors
    ///
    /// Returns the blocking condition.
    pub fn can_delete(project: &Project, open_expense_count: usize) -> Result<(), LifecycleError> {
        if !matches!(
            project.status,
            ProjectStatus::Locked
                | ProjectStatus::Declined
                | ProjectStatus::InReview
                | ProjectStatus::Active
        ) {
            return Err(LifecycleError::DeletionBlockedByStatus(project.status));
        }
        if open_expense_count > 0 {
            return Err(LifecycleError::DeletionBlockedByExpenses(open_expense_count));
        }
        Ok(())
    }

    /// The planned-date rule: a planned date not in the future means the
    /// project is running.
    #[must_use]
    pub fn status_from_planned_date(planned: Option<NaiveDate>, today: NaiveDate) -> ProjectStatus {
        match planned {
            Some(date) if date <= today => ProjectStatus::Active,
            _ => ProjectStatus::Locked,
        }
    }
}
