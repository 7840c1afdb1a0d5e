//! Project repository: lifecycle, dates, suspension, deletion.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use tracing::info;

use buildtrack_shared::types::{CustomerId, ProjectId};
use buildtrack_shared::{AppError, AppResult};

use buildtrack_core::events::DomainEvent;
use buildtrack_core::lifecycle::{
    HandoverEffect, LifecycleError, LifecycleMachine, StatusPolicy, TransitionPlan,
};
use buildtrack_core::model::{Expense, Phase, Project, ProjectStatus};

use crate::codec;
use crate::paths;

use super::StoreContext;

/// Result of a status change request.
///
/// A transition whose rules would move dates is returned unapplied, with
/// the affected field names for the confirmation prompt; nothing is
/// written until the caller retries with confirmation.
#[derive(Debug, Clone)]
pub enum StatusChangeOutcome {
    /// The plan moves dates and was not confirmed. No writes happened.
    NeedsConfirmation {
        /// The unapplied plan.
        plan: TransitionPlan,
        /// Display names of the fields the plan would change.
        changed_fields: Vec<&'static str>,
    },
    /// The transition was applied and persisted.
    Applied(TransitionPlan),
}

/// Repository for project documents.
pub struct ProjectRepository {
    ctx: Arc<StoreContext>,
}

impl ProjectRepository {
    /// Creates the repository.
    #[must_use]
    pub const fn new(ctx: Arc<StoreContext>) -> Self {
        Self { ctx }
    }

    /// Creates a project in `LOCKED` status.
    pub async fn create(
        &self,
        name: &str,
        estimated_budget: Decimal,
    ) -> AppResult<Project> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::Validation("project name must not be empty".into()));
        }
        if estimated_budget < Decimal::ZERO {
            return Err(AppError::Validation(
                "estimated budget must not be negative".into(),
            ));
        }

        let mut project = Project::new(CustomerId::from(self.ctx.customer_id.as_str()), name);
        project.estimated_budget = estimated_budget;
        self.persist(&mut project).await?;
        info!(project = %project.id, name, "project created");
        Ok(project)
    }

    /// Loads a project.
    pub async fn get(&self, project_id: &ProjectId) -> AppResult<Project> {
        load_project(&self.ctx, project_id).await
    }

    /// Lists all projects in the workspace.
    pub async fn list(&self) -> AppResult<Vec<Project>> {
        let collection = paths::projects(&self.ctx.customer_id);
        let mut projects = Vec::new();
        for doc in self.ctx.store.list(&collection).await.map_err(AppError::from)? {
            let path = format!("{collection}/{}", doc.id);
            projects.push(codec::decode_project(&doc.id, &doc.fields, &path)?);
        }
        Ok(projects)
    }

    /// Manual status choices from the project's current status.
    pub async fn status_targets(&self, project_id: &ProjectId) -> AppResult<Vec<ProjectStatus>> {
        let project = load_project(&self.ctx, project_id).await?;
        Ok(LifecycleMachine::manual_status_targets(&project))
    }

    /// Requests a manual status change.
    ///
    /// When the transition's rules would move dates and `confirmed` is
    /// false, returns [`StatusChangeOutcome::NeedsConfirmation`] without
    /// writing anything. Otherwise the status and every cascaded date
    /// mutation are persisted together.
    pub async fn change_status(
        &self,
        project_id: &ProjectId,
        target: ProjectStatus,
        confirmed: bool,
        today: NaiveDate,
    ) -> AppResult<StatusChangeOutcome> {
        let _guard = self.ctx.locks.acquire(project_id).await;

        let mut project = load_project(&self.ctx, project_id).await?;
        let mut phases = load_phases(&self.ctx, project_id).await?;

        LifecycleMachine::ensure_manual_target(&project, target).map_err(business)?;
        let plan = LifecycleMachine::plan_transition(&project, &phases, target, today)
            .map_err(business)?;

        if plan.requires_confirmation() && !confirmed {
            let changed_fields = plan.changed_field_names();
            return Ok(StatusChangeOutcome::NeedsConfirmation {
                plan,
                changed_fields,
            });
        }

        let from = project.status;
        LifecycleMachine::apply_transition(&mut project, &mut phases, &plan);
        self.persist(&mut project).await?;
        for change in &plan.phase_changes {
            if let Some(phase) = phases.iter().find(|p| p.id == change.phase_id) {
                persist_phase(&self.ctx, project_id, phase).await?;
            }
        }

        self.ctx.events.publish(DomainEvent::StatusChanged {
            project_id: project_id.clone(),
            from,
            to: plan.to,
        });
        info!(project = %project_id, %from, to = %plan.to, "status changed");
        Ok(StatusChangeOutcome::Applied(plan))
    }

    /// Sets the planned start date; the planned-date rule derives the
    /// status.
    pub async fn set_planned_date(
        &self,
        project_id: &ProjectId,
        date: NaiveDate,
        today: NaiveDate,
    ) -> AppResult<Project> {
        let _guard = self.ctx.locks.acquire(project_id).await;
        let mut project = load_project(&self.ctx, project_id).await?;
        let from = project.status;
        let to = LifecycleMachine::set_planned_date(&mut project, date, today, StatusPolicy::Apply);
        self.persist(&mut project).await?;
        if from != to {
            self.ctx.events.publish(DomainEvent::StatusChanged {
                project_id: project_id.clone(),
                from,
                to,
            });
        }
        Ok(project)
    }

    /// Sets the handover date, applying the baseline mirror and
    /// maintenance push cascades.
    pub async fn set_handover_date(
        &self,
        project_id: &ProjectId,
        date: NaiveDate,
        today: NaiveDate,
    ) -> AppResult<(Project, HandoverEffect)> {
        let _guard = self.ctx.locks.acquire(project_id).await;
        let mut project = load_project(&self.ctx, project_id).await?;
        let from = project.status;
        let effect = LifecycleMachine::set_handover_date(&mut project, date, today);
        self.persist(&mut project).await?;
        if let Some(to) = effect.new_status
            && from != to
        {
            self.ctx.events.publish(DomainEvent::StatusChanged {
                project_id: project_id.clone(),
                from,
                to,
            });
        }
        Ok((project, effect))
    }

    /// Sets the maintenance date, applying the status promotion rule.
    pub async fn set_maintenance_date(
        &self,
        project_id: &ProjectId,
        date: NaiveDate,
        today: NaiveDate,
    ) -> AppResult<Project> {
        let _guard = self.ctx.locks.acquire(project_id).await;
        let mut project = load_project(&self.ctx, project_id).await?;
        let from = project.status;
        let promoted = LifecycleMachine::set_maintenance_date(&mut project, date, today);
        self.persist(&mut project).await?;
        if let Some(to) = promoted
            && from != to
        {
            self.ctx.events.publish(DomainEvent::StatusChanged {
                project_id: project_id.clone(),
                from,
                to,
            });
        }
        Ok(project)
    }

    /// Sets the maintenance date N months after the handover date.
    pub async fn set_maintenance_months_from_handover(
        &self,
        project_id: &ProjectId,
        months: u32,
        today: NaiveDate,
    ) -> AppResult<Project> {
        let _guard = self.ctx.locks.acquire(project_id).await;
        let mut project = load_project(&self.ctx, project_id).await?;
        LifecycleMachine::set_maintenance_months_from_handover(&mut project, months, today)
            .map_err(business)?;
        self.persist(&mut project).await?;
        Ok(project)
    }

    /// Suspends the project with a reason.
    pub async fn suspend(
        &self,
        project_id: &ProjectId,
        reason: &str,
        today: NaiveDate,
    ) -> AppResult<Project> {
        let _guard = self.ctx.locks.acquire(project_id).await;
        let mut project = load_project(&self.ctx, project_id).await?;
        let from = project.status;
        LifecycleMachine::suspend(&mut project, reason, today).map_err(business)?;
        self.persist(&mut project).await?;
        self.ctx.events.publish(DomainEvent::StatusChanged {
            project_id: project_id.clone(),
            from,
            to: ProjectStatus::Suspended,
        });
        info!(project = %project_id, "project suspended");
        Ok(project)
    }

    /// Lifts a suspension, restoring the pre-suspension status.
    pub async fn unsuspend(&self, project_id: &ProjectId, today: NaiveDate) -> AppResult<Project> {
        let _guard = self.ctx.locks.acquire(project_id).await;
        let mut project = load_project(&self.ctx, project_id).await?;
        let restored = LifecycleMachine::unsuspend(&mut project, today).map_err(business)?;
        self.persist(&mut project).await?;
        self.ctx.events.publish(DomainEvent::StatusChanged {
            project_id: project_id.clone(),
            from: ProjectStatus::Suspended,
            to: restored,
        });
        info!(project = %project_id, restored = %restored, "project unsuspended");
        Ok(project)
    }

    /// Deletes a project and all its sub-collections.
    ///
    /// Blocked unless the status allows deletion and no pending or
    /// approved expenses remain.
    pub async fn delete(&self, project_id: &ProjectId) -> AppResult<()> {
        let _guard = self.ctx.locks.acquire(project_id).await;
        let project = load_project(&self.ctx, project_id).await?;

        let expenses = load_expenses(&self.ctx, project_id).await?;
        let open = expenses
            .iter()
            .filter(|e| e.is_pending() || e.is_approved())
            .count();
        LifecycleMachine::can_delete(&project, open).map_err(business)?;

        // Phase sub-collections go first, then the phases themselves.
        let phases = load_phases(&self.ctx, project_id).await?;
        let mut collections = Vec::with_capacity(3 * phases.len() + 2);
        for phase in &phases {
            collections.push(paths::departments(&self.ctx.customer_id, project_id, &phase.id));
            collections.push(paths::requests(&self.ctx.customer_id, project_id, &phase.id));
            collections.push(paths::changes(&self.ctx.customer_id, project_id, &phase.id));
        }
        collections.push(paths::phases(&self.ctx.customer_id, project_id));
        collections.push(paths::expenses(&self.ctx.customer_id, project_id));
        for collection in collections {
            for doc in self.ctx.store.list(&collection).await.map_err(AppError::from)? {
                self.ctx
                    .store
                    .delete(&format!("{collection}/{}", doc.id))
                    .await
                    .map_err(AppError::from)?;
            }
        }
        self.ctx
            .store
            .delete(&paths::project(&self.ctx.customer_id, project_id))
            .await
            .map_err(AppError::from)?;
        self.ctx.ledgers.evict(project_id);
        info!(project = %project_id, "project deleted");
        Ok(())
    }

    async fn persist(&self, project: &mut Project) -> AppResult<()> {
        project.updated_at = Utc::now();
        let path = paths::project(&self.ctx.customer_id, &project.id);
        self.ctx
            .store
            .merge(&path, codec::encode_project(project))
            .await
            .map_err(AppError::from)
    }
}

pub(super) fn business(err: LifecycleError) -> AppError {
    AppError::BusinessRule(err.to_string())
}

pub(super) async fn load_project(
    ctx: &StoreContext,
    project_id: &ProjectId,
) -> AppResult<Project> {
    let path = paths::project(&ctx.customer_id, project_id);
    let doc = ctx
        .store
        .get(&path)
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| AppError::NotFound(path.clone()))?;
    Ok(codec::decode_project(&doc.id, &doc.fields, &path)?)
}

pub(super) async fn load_phases(
    ctx: &StoreContext,
    project_id: &ProjectId,
) -> AppResult<Vec<Phase>> {
    let collection = paths::phases(&ctx.customer_id, project_id);
    let mut phases = Vec::new();
    for doc in ctx.store.list(&collection).await.map_err(AppError::from)? {
        let path = format!("{collection}/{}", doc.id);
        phases.push(codec::decode_phase(&doc.id, project_id, &doc.fields, &path)?);
    }
    phases.sort_by_key(|p| p.sequence);
    Ok(phases)
}

pub(super) async fn load_expenses(
    ctx: &StoreContext,
    project_id: &ProjectId,
) -> AppResult<Vec<Expense>> {
    let collection = paths::expenses(&ctx.customer_id, project_id);
    let mut expenses = Vec::new();
    for doc in ctx.store.list(&collection).await.map_err(AppError::from)? {
        let path = format!("{collection}/{}", doc.id);
        expenses.push(codec::decode_expense(&doc.id, project_id, &doc.fields, &path)?);
    }
    Ok(expenses)
}

pub(super) async fn persist_phase(
    ctx: &StoreContext,
    project_id: &ProjectId,
    phase: &Phase,
) -> AppResult<()> {
    let path = paths::phase(&ctx.customer_id, project_id, &phase.id);
    ctx.store
        .merge(&path, codec::encode_phase(phase))
        .await
        .map_err(AppError::from)
}
