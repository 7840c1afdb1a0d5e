//! Phase repository: schedules, department budgets, extensions.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use tracing::info;

use buildtrack_shared::types::{ChangeId, DepartmentId, PhaseId, ProjectId, RequestId};
use buildtrack_shared::{AppError, AppResult};

use buildtrack_core::events::DomainEvent;
use buildtrack_core::model::{
    Department, DeptKey, ExtensionRequest, ExtensionStatus, Phase, PhaseChange,
};

use crate::codec;
use crate::paths;

use super::project::{load_phases, load_project, persist_phase};
use super::StoreContext;

/// Repository for phases and their extension workflow.
pub struct PhaseRepository {
    ctx: Arc<StoreContext>,
}

impl PhaseRepository {
    /// Creates the repository.
    #[must_use]
    pub const fn new(ctx: Arc<StoreContext>) -> Self {
        Self { ctx }
    }

    /// Creates a phase under a project.
    pub async fn create(
        &self,
        project_id: &ProjectId,
        name: &str,
        sequence: u32,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> AppResult<Phase> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::Validation("phase name must not be empty".into()));
        }
        if let (Some(start), Some(end)) = (start_date, end_date)
            && end < start
        {
            return Err(AppError::Validation(
                "phase end date must not precede its start date".into(),
            ));
        }

        let _guard = self.ctx.locks.acquire(project_id).await;
        load_project(&self.ctx, project_id).await?;

        let phase = Phase {
            id: PhaseId::new(),
            project_id: project_id.clone(),
            name: name.to_string(),
            sequence,
            start_date,
            end_date,
            department_budgets: std::collections::BTreeMap::new(),
            created_at: Utc::now(),
        };
        persist_phase(&self.ctx, project_id, &phase).await?;
        info!(project = %project_id, phase = %phase.id, name, "phase created");
        Ok(phase)
    }

    /// Lists a project's phases in sequence order.
    pub async fn list(&self, project_id: &ProjectId) -> AppResult<Vec<Phase>> {
        load_phases(&self.ctx, project_id).await
    }

    /// Creates or edits a department budget within a phase. The phase's
    /// budget total follows immediately; spent is untouched.
    pub async fn set_department_budget(
        &self,
        project_id: &ProjectId,
        phase_id: &PhaseId,
        department_name: &str,
        amount: Decimal,
    ) -> AppResult<Phase> {
        let department_name = department_name.trim();
        if department_name.is_empty() {
            return Err(AppError::Validation(
                "department name must not be empty".into(),
            ));
        }
        if amount < Decimal::ZERO {
            return Err(AppError::Validation(
                "department budget must not be negative".into(),
            ));
        }

        let _guard = self.ctx.locks.acquire(project_id).await;
        let mut phase = self.load_phase(project_id, phase_id).await?;
        let key = DeptKey::parse_in_phase(department_name, phase_id);
        phase
            .department_budgets
            .insert(key.name.clone(), amount);
        persist_phase(&self.ctx, project_id, &phase).await?;

        self.ctx
            .ledgers
            .ensure_loaded(self.ctx.store.as_ref(), &self.ctx.customer_id, project_id)
            .await
            .map_err(AppError::from)?;
        self.ctx
            .ledgers
            .with(project_id, |ledger| ledger.set_department_budget(&key, amount))
            .ok_or_else(|| AppError::Internal(format!("no ledger loaded for {project_id}")))?;
        self.mirror_department(project_id, &key, amount).await?;

        self.ctx.events.publish(DomainEvent::BudgetEdited {
            project_id: project_id.clone(),
            key,
            amount,
        });
        Ok(phase)
    }

    /// Removes a department and its aggregates from a phase.
    pub async fn remove_department(
        &self,
        project_id: &ProjectId,
        phase_id: &PhaseId,
        department_name: &str,
    ) -> AppResult<Phase> {
        let _guard = self.ctx.locks.acquire(project_id).await;
        let mut phase = self.load_phase(project_id, phase_id).await?;
        let key = DeptKey::parse_in_phase(department_name, phase_id);
        if phase.department_budgets.remove(&key.name).is_none() {
            return Err(AppError::NotFound(format!(
                "department '{}' in phase {phase_id}",
                key.name
            )));
        }
        persist_phase(&self.ctx, project_id, &phase).await?;
        // A cold ledger recomputes from the store on its next load.
        let _ = self
            .ctx
            .ledgers
            .with(project_id, |ledger| ledger.remove_department(&key));
        let dept_id = DepartmentId::from(key.composite());
        self.ctx
            .store
            .delete(&paths::department(
                &self.ctx.customer_id,
                project_id,
                &key.phase_id,
                &dept_id,
            ))
            .await
            .map_err(AppError::from)?;
        Ok(phase)
    }

    /// Lists a phase's department documents.
    pub async fn list_departments(
        &self,
        project_id: &ProjectId,
        phase_id: &PhaseId,
    ) -> AppResult<Vec<Department>> {
        let collection = paths::departments(&self.ctx.customer_id, project_id, phase_id);
        let mut departments = Vec::new();
        for doc in self.ctx.store.list(&collection).await.map_err(AppError::from)? {
            let path = format!("{collection}/{}", doc.id);
            departments.push(codec::decode_department(&doc.id, &doc.fields, &path)?);
        }
        Ok(departments)
    }

    /// Mirrors a budget edit into the department document, preserving an
    /// existing contractor flag.
    async fn mirror_department(
        &self,
        project_id: &ProjectId,
        key: &DeptKey,
        amount: Decimal,
    ) -> AppResult<()> {
        let dept_id = DepartmentId::from(key.composite());
        let path = paths::department(&self.ctx.customer_id, project_id, &key.phase_id, &dept_id);
        let is_contractor = match self.ctx.store.get(&path).await.map_err(AppError::from)? {
            Some(doc) => codec::decode_department(&doc.id, &doc.fields, &path)?.is_contractor,
            None => false,
        };
        let department = Department {
            id: dept_id,
            phase_id: key.phase_id.clone(),
            name: key.name.clone(),
            total_budget: amount,
            is_contractor,
        };
        self.ctx
            .store
            .merge(&path, codec::encode_department(&department))
            .await
            .map_err(AppError::from)
    }

    /// Removes a phase, its sub-collections, and its ledger entries.
    pub async fn remove(&self, project_id: &ProjectId, phase_id: &PhaseId) -> AppResult<()> {
        let _guard = self.ctx.locks.acquire(project_id).await;
        // Existence check before the delete.
        self.load_phase(project_id, phase_id).await?;
        for collection in [
            paths::departments(&self.ctx.customer_id, project_id, phase_id),
            paths::requests(&self.ctx.customer_id, project_id, phase_id),
            paths::changes(&self.ctx.customer_id, project_id, phase_id),
        ] {
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
            .delete(&paths::phase(&self.ctx.customer_id, project_id, phase_id))
            .await
            .map_err(AppError::from)?;
        let _ = self
            .ctx
            .ledgers
            .with(project_id, |ledger| ledger.remove_phase(phase_id));
        self.ctx.events.publish(DomainEvent::PhaseRemoved {
            project_id: project_id.clone(),
            phase_id: phase_id.clone(),
        });
        info!(project = %project_id, phase = %phase_id, "phase removed");
        Ok(())
    }

    /// Submits a request to extend a phase's end date.
    pub async fn request_extension(
        &self,
        project_id: &ProjectId,
        phase_id: &PhaseId,
        requested_end_date: NaiveDate,
    ) -> AppResult<ExtensionRequest> {
        let _guard = self.ctx.locks.acquire(project_id).await;
        let phase = self.load_phase(project_id, phase_id).await?;
        if let Some(end) = phase.end_date
            && requested_end_date <= end
        {
            return Err(AppError::Validation(format!(
                "requested end date must extend the phase past {end}"
            )));
        }

        let request = ExtensionRequest {
            id: RequestId::new(),
            phase_id: phase_id.clone(),
            requested_end_date,
            status: ExtensionStatus::Pending,
            created_at: Utc::now(),
        };
        let path = paths::request(&self.ctx.customer_id, project_id, phase_id, &request.id);
        self.ctx
            .store
            .merge(&path, codec::encode_request(&request))
            .await
            .map_err(AppError::from)?;
        Ok(request)
    }

    /// Accepts a pending extension: moves the phase end date and appends
    /// an immutable change-log entry recording the end date in force
    /// immediately before this request.
    pub async fn accept_extension(
        &self,
        project_id: &ProjectId,
        phase_id: &PhaseId,
        request_id: &RequestId,
    ) -> AppResult<PhaseChange> {
        let _guard = self.ctx.locks.acquire(project_id).await;
        let mut request = self.load_request(project_id, phase_id, request_id).await?;
        if request.status != ExtensionStatus::Pending {
            return Err(AppError::BusinessRule(format!(
                "extension request {request_id} is not pending"
            )));
        }

        let mut phase = self.load_phase(project_id, phase_id).await?;
        let previous_end_date = phase.end_date.ok_or_else(|| {
            AppError::BusinessRule(format!("phase {} has no end date to extend", phase.id))
        })?;

        phase.end_date = Some(request.requested_end_date);
        request.status = ExtensionStatus::Approved;

        let change = PhaseChange {
            id: ChangeId::new(),
            request_id: request_id.clone(),
            phase_id: phase.id.clone(),
            previous_end_date,
            new_end_date: request.requested_end_date,
            recorded_at: Utc::now(),
        };

        persist_phase(&self.ctx, project_id, &phase).await?;
        self.persist_request(project_id, &request).await?;
        let change_path = paths::change(&self.ctx.customer_id, project_id, phase_id, &change.id);
        self.ctx
            .store
            .merge(&change_path, codec::encode_change(&change))
            .await
            .map_err(AppError::from)?;

        self.ctx.events.publish(DomainEvent::ExtensionAccepted {
            project_id: project_id.clone(),
            phase_id: phase.id.clone(),
            new_end_date: change.new_end_date,
        });
        info!(
            project = %project_id,
            phase = %phase.id,
            days = change.extended_days(),
            "extension accepted"
        );
        Ok(change)
    }

    /// Rejects a pending extension; no schedule effect.
    pub async fn reject_extension(
        &self,
        project_id: &ProjectId,
        phase_id: &PhaseId,
        request_id: &RequestId,
    ) -> AppResult<ExtensionRequest> {
        let _guard = self.ctx.locks.acquire(project_id).await;
        let mut request = self.load_request(project_id, phase_id, request_id).await?;
        if request.status != ExtensionStatus::Pending {
            return Err(AppError::BusinessRule(format!(
                "extension request {request_id} is not pending"
            )));
        }
        request.status = ExtensionStatus::Rejected;
        self.persist_request(project_id, &request).await?;
        Ok(request)
    }

    async fn load_phase(&self, project_id: &ProjectId, phase_id: &PhaseId) -> AppResult<Phase> {
        let path = paths::phase(&self.ctx.customer_id, project_id, phase_id);
        let doc = self
            .ctx
            .store
            .get(&path)
            .await
            .map_err(AppError::from)?
            .ok_or_else(|| AppError::NotFound(path.clone()))?;
        Ok(codec::decode_phase(&doc.id, project_id, &doc.fields, &path)?)
    }

    async fn load_request(
        &self,
        project_id: &ProjectId,
        phase_id: &PhaseId,
        request_id: &RequestId,
    ) -> AppResult<ExtensionRequest> {
        let path = paths::request(&self.ctx.customer_id, project_id, phase_id, request_id);
        let doc = self
            .ctx
            .store
            .get(&path)
            .await
            .map_err(AppError::from)?
            .ok_or_else(|| AppError::NotFound(path.clone()))?;
        Ok(codec::decode_request(&doc.id, &doc.fields, &path)?)
    }

    async fn persist_request(
        &self,
        project_id: &ProjectId,
        request: &ExtensionRequest,
    ) -> AppResult<()> {
        let path = paths::request(
            &self.ctx.customer_id,
            project_id,
            &request.phase_id,
            &request.id,
        );
        self.ctx
            .store
            .merge(&path, codec::encode_request(request))
            .await
            .map_err(AppError::from)
    }
}
